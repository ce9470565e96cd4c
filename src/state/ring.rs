//! The target ring
//!
//! Within one started, unfinished game the `target` edges of all living
//! assassins form exactly one cycle covering all of them. Every mutation in
//! this module preserves that by construction: the ring is only ever created
//! whole (`assign_initial`) or shrunk by reconnecting a removed node's two
//! neighbors (`splice`). The terminal state is a ring of one, an assassin
//! targeting themself; that node must never be spliced.

use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;
use std::collections::HashMap;

/// Arrange all members into one cycle, each targeting the next, wrapping
/// around. `order` fixes the arrangement (enrollment order by convention).
pub(super) fn assign_initial(
    assassins: &mut HashMap<UserId, Assassin>,
    order: &[UserId],
) -> GameResult<()> {
    if order.len() < 2 {
        return Err(GameError::InvalidRingState(
            "a target ring needs at least two members".to_string(),
        ));
    }
    for (i, id) in order.iter().enumerate() {
        let next = order[(i + 1) % order.len()];
        match assassins.get_mut(id) {
            Some(assassin) => assassin.target = Some(next),
            None => {
                return Err(GameError::InvalidRingState(format!(
                    "assassin {id} vanished during ring construction"
                )))
            }
        }
    }
    Ok(())
}

/// Take `victim` out of the ring: their hunter inherits their target, the
/// victim's record goes inert (no target, eliminated, claim flag cleared).
///
/// Returns the hunter's id. Refuses a ring of one: that is the terminal
/// state, not an elimination, and callers check `is_last_man_standing` first.
pub(super) fn splice(
    assassins: &mut HashMap<UserId, Assassin>,
    victim_id: UserId,
) -> GameResult<UserId> {
    let victim = assassins
        .get(&victim_id)
        .ok_or_else(|| not_in_ring(victim_id))?;
    let victim_target = victim.target.ok_or_else(|| not_in_ring(victim_id))?;

    if victim_target == victim_id {
        let err = GameError::InvalidRingState(format!(
            "assassin {victim_id} is the last one standing and cannot be spliced"
        ));
        tracing::error!(victim = victim_id, "{err}");
        return Err(err);
    }

    let hunter_id = assassins
        .values()
        .find(|a| a.target == Some(victim_id))
        .map(|a| a.id)
        .ok_or_else(|| {
            let err =
                GameError::InvalidRingState(format!("no hunter is targeting assassin {victim_id}"));
            tracing::error!(victim = victim_id, "{err}");
            err
        })?;

    if let Some(hunter) = assassins.get_mut(&hunter_id) {
        hunter.target = Some(victim_target);
    }
    if let Some(victim) = assassins.get_mut(&victim_id) {
        victim.target = None;
        victim.presumed_dead = false;
        victim.eliminated = true;
    }
    Ok(hunter_id)
}

fn not_in_ring(id: UserId) -> GameError {
    let err = GameError::InvalidRingState(format!("assassin {id} is not in the ring"));
    tracing::error!(assassin = id, "{err}");
    err
}

impl AppState {
    /// True iff this assassin targets themself (the terminal ring state)
    pub async fn is_last_man_standing(&self, assassin_id: UserId) -> GameResult<bool> {
        // Lock order is games before assassins, so resolve the game first
        let game_id = self
            .get_assassin(assassin_id)
            .await
            .map(|a| a.game_id)
            .ok_or_else(|| not_in_ring(assassin_id))?;
        self.require_started(&game_id).await?;

        let assassins = self.assassins.read().await;
        let assassin = assassins
            .get(&assassin_id)
            .ok_or_else(|| not_in_ring(assassin_id))?;
        match assassin.target {
            Some(target) => Ok(target == assassin_id),
            None => Err(not_in_ring(assassin_id)),
        }
    }

    /// The unique living assassin whose target this is
    pub async fn hunter_of(&self, assassin_id: UserId) -> GameResult<Assassin> {
        let game_id = self
            .get_assassin(assassin_id)
            .await
            .map(|a| a.game_id)
            .ok_or_else(|| not_in_ring(assassin_id))?;
        self.require_started(&game_id).await?;

        let assassins = self.assassins.read().await;
        assassins
            .values()
            .find(|a| a.target == Some(assassin_id))
            .cloned()
            .ok_or_else(|| {
                let err = GameError::InvalidRingState(format!(
                    "no hunter is targeting assassin {assassin_id}"
                ));
                tracing::error!(assassin = assassin_id, "{err}");
                err
            })
    }

    async fn require_started(&self, game_id: &GameId) -> GameResult<()> {
        match self.games.read().await.get(game_id).map(|g| g.state) {
            Some(GameState::Started) => Ok(()),
            _ => Err(GameError::InvalidRingState(format!(
                "game {game_id} is not running"
            ))),
        }
    }
}
