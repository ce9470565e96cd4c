//! Elimination flows: voluntary dropout, master burns, forced burns and the
//! two-phase kill protocol (claim, then the victim's own confirmation).
//!
//! Every ring mutation here runs under the owning game's exclusive token and
//! a single `assassins` write guard, so a splice and its tally credit land
//! atomically or not at all.

use super::{ring, AppState};
use crate::error::{GameError, GameResult};
use crate::types::*;

/// How a player left the game
#[derive(Debug, Clone)]
pub enum Removal {
    /// The game had not started; the record was simply deleted
    PreStart,
    /// Spliced out of the ring. `game_over` is set when the splice left the
    /// hunter targeting themself.
    Spliced { hunter: Assassin, game_over: bool },
    /// The player already was the last one standing; nothing to splice.
    /// The caller should stop the game instead.
    LastManStanding,
}

/// A confirmed assassination
#[derive(Debug, Clone)]
pub struct Kill {
    pub hunter: Assassin,
    pub victim: Assassin,
    /// The victim was the last other living member; the caller stops the game
    pub game_over: bool,
}

impl AppState {
    /// A player leaves voluntarily. Never credits a tally.
    pub async fn dropout(&self, assassin_id: UserId) -> GameResult<Removal> {
        let game = self
            .active_game_of_member(assassin_id)
            .await
            .ok_or(GameError::NotEnrolled)?;

        match game.state {
            GameState::Open => {
                self.assassins.write().await.remove(&assassin_id);
                tracing::info!(game = %game.id, assassin = assassin_id, "pre-start dropout");
                Ok(Removal::PreStart)
            }
            GameState::Started => {
                tracing::info!(game = %game.id, assassin = assassin_id, "dropout");
                self.remove_from_ring(&game.id, assassin_id).await
            }
            // active_game_of_member never yields a stopped game
            GameState::Stopped => Err(GameError::NotEnrolled),
        }
    }

    /// Master-ordered elimination. Same mechanics as `dropout` (no tally
    /// credit), but authorized against the master's own game and callable
    /// against any state of the target, claimed-dead or not.
    pub async fn burn(&self, master_id: UserId, target_id: UserId) -> GameResult<Removal> {
        let game = self
            .active_game_of_master(master_id)
            .await
            .ok_or(GameError::NotFound)?;
        let target = self
            .get_assassin(target_id)
            .await
            .ok_or(GameError::NotAuthorized)?;
        if target.game_id != game.id {
            tracing::warn!(
                master = master_id,
                target = target_id,
                "burn against a player of another game"
            );
            return Err(GameError::NotAuthorized);
        }

        tracing::info!(game = %game.id, master = master_id, target = target_id, "burn");
        match game.state {
            GameState::Open => {
                self.assassins.write().await.remove(&target_id);
                Ok(Removal::PreStart)
            }
            GameState::Started => self.remove_from_ring(&game.id, target_id).await,
            GameState::Stopped => Err(GameError::NotFound),
        }
    }

    /// System-triggered burn after the joker limit, no master involved
    pub async fn forced_burn(&self, game_id: &GameId, target_id: UserId) -> GameResult<Removal> {
        tracing::info!(game = %game_id, target = target_id, "forced burn");
        self.remove_from_ring(game_id, target_id).await
    }

    /// A hunter claims to have killed their target; the target is marked
    /// presumed dead until they confirm. Re-claiming an already claimed kill
    /// is rejected, the original claim stands.
    pub async fn claim_kill(&self, hunter_id: UserId) -> GameResult<Assassin> {
        let game = self
            .active_game_of_member(hunter_id)
            .await
            .ok_or(GameError::NotEnrolled)?;
        if game.state != GameState::Started {
            return Err(GameError::NotStarted);
        }

        let guard = self.game_guard(&game.id).await;
        let _tx = guard.lock().await;

        let mut assassins = self.assassins.write().await;
        let hunter = assassins.get(&hunter_id).ok_or(GameError::NotEnrolled)?;
        let target_id = hunter.target.ok_or(GameError::NotEnrolled)?;
        let target = assassins.get_mut(&target_id).ok_or_else(|| {
            let err = GameError::InvalidRingState(format!(
                "assassin {hunter_id} targets {target_id}, which does not exist"
            ));
            tracing::error!(game = %game.id, hunter = hunter_id, "{err}");
            err
        })?;

        if target.presumed_dead {
            tracing::warn!(game = %game.id, hunter = hunter_id, "kill claimed twice");
            return Err(GameError::DuplicateClaim);
        }
        target.presumed_dead = true;
        tracing::info!(game = %game.id, hunter = hunter_id, victim = target_id, "kill claimed");
        Ok(target.clone())
    }

    /// The victim confirms their own death. Splices them out and credits the
    /// hunter's tally (when `award_tally`) as one atomic step.
    pub async fn confirm_dead(&self, victim_id: UserId, award_tally: bool) -> GameResult<Kill> {
        let game = self
            .active_game_of_member(victim_id)
            .await
            .ok_or(GameError::NotEnrolled)?;
        if game.state != GameState::Started {
            return Err(GameError::NotStarted);
        }

        let guard = self.game_guard(&game.id).await;
        let _tx = guard.lock().await;

        let mut assassins = self.assassins.write().await;
        let victim = assassins.get(&victim_id).ok_or(GameError::NotEnrolled)?;
        if !victim.presumed_dead {
            return Err(GameError::NoPendingClaim);
        }

        let hunter_id = ring::splice(&mut assassins, victim_id)?;
        if award_tally {
            if let Some(hunter) = assassins.get_mut(&hunter_id) {
                hunter.tally += 1;
            }
        }

        let hunter = assassins.get(&hunter_id).cloned().ok_or_else(|| {
            GameError::InvalidRingState(format!("hunter {hunter_id} vanished mid-splice"))
        })?;
        let victim = assassins.get(&victim_id).cloned().ok_or_else(|| {
            GameError::InvalidRingState(format!("victim {victim_id} vanished mid-splice"))
        })?;
        let game_over = hunter.target == Some(hunter.id);

        tracing::info!(
            game = %game.id,
            hunter = hunter_id,
            victim = victim_id,
            tally = hunter.tally,
            game_over,
            "kill confirmed"
        );
        Ok(Kill {
            hunter,
            victim,
            game_over,
        })
    }

    /// Splice a living player out of a started game's ring, no tally credit
    async fn remove_from_ring(&self, game_id: &GameId, victim_id: UserId) -> GameResult<Removal> {
        let guard = self.game_guard(game_id).await;
        let _tx = guard.lock().await;

        let mut assassins = self.assassins.write().await;
        let victim = assassins.get(&victim_id).ok_or(GameError::NotEnrolled)?;
        if victim.target == Some(victim_id) {
            return Ok(Removal::LastManStanding);
        }

        let hunter_id = ring::splice(&mut assassins, victim_id)?;
        let hunter = assassins.get(&hunter_id).cloned().ok_or_else(|| {
            GameError::InvalidRingState(format!("hunter {hunter_id} vanished mid-splice"))
        })?;
        let game_over = hunter.target == Some(hunter.id);
        Ok(Removal::Spliced { hunter, game_over })
    }
}
