use super::AppState;
use crate::dossier::{self, AssassinProfile, Dossier};
use crate::error::{GameError, GameResult};
use crate::types::*;

impl AppState {
    /// Enroll a player into an open game
    ///
    /// Rejected while the game is not Open, and for ids that are already
    /// enrolled somewhere active (a player is in at most one running game).
    pub async fn enroll(&self, game_id: &GameId, signup: Enrollment) -> GameResult<Assassin> {
        match self.games.read().await.get(game_id).map(|g| g.state) {
            Some(GameState::Open) => {}
            _ => return Err(GameError::GameNotJoinable),
        }

        let mut assassins = self.assassins.write().await;
        if assassins.contains_key(&signup.id) {
            return Err(GameError::AlreadyEnrolled);
        }

        let assassin = Assassin {
            id: signup.id,
            game_id: game_id.clone(),
            seq: self.next_seq(),
            name: signup.name,
            code_name: signup.code_name,
            address: signup.address,
            major: signup.major,
            needs_weapon: signup.needs_weapon,
            target: None,
            presumed_dead: false,
            eliminated: false,
            tally: 0,
            jokers_used: 0,
            task_answered: false,
            subscribed: false,
        };
        assassins.insert(assassin.id, assassin.clone());

        tracing::info!(game = %game_id, assassin = assassin.id, "player enrolled");
        Ok(assassin)
    }

    /// The profile packet for dossier composition
    pub async fn profile(&self, assassin_id: UserId) -> GameResult<AssassinProfile> {
        let assassins = self.assassins.read().await;
        let assassin = assassins.get(&assassin_id).ok_or(GameError::NotEnrolled)?;
        Ok(AssassinProfile {
            name: assassin.name.clone(),
            code_name: assassin.code_name.clone(),
            address: assassin.address.clone(),
            major: assassin.major.clone(),
        })
    }

    /// Flip the kill-announcement subscription; returns the new value
    pub async fn toggle_subscription(&self, assassin_id: UserId) -> GameResult<bool> {
        let mut assassins = self.assassins.write().await;
        let assassin = assassins
            .get_mut(&assassin_id)
            .ok_or(GameError::NotEnrolled)?;
        assassin.subscribed = !assassin.subscribed;
        tracing::info!(
            assassin = assassin_id,
            subscribed = assassin.subscribed,
            "subscription toggled"
        );
        Ok(assassin.subscribed)
    }

    /// The dossier a hunter receives about their current target
    pub async fn dossier_for(&self, hunter_id: UserId) -> GameResult<Dossier> {
        let game = self
            .active_game_of_member(hunter_id)
            .await
            .ok_or(GameError::NotEnrolled)?;
        if game.state != GameState::Started {
            return Err(GameError::NotStarted);
        }

        let target_id = {
            let assassins = self.assassins.read().await;
            let hunter = assassins.get(&hunter_id).ok_or(GameError::NotEnrolled)?;
            hunter.target.ok_or(GameError::NotEnrolled)?
        };
        let profile = self.profile(target_id).await.map_err(|_| {
            let err = GameError::InvalidRingState(format!(
                "assassin {hunter_id} targets {target_id}, which has no record"
            ));
            tracing::error!(hunter = hunter_id, target = target_id, "{err}");
            err
        })?;

        let photo_ref = match self.dossier_store() {
            Some(store) => store.photo_ref(&game.id, target_id).await,
            None => None,
        };
        Ok(dossier::compose(target_id, profile, photo_ref))
    }

    /// Everyone in this game who asked to hear about assassinations
    pub async fn subscribers(&self, game_id: &GameId) -> Vec<UserId> {
        let mut subscribers: Vec<(u64, UserId)> = self
            .assassins
            .read()
            .await
            .values()
            .filter(|a| a.game_id == *game_id && a.subscribed)
            .map(|a| (a.seq, a.id))
            .collect();
        subscribers.sort_unstable();
        subscribers.into_iter().map(|(_, id)| id).collect()
    }
}
