use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;
use regex::Regex;

impl AppState {
    /// Post a new task for a game and open a fresh answer round
    ///
    /// The solution pattern must be a valid regular expression; it is matched
    /// with search semantics against submitted answers.
    pub async fn post_task(
        &self,
        game_id: &GameId,
        message: &str,
        solution_pattern: &str,
    ) -> GameResult<Task> {
        Regex::new(solution_pattern)
            .map_err(|e| GameError::InvalidSolutionPattern(e.to_string()))?;

        let guard = self.game_guard(game_id).await;
        let _tx = guard.lock().await;

        let mut assassins = self.assassins.write().await;
        let mut tasks = self.tasks.write().await;
        if tasks.values().any(|t| t.game_id == *game_id && t.active) {
            return Err(GameError::TaskAlreadyActive);
        }

        let task = Task {
            id: ulid::Ulid::new().to_string(),
            game_id: game_id.clone(),
            message: message.to_string(),
            solution_pattern: solution_pattern.to_string(),
            active: true,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        tasks.insert(task.id.clone(), task.clone());

        for assassin in assassins.values_mut() {
            if assassin.game_id == *game_id && assassin.is_alive() {
                assassin.task_answered = false;
            }
        }

        tracing::info!(game = %game_id, task = %task.id, "task posted");
        Ok(task)
    }

    /// Submit an answer to the active task of the player's game
    ///
    /// A correct answer marks the round answered exactly once; re-submitting
    /// afterwards is a no-op. An incorrect answer changes nothing and the
    /// player may retry.
    pub async fn answer_task(&self, assassin_id: UserId, submitted: &str) -> GameResult<()> {
        let game = self
            .active_game_of_member(assassin_id)
            .await
            .ok_or(GameError::NotEnrolled)?;

        let pattern = {
            let tasks = self.tasks.read().await;
            tasks
                .values()
                .find(|t| t.game_id == game.id && t.active)
                .map(|t| t.solution_pattern.clone())
                .ok_or(GameError::NoActiveTask)?
        };
        // Validated at post time; a failure here means the stored task is corrupt
        let regex =
            Regex::new(&pattern).map_err(|e| GameError::InvalidSolutionPattern(e.to_string()))?;

        let mut assassins = self.assassins.write().await;
        let assassin = assassins
            .get_mut(&assassin_id)
            .ok_or(GameError::NotEnrolled)?;
        if assassin.task_answered {
            return Ok(());
        }
        if regex.is_match(submitted) {
            assassin.task_answered = true;
            tracing::info!(game = %game.id, assassin = assassin_id, "task answered");
            Ok(())
        } else {
            tracing::info!(game = %game.id, assassin = assassin_id, "incorrect task answer");
            Err(GameError::IncorrectAnswer)
        }
    }

    /// Close the active task round
    ///
    /// Every living assassin who did not answer accrues a joker; the ids of
    /// those who just hit the joker limit are returned for the caller to run
    /// through forced burns. Answer flags are reset for the next round.
    pub async fn close_task(&self, game_id: &GameId) -> GameResult<Vec<UserId>> {
        let guard = self.game_guard(game_id).await;
        let _tx = guard.lock().await;

        let mut assassins = self.assassins.write().await;
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .values_mut()
            .find(|t| t.game_id == *game_id && t.active)
            .ok_or(GameError::NoActiveTask)?;
        task.active = false;

        let mut to_burn: Vec<(u64, UserId)> = Vec::new();
        for assassin in assassins.values_mut() {
            if assassin.game_id != *game_id {
                continue;
            }
            if assassin.is_alive() && !assassin.task_answered {
                assassin.jokers_used += 1;
                if assassin.jokers_used == self.config.joker_limit {
                    to_burn.push((assassin.seq, assassin.id));
                }
            }
            assassin.task_answered = false;
        }
        to_burn.sort_unstable();
        let to_burn: Vec<UserId> = to_burn.into_iter().map(|(_, id)| id).collect();

        tracing::info!(game = %game_id, burned = to_burn.len(), "task closed");
        Ok(to_burn)
    }
}
