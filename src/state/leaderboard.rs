use super::AppState;
use crate::error::{GameError, GameResult};
use crate::types::*;

/// Rank a game's members: stable-sort by tally descending, then stably
/// partition the living in front of the eliminated.
///
/// The two passes are deliberate. A dead player with a big tally keeps their
/// tally-rank relative to other dead players, instead of being re-sorted into
/// a composite "alive first, then tally" order.
pub(super) fn rank_members(mut members: Vec<Assassin>) -> Vec<LeaderboardEntry> {
    members.sort_by_key(|a| a.seq);
    members.sort_by_key(|a| std::cmp::Reverse(a.tally));

    let (alive, dead): (Vec<Assassin>, Vec<Assassin>) =
        members.into_iter().partition(|a| a.is_alive());

    alive
        .into_iter()
        .chain(dead)
        .map(|a| LeaderboardEntry {
            alive: a.is_alive(),
            code_name: a.code_name,
            tally: a.tally,
        })
        .collect()
}

impl AppState {
    /// The current standings of a game
    pub async fn rank(&self, game_id: &GameId) -> GameResult<Vec<LeaderboardEntry>> {
        if self.get_game(game_id).await.is_none() {
            return Err(GameError::NotFound);
        }
        Ok(rank_members(self.members(game_id).await))
    }
}
