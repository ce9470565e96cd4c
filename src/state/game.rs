use super::AppState;
use crate::error::{GameError, GameResult};
use crate::state::{leaderboard, ring};
use crate::types::*;
use rand::Rng;

/// Safe character set for game codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Generate a random game code
fn generate_game_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// What `stop_game` leaves behind: the final standings and who to tell
#[derive(Debug, Clone, Default)]
pub struct StopReport {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub members: Vec<UserId>,
}

impl AppState {
    /// Register a new game for a master
    ///
    /// Fails while the master still owns an Open or Started game. Generated
    /// codes are unique among all retained games, so a code is never reused
    /// within a process lifetime.
    pub async fn register_game(&self, master_id: UserId, master_handle: &str) -> GameResult<Game> {
        let mut games = self.games.write().await;

        if games
            .values()
            .any(|g| g.master_id == master_id && g.state != GameState::Stopped)
        {
            return Err(GameError::DuplicateGame);
        }

        let id = loop {
            let code = generate_game_code(self.config.code_length);
            if !games.contains_key(&code) {
                break code;
            }
            // Collision - try again (rare with a 31-character alphabet)
        };

        let game = Game {
            id: id.clone(),
            master_id,
            master_handle: master_handle.to_string(),
            state: GameState::Open,
        };
        games.insert(id, game.clone());

        tracing::info!(game = %game.id, master = master_id, "game registered");
        Ok(game)
    }

    /// Start a game: close enrollment and build the initial target ring
    ///
    /// Returns the living assassins in ring order so the caller can send each
    /// their first dossier.
    pub async fn start_game(&self, game_id: &GameId) -> GameResult<Vec<Assassin>> {
        let guard = self.game_guard(game_id).await;
        let _tx = guard.lock().await;

        let mut games = self.games.write().await;
        let game = games.get_mut(game_id).ok_or(GameError::NotFound)?;
        match game.state {
            GameState::Open => {}
            GameState::Started => return Err(GameError::AlreadyStarted),
            GameState::Stopped => return Err(GameError::NotFound),
        }

        let mut assassins = self.assassins.write().await;
        let mut order: Vec<(u64, UserId)> = assassins
            .values()
            .filter(|a| a.game_id == *game_id)
            .map(|a| (a.seq, a.id))
            .collect();
        order.sort_unstable();
        let order: Vec<UserId> = order.into_iter().map(|(_, id)| id).collect();

        if order.len() < self.config.min_players {
            return Err(GameError::InsufficientPlayers(self.config.min_players));
        }

        ring::assign_initial(&mut assassins, &order)?;
        game.state = GameState::Started;

        tracing::info!(game = %game_id, players = order.len(), "game started");
        Ok(order
            .iter()
            .filter_map(|id| assassins.get(id).cloned())
            .collect())
    }

    /// Stop a game: snapshot the final leaderboard, then cascade-remove its
    /// assassins and tasks. No-op (with an empty report) if already stopped.
    pub async fn stop_game(&self, game_id: &GameId) -> GameResult<StopReport> {
        let guard = self.game_guard(game_id).await;
        let _tx = guard.lock().await;

        let mut games = self.games.write().await;
        let game = games.get_mut(game_id).ok_or(GameError::NotFound)?;
        if game.state == GameState::Stopped {
            return Ok(StopReport::default());
        }
        game.state = GameState::Stopped;
        drop(games);

        let mut assassins = self.assassins.write().await;
        let mut remaining: Vec<Assassin> = assassins
            .values()
            .filter(|a| a.game_id == *game_id)
            .cloned()
            .collect();
        remaining.sort_by_key(|a| a.seq);
        let members: Vec<UserId> = remaining.iter().map(|a| a.id).collect();
        let standings = leaderboard::rank_members(remaining);

        assassins.retain(|_, a| a.game_id != *game_id);
        drop(assassins);

        self.tasks.write().await.retain(|_, t| t.game_id != *game_id);
        self.drop_game_guard(game_id).await;

        tracing::info!(game = %game_id, players = members.len(), "game stopped");
        Ok(StopReport {
            leaderboard: standings,
            members,
        })
    }
}
