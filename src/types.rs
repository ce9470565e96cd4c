use serde::{Deserialize, Serialize};

/// Game codes are short, human-relayable strings ("give this code to your players").
pub type GameId = String;
/// Players and masters are identified by the chat id the transport hands us.
pub type UserId = i64;
pub type TaskId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    Open,
    Started,
    Stopped,
}

/// Engine knobs. Loaded once at startup; per-game overrides are a non-goal.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Minimum enrolled assassins required to start a game
    pub min_players: usize,
    /// Jokers accrued before a player is force-burned
    pub joker_limit: u8,
    /// Length of generated game codes
    pub code_length: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            joker_limit: 3,
            code_length: 5,
        }
    }
}

impl GameConfig {
    /// Load config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_players: env_parse("ASSASSINS_MIN_PLAYERS", defaults.min_players),
            joker_limit: env_parse("ASSASSINS_JOKER_LIMIT", defaults.joker_limit),
            code_length: env_parse("ASSASSINS_CODE_LENGTH", defaults.code_length),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// One run of the elimination contest, owned by a master.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub master_id: UserId,
    /// Chat handle of the master, so players can be pointed at a human
    pub master_handle: String,
    pub state: GameState,
}

/// An enrolled player. Alive iff `target` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assassin {
    pub id: UserId,
    pub game_id: GameId,
    /// Process-wide enrollment sequence; fixes ring order and ranking tie-breaks
    pub seq: u64,
    pub name: String,
    pub code_name: String,
    pub address: String,
    pub major: String,
    pub needs_weapon: bool,
    /// The player this assassin is hunting. None before the game starts and
    /// after elimination.
    pub target: Option<UserId>,
    /// Set between a hunter's kill claim and the victim's confirmation
    pub presumed_dead: bool,
    /// Spliced out of a started game's ring (record retained for the leaderboard)
    pub eliminated: bool,
    pub tally: u32,
    pub jokers_used: u8,
    pub task_answered: bool,
    /// Whether this player wants kill announcements for their game
    pub subscribed: bool,
}

impl Assassin {
    pub fn is_alive(&self) -> bool {
        self.target.is_some()
    }
}

/// Sign-up data produced by the (external) enrollment conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: UserId,
    pub name: String,
    pub code_name: String,
    pub address: String,
    pub major: String,
    pub needs_weapon: bool,
}

/// A challenge the master poses to all living assassins. At most one active
/// per game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub game_id: GameId,
    pub message: String,
    /// Regular expression matched against submitted answers (search, not full match)
    pub solution_pattern: String,
    pub active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub code_name: String,
    pub tally: u32,
    pub alive: bool,
}

/// Per-player line of the master's `players` overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerOverview {
    pub id: UserId,
    pub code_name: String,
    pub alive: bool,
    pub tally: u32,
    pub jokers_used: u8,
}
