mod elimination;
mod enroll;
mod game;
mod leaderboard;
mod ring;
mod task;

pub use elimination::{Kill, Removal};
pub use game::StopReport;

use crate::dossier::DossierStore;
use crate::types::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared engine state
///
/// The maps are the persistence collaborator of this process (storage
/// technology is the transport integrator's concern); `game_locks` provides
/// the per-game transactional scope every read-modify-write command runs in.
/// Lock order, where several are held: games, then assassins, then tasks.
pub struct AppState {
    pub config: GameConfig,
    pub games: RwLock<HashMap<GameId, Game>>,
    pub assassins: RwLock<HashMap<UserId, Assassin>>,
    pub tasks: RwLock<HashMap<TaskId, Task>>,
    /// One exclusive token per game; commands of different games never contend
    game_locks: Mutex<HashMap<GameId, Arc<Mutex<()>>>>,
    enroll_seq: AtomicU64,
    dossiers: Option<Arc<dyn DossierStore>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self {
            config,
            games: RwLock::new(HashMap::new()),
            assassins: RwLock::new(HashMap::new()),
            tasks: RwLock::new(HashMap::new()),
            game_locks: Mutex::new(HashMap::new()),
            enroll_seq: AtomicU64::new(0),
            dossiers: None,
        }
    }

    /// Wire up an external photo store for dossier composition
    pub fn with_dossiers(config: GameConfig, store: Arc<dyn DossierStore>) -> Self {
        Self {
            dossiers: Some(store),
            ..Self::with_config(config)
        }
    }

    pub(crate) fn dossier_store(&self) -> Option<Arc<dyn DossierStore>> {
        self.dossiers.clone()
    }

    /// The per-game exclusive token. Hold its guard for the whole
    /// read-modify-write of any ring-touching command.
    pub(crate) async fn game_guard(&self, game_id: &GameId) -> Arc<Mutex<()>> {
        let mut locks = self.game_locks.lock().await;
        locks
            .entry(game_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub(crate) async fn drop_game_guard(&self, game_id: &GameId) {
        self.game_locks.lock().await.remove(game_id);
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.enroll_seq.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn get_game(&self, game_id: &GameId) -> Option<Game> {
        self.games.read().await.get(game_id).cloned()
    }

    pub async fn get_assassin(&self, id: UserId) -> Option<Assassin> {
        self.assassins.read().await.get(&id).cloned()
    }

    /// The non-stopped game registered by this master, if any
    pub async fn active_game_of_master(&self, master_id: UserId) -> Option<Game> {
        self.games
            .read()
            .await
            .values()
            .find(|g| g.master_id == master_id && g.state != GameState::Stopped)
            .cloned()
    }

    /// The non-stopped game this player is enrolled in, if any
    pub async fn active_game_of_member(&self, assassin_id: UserId) -> Option<Game> {
        let game_id = self
            .assassins
            .read()
            .await
            .get(&assassin_id)
            .map(|a| a.game_id.clone())?;
        let game = self.games.read().await.get(&game_id).cloned()?;
        (game.state != GameState::Stopped).then_some(game)
    }

    /// All enrolled assassins of a game, in enrollment order
    pub async fn members(&self, game_id: &GameId) -> Vec<Assassin> {
        let mut members: Vec<Assassin> = self
            .assassins
            .read()
            .await
            .values()
            .filter(|a| a.game_id == *game_id)
            .cloned()
            .collect();
        members.sort_by_key(|a| a.seq);
        members
    }

    /// Members still in the target ring, in enrollment order
    pub async fn living_members(&self, game_id: &GameId) -> Vec<Assassin> {
        let mut members = self.members(game_id).await;
        members.retain(|a| a.is_alive());
        members
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
