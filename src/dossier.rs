//! Target dossiers
//!
//! The profile packet a hunter receives about their current target. Photo
//! storage lives outside the engine; `DossierStore` is the seam the transport
//! plugs its image backend into, keyed by `(game_id, assassin_id)`.

use crate::types::{GameId, UserId};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Window-dressing skills sampled into each dossier
const SKILLS: &[&str] = &[
    "lockpicking",
    "hand-to-hand combat",
    "target acquisition",
    "covert operations",
    "intelligence gathering",
    "marksmanship",
    "knife-throwing",
    "explosives",
    "poison",
    "seduction",
    "disguises",
    "exotic weaponry",
    "vehicles",
    "boobytraps",
];

/// Profile fields the engine exposes about an assassin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssassinProfile {
    pub name: String,
    pub code_name: String,
    pub address: String,
    pub major: String,
}

/// Everything the transport needs to render a target packet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dossier {
    pub target_id: UserId,
    pub profile: AssassinProfile,
    /// Two randomly sampled skills, purely for flavor
    pub skills: Vec<String>,
    /// Opaque reference into the external image store, if one is wired up
    pub photo_ref: Option<String>,
}

/// External photo storage collaborator
#[async_trait]
pub trait DossierStore: Send + Sync {
    /// Look up the stored photo reference for an assassin, if any
    async fn photo_ref(&self, game_id: &GameId, assassin_id: UserId) -> Option<String>;
}

/// Store used when no image backend is configured; every lookup misses.
pub struct NoPhotos;

#[async_trait]
impl DossierStore for NoPhotos {
    async fn photo_ref(&self, _game_id: &GameId, _assassin_id: UserId) -> Option<String> {
        None
    }
}

pub(crate) fn compose(
    target_id: UserId,
    profile: AssassinProfile,
    photo_ref: Option<String>,
) -> Dossier {
    let mut rng = rand::rng();
    let skills = SKILLS
        .choose_multiple(&mut rng, 2)
        .map(|s| s.to_string())
        .collect();
    Dossier {
        target_id,
        profile,
        skills,
        photo_ref,
    }
}
