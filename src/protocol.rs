//! Wire types between the chat transport and the engine
//!
//! The transport resolves an inbound chat update to a `Command`, dispatches
//! it, and gets back one `Reply` for the issuing chat plus zero or more
//! `Notification`s to deliver to other chats. Delivery failures are the
//! transport's problem; by the time notifications exist the state change has
//! already committed.

use crate::dossier::Dossier;
use crate::error::GameError;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Command {
    RegisterGame {
        master_id: UserId,
        master_handle: String,
    },
    StartGame {
        master_id: UserId,
    },
    StopGame {
        master_id: UserId,
    },
    Enroll {
        game_id: GameId,
        #[serde(flatten)]
        signup: Enrollment,
    },
    Dropout {
        assassin_id: UserId,
    },
    Burn {
        master_id: UserId,
        target_id: UserId,
    },
    ClaimKill {
        hunter_id: UserId,
    },
    ConfirmDead {
        victim_id: UserId,
    },
    PostTask {
        master_id: UserId,
        message: String,
        solution_pattern: String,
    },
    CloseTask {
        master_id: UserId,
    },
    AnswerTask {
        assassin_id: UserId,
        text: String,
    },
    Leaderboard {
        chat_id: UserId,
    },
    Players {
        master_id: UserId,
    },
    Subscribe {
        assassin_id: UserId,
    },
    Dossier {
        assassin_id: UserId,
    },
    Broadcast {
        master_id: UserId,
        text: String,
        only_alive: bool,
    },
}

/// Direct answer to the chat that issued the command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Reply {
    GameRegistered { game: Game },
    GameStarted { game_id: GameId, players: usize },
    GameStopped { leaderboard: Vec<LeaderboardEntry> },
    Enrolled { game_id: GameId, master_handle: String },
    DroppedOut,
    Burned { target_id: UserId },
    ClaimFiled { target_id: UserId },
    DeathConfirmed,
    TaskPosted { task_id: TaskId },
    TaskClosed { burned: Vec<UserId> },
    AnswerAccepted,
    Leaderboard { entries: Vec<LeaderboardEntry> },
    Players { entries: Vec<PlayerOverview> },
    Subscribed { subscribed: bool },
    Dossier { dossier: Dossier },
    BroadcastSent { recipients: usize },
    Error { code: String, msg: String },
}

impl From<&GameError> for Reply {
    fn from(err: &GameError) -> Self {
        Reply::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}

/// Why a hunter is being handed a (new) target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NewTargetReason {
    GameStart,
    KillConfirmed,
    TargetDroppedOut,
    TargetBurned,
}

/// Outbound message for some other chat, queued behind the reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: UserId,
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum NotificationKind {
    /// Hunt this one next
    NewTarget {
        reason: NewTargetReason,
        dossier: Dossier,
    },
    /// Your hunter claims to have killed you; confirm or talk to the master
    ClaimFiled { master_handle: String },
    /// Subscriber feed: somebody got wiped out
    KillAnnouncement {
        killer_code_name: String,
        victim_code_name: String,
        tally: u32,
    },
    /// A new task is up
    TaskPosted { message: String },
    /// The ring closed on a winner
    GameOver {
        winner_code_name: String,
        tally: u32,
        leaderboard: Vec<LeaderboardEntry>,
    },
    /// The master called it off
    GameStopped { leaderboard: Vec<LeaderboardEntry> },
    /// Free-text message from the master
    Broadcast { master_handle: String, text: String },
}

/// What one dispatched command produces
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub reply: Reply,
    pub notifications: Vec<Notification>,
}

impl CommandOutput {
    pub(crate) fn reply(reply: Reply) -> Self {
        Self {
            reply,
            notifications: Vec::new(),
        }
    }

    pub(crate) fn with(reply: Reply, notifications: Vec<Notification>) -> Self {
        Self {
            reply,
            notifications,
        }
    }

    pub(crate) fn fail(err: GameError) -> Self {
        Self::reply(Reply::from(&err))
    }
}
