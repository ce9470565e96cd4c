//! Handlers for commands that require game-master authority
//!
//! Authorization is the lookup itself: every handler resolves the caller's
//! own non-stopped game first and fails with NOT_FOUND when there is none.

use super::{after_removal, end_game, new_target};
use crate::error::GameError;
use crate::protocol::{
    CommandOutput, NewTargetReason, Notification, NotificationKind, Reply,
};
use crate::state::{AppState, Removal};
use crate::types::*;

pub(super) async fn register_game(
    state: &AppState,
    master_id: UserId,
    master_handle: &str,
) -> CommandOutput {
    match state.register_game(master_id, master_handle).await {
        Ok(game) => CommandOutput::reply(Reply::GameRegistered { game }),
        Err(err) => CommandOutput::fail(err),
    }
}

pub(super) async fn start_game(state: &AppState, master_id: UserId) -> CommandOutput {
    let Some(game) = state.active_game_of_master(master_id).await else {
        return CommandOutput::fail(GameError::NotFound);
    };
    match state.start_game(&game.id).await {
        Ok(players) => {
            let mut notifications = Vec::with_capacity(players.len());
            for assassin in &players {
                if let Some(n) = new_target(state, assassin.id, NewTargetReason::GameStart).await {
                    notifications.push(n);
                }
            }
            CommandOutput::with(
                Reply::GameStarted {
                    game_id: game.id,
                    players: players.len(),
                },
                notifications,
            )
        }
        Err(err) => CommandOutput::fail(err),
    }
}

pub(super) async fn stop_game(state: &AppState, master_id: UserId) -> CommandOutput {
    let Some(game) = state.active_game_of_master(master_id).await else {
        return CommandOutput::fail(GameError::NotFound);
    };
    // Snapshot the standings for the master before the stop cascades
    let leaderboard = state.rank(&game.id).await.unwrap_or_default();
    let notifications = end_game(state, &game.id, None).await;
    CommandOutput::with(Reply::GameStopped { leaderboard }, notifications)
}

pub(super) async fn burn(state: &AppState, master_id: UserId, target_id: UserId) -> CommandOutput {
    let Some(game) = state.active_game_of_master(master_id).await else {
        return CommandOutput::fail(GameError::NotFound);
    };
    match state.burn(master_id, target_id).await {
        Ok(removal) => {
            let notifications =
                after_removal(state, &game.id, &removal, NewTargetReason::TargetBurned).await;
            CommandOutput::with(Reply::Burned { target_id }, notifications)
        }
        Err(err) => CommandOutput::fail(err),
    }
}

pub(super) async fn post_task(
    state: &AppState,
    master_id: UserId,
    message: &str,
    solution_pattern: &str,
) -> CommandOutput {
    let Some(game) = state.active_game_of_master(master_id).await else {
        return CommandOutput::fail(GameError::NotFound);
    };
    match state.post_task(&game.id, message, solution_pattern).await {
        Ok(task) => {
            let notifications = state
                .living_members(&game.id)
                .await
                .iter()
                .map(|a| Notification {
                    recipient: a.id,
                    kind: NotificationKind::TaskPosted {
                        message: task.message.clone(),
                    },
                })
                .collect();
            CommandOutput::with(Reply::TaskPosted { task_id: task.id }, notifications)
        }
        Err(err) => CommandOutput::fail(err),
    }
}

pub(super) async fn close_task(state: &AppState, master_id: UserId) -> CommandOutput {
    let Some(game) = state.active_game_of_master(master_id).await else {
        return CommandOutput::fail(GameError::NotFound);
    };
    let burned = match state.close_task(&game.id).await {
        Ok(burned) => burned,
        Err(err) => return CommandOutput::fail(err),
    };

    let mut notifications = Vec::new();
    for target_id in &burned {
        match state.forced_burn(&game.id, *target_id).await {
            Ok(removal) => {
                notifications.extend(
                    after_removal(state, &game.id, &removal, NewTargetReason::TargetBurned).await,
                );
                if matches!(
                    removal,
                    Removal::Spliced { game_over: true, .. } | Removal::LastManStanding
                ) {
                    // The game just ended; any remaining burns are moot
                    break;
                }
            }
            Err(err) => {
                tracing::error!(game = %game.id, target = target_id, error = %err, "forced burn failed");
            }
        }
    }
    CommandOutput::with(Reply::TaskClosed { burned }, notifications)
}

pub(super) async fn players(state: &AppState, master_id: UserId) -> CommandOutput {
    let Some(game) = state.active_game_of_master(master_id).await else {
        return CommandOutput::fail(GameError::NotFound);
    };
    let entries = state
        .members(&game.id)
        .await
        .into_iter()
        .map(|a| PlayerOverview {
            id: a.id,
            alive: a.is_alive(),
            code_name: a.code_name,
            tally: a.tally,
            jokers_used: a.jokers_used,
        })
        .collect();
    CommandOutput::reply(Reply::Players { entries })
}

pub(super) async fn broadcast(
    state: &AppState,
    master_id: UserId,
    text: &str,
    only_alive: bool,
) -> CommandOutput {
    let Some(game) = state.active_game_of_master(master_id).await else {
        return CommandOutput::fail(GameError::NotFound);
    };
    let recipients = if only_alive {
        state.living_members(&game.id).await
    } else {
        state.members(&game.id).await
    };
    let notifications: Vec<Notification> = recipients
        .iter()
        .map(|a| Notification {
            recipient: a.id,
            kind: NotificationKind::Broadcast {
                master_handle: game.master_handle.clone(),
                text: text.to_string(),
            },
        })
        .collect();
    tracing::info!(game = %game.id, recipients = notifications.len(), "broadcast");
    CommandOutput::with(
        Reply::BroadcastSent {
            recipients: notifications.len(),
        },
        notifications,
    )
}
