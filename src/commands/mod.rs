//! Command dispatch
//!
//! Single entry point for the chat transport: resolve the issuing chat id,
//! run the state transition, and package the reply plus notification fan-out.
//! Master commands authorize by resolving the master's own game; there is no
//! separate role concept.

mod master;
mod player;

use crate::protocol::{Command, CommandOutput, NewTargetReason, Notification, NotificationKind};
use crate::state::{AppState, Removal};
use crate::types::*;
use std::sync::Arc;

/// Handle one inbound command and return the reply and notifications
pub async fn dispatch(cmd: Command, state: &Arc<AppState>) -> CommandOutput {
    match cmd {
        Command::RegisterGame {
            master_id,
            master_handle,
        } => master::register_game(state, master_id, &master_handle).await,
        Command::StartGame { master_id } => master::start_game(state, master_id).await,
        Command::StopGame { master_id } => master::stop_game(state, master_id).await,
        Command::Burn {
            master_id,
            target_id,
        } => master::burn(state, master_id, target_id).await,
        Command::PostTask {
            master_id,
            message,
            solution_pattern,
        } => master::post_task(state, master_id, &message, &solution_pattern).await,
        Command::CloseTask { master_id } => master::close_task(state, master_id).await,
        Command::Players { master_id } => master::players(state, master_id).await,
        Command::Broadcast {
            master_id,
            text,
            only_alive,
        } => master::broadcast(state, master_id, &text, only_alive).await,

        Command::Enroll { game_id, signup } => player::enroll(state, &game_id, signup).await,
        Command::Dropout { assassin_id } => player::dropout(state, assassin_id).await,
        Command::ClaimKill { hunter_id } => player::claim_kill(state, hunter_id).await,
        Command::ConfirmDead { victim_id } => player::confirm_dead(state, victim_id).await,
        Command::AnswerTask { assassin_id, text } => {
            player::answer_task(state, assassin_id, &text).await
        }
        Command::Leaderboard { chat_id } => player::leaderboard(state, chat_id).await,
        Command::Subscribe { assassin_id } => player::subscribe(state, assassin_id).await,
        Command::Dossier { assassin_id } => player::dossier(state, assassin_id).await,
    }
}

/// Compose the NewTarget notification for a hunter, if a dossier can be built
pub(crate) async fn new_target(
    state: &AppState,
    hunter_id: UserId,
    reason: NewTargetReason,
) -> Option<Notification> {
    match state.dossier_for(hunter_id).await {
        Ok(dossier) => Some(Notification {
            recipient: hunter_id,
            kind: NotificationKind::NewTarget { reason, dossier },
        }),
        Err(err) => {
            tracing::error!(hunter = hunter_id, error = %err, "failed to compose dossier");
            None
        }
    }
}

/// Stop a game and tell every (former) member how it ended
pub(crate) async fn end_game(
    state: &AppState,
    game_id: &GameId,
    winner: Option<&Assassin>,
) -> Vec<Notification> {
    let report = match state.stop_game(game_id).await {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(game = %game_id, error = %err, "failed to stop game");
            return Vec::new();
        }
    };
    report
        .members
        .iter()
        .map(|member| Notification {
            recipient: *member,
            kind: match winner {
                Some(winner) => NotificationKind::GameOver {
                    winner_code_name: winner.code_name.clone(),
                    tally: winner.tally,
                    leaderboard: report.leaderboard.clone(),
                },
                None => NotificationKind::GameStopped {
                    leaderboard: report.leaderboard.clone(),
                },
            },
        })
        .collect()
}

/// Notification fan-out after a splice-style removal (dropout, burn)
pub(crate) async fn after_removal(
    state: &AppState,
    game_id: &GameId,
    removal: &Removal,
    reason: NewTargetReason,
) -> Vec<Notification> {
    match removal {
        Removal::PreStart => Vec::new(),
        Removal::Spliced {
            hunter,
            game_over: false,
        } => new_target(state, hunter.id, reason).await.into_iter().collect(),
        Removal::Spliced {
            hunter,
            game_over: true,
        } => end_game(state, game_id, Some(hunter)).await,
        // The removed player already was the winner-elect; the game is over
        // without a further splice
        Removal::LastManStanding => end_game(state, game_id, None).await,
    }
}
