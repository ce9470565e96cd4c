//! Handlers for player-issued commands

use super::{after_removal, end_game, new_target};
use crate::error::GameError;
use crate::protocol::{
    CommandOutput, NewTargetReason, Notification, NotificationKind, Reply,
};
use crate::state::AppState;
use crate::types::*;

pub(super) async fn enroll(state: &AppState, game_id: &GameId, signup: Enrollment) -> CommandOutput {
    match state.enroll(game_id, signup).await {
        Ok(assassin) => {
            // Point the fresh recruit at their human game master
            let master_handle = state
                .get_game(game_id)
                .await
                .map(|g| g.master_handle)
                .unwrap_or_default();
            CommandOutput::reply(Reply::Enrolled {
                game_id: assassin.game_id,
                master_handle,
            })
        }
        Err(err) => CommandOutput::fail(err),
    }
}

pub(super) async fn dropout(state: &AppState, assassin_id: UserId) -> CommandOutput {
    let Some(game) = state.active_game_of_member(assassin_id).await else {
        return CommandOutput::fail(GameError::NotEnrolled);
    };
    match state.dropout(assassin_id).await {
        Ok(removal) => {
            let notifications =
                after_removal(state, &game.id, &removal, NewTargetReason::TargetDroppedOut).await;
            CommandOutput::with(Reply::DroppedOut, notifications)
        }
        Err(err) => CommandOutput::fail(err),
    }
}

pub(super) async fn claim_kill(state: &AppState, hunter_id: UserId) -> CommandOutput {
    match state.claim_kill(hunter_id).await {
        Ok(victim) => {
            let master_handle = state
                .get_game(&victim.game_id)
                .await
                .map(|g| g.master_handle)
                .unwrap_or_default();
            let notifications = vec![Notification {
                recipient: victim.id,
                kind: NotificationKind::ClaimFiled { master_handle },
            }];
            CommandOutput::with(
                Reply::ClaimFiled {
                    target_id: victim.id,
                },
                notifications,
            )
        }
        Err(err) => CommandOutput::fail(err),
    }
}

pub(super) async fn confirm_dead(state: &AppState, victim_id: UserId) -> CommandOutput {
    let kill = match state.confirm_dead(victim_id, true).await {
        Ok(kill) => kill,
        Err(err) => return CommandOutput::fail(err),
    };
    let game_id = kill.hunter.game_id.clone();

    let mut notifications = Vec::new();
    let announcement = NotificationKind::KillAnnouncement {
        killer_code_name: kill.hunter.code_name.clone(),
        victim_code_name: kill.victim.code_name.clone(),
        tally: kill.hunter.tally,
    };
    for subscriber in state.subscribers(&game_id).await {
        notifications.push(Notification {
            recipient: subscriber,
            kind: announcement.clone(),
        });
    }
    if let Some(game) = state.get_game(&game_id).await {
        notifications.push(Notification {
            recipient: game.master_id,
            kind: announcement,
        });
    }

    if kill.game_over {
        notifications.extend(end_game(state, &game_id, Some(&kill.hunter)).await);
    } else if let Some(n) = new_target(state, kill.hunter.id, NewTargetReason::KillConfirmed).await
    {
        notifications.push(n);
    }
    CommandOutput::with(Reply::DeathConfirmed, notifications)
}

pub(super) async fn answer_task(
    state: &AppState,
    assassin_id: UserId,
    text: &str,
) -> CommandOutput {
    match state.answer_task(assassin_id, text).await {
        Ok(()) => CommandOutput::reply(Reply::AnswerAccepted),
        Err(err) => CommandOutput::fail(err),
    }
}

/// Works for masters and players alike: masters see the game they run,
/// players the game they fight in.
pub(super) async fn leaderboard(state: &AppState, chat_id: UserId) -> CommandOutput {
    let game = match state.active_game_of_master(chat_id).await {
        Some(game) => game,
        None => match state.active_game_of_member(chat_id).await {
            Some(game) => game,
            None => return CommandOutput::fail(GameError::NotEnrolled),
        },
    };
    match state.rank(&game.id).await {
        Ok(entries) => CommandOutput::reply(Reply::Leaderboard { entries }),
        Err(err) => CommandOutput::fail(err),
    }
}

pub(super) async fn subscribe(state: &AppState, assassin_id: UserId) -> CommandOutput {
    match state.toggle_subscription(assassin_id).await {
        Ok(subscribed) => CommandOutput::reply(Reply::Subscribed { subscribed }),
        Err(err) => CommandOutput::fail(err),
    }
}

pub(super) async fn dossier(state: &AppState, assassin_id: UserId) -> CommandOutput {
    match state.dossier_for(assassin_id).await {
        Ok(dossier) => CommandOutput::reply(Reply::Dossier { dossier }),
        Err(err) => CommandOutput::fail(err),
    }
}

#[cfg(test)]
mod tests {
    use super::super::dispatch;
    use crate::protocol::{Command, NewTargetReason, NotificationKind, Reply};
    use crate::state::test_support::*;
    use crate::state::AppState;
    use crate::types::GameState;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_enroll_points_at_the_master() {
        let state = Arc::new(AppState::new());
        let game = state.register_game(100, "ossner").await.unwrap();

        let output = dispatch(
            Command::Enroll {
                game_id: game.id.clone(),
                signup: enrollment(1, "MrDoe"),
            },
            &state,
        )
        .await;
        match output.reply {
            Reply::Enrolled { master_handle, .. } => assert_eq!(master_handle, "ossner"),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_claim_notifies_the_victim() {
        let state = Arc::new(AppState::new());
        started_game(&state, 100, 3).await;

        let output = dispatch(Command::ClaimKill { hunter_id: 1 }, &state).await;
        assert!(matches!(output.reply, Reply::ClaimFiled { target_id: 2 }));
        assert_eq!(output.notifications.len(), 1);
        assert_eq!(output.notifications[0].recipient, 2);
        assert!(matches!(
            &output.notifications[0].kind,
            NotificationKind::ClaimFiled { master_handle } if master_handle == "master"
        ));
    }

    #[tokio::test]
    async fn test_confirm_announces_and_rearms_the_hunter() {
        let state = Arc::new(AppState::new());
        started_game(&state, 100, 3).await;
        state.toggle_subscription(3).await.unwrap();
        state.claim_kill(1).await.unwrap();

        let output = dispatch(Command::ConfirmDead { victim_id: 2 }, &state).await;
        assert!(matches!(output.reply, Reply::DeathConfirmed));

        // Subscriber P3, the master, and the hunter's new dossier
        assert_eq!(output.notifications.len(), 3);
        assert!(matches!(
            &output.notifications[0].kind,
            NotificationKind::KillAnnouncement { killer_code_name, tally: 1, .. }
                if killer_code_name == "P1"
        ));
        assert_eq!(output.notifications[0].recipient, 3);
        assert_eq!(output.notifications[1].recipient, 100);
        match &output.notifications[2].kind {
            NotificationKind::NewTarget { reason, dossier } => {
                assert_eq!(*reason, NewTargetReason::KillConfirmed);
                assert_eq!(dossier.target_id, 3);
            }
            other => panic!("unexpected notification {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_confirm_on_last_pair_ends_the_game() {
        let state = Arc::new(AppState::new());
        let game = started_game(&state, 100, 2).await;
        state.claim_kill(1).await.unwrap();

        let output = dispatch(Command::ConfirmDead { victim_id: 2 }, &state).await;
        assert!(matches!(output.reply, Reply::DeathConfirmed));

        let game_over: Vec<_> = output
            .notifications
            .iter()
            .filter(|n| {
                matches!(
                    &n.kind,
                    NotificationKind::GameOver { winner_code_name, tally: 1, .. }
                        if winner_code_name == "P1"
                )
            })
            .collect();
        // Winner and victim both hear how it ended
        assert_eq!(game_over.len(), 2);
        assert_eq!(
            state.get_game(&game.id).await.unwrap().state,
            GameState::Stopped
        );
    }

    #[tokio::test]
    async fn test_dropout_notifies_hunter() {
        let state = Arc::new(AppState::new());
        started_game(&state, 100, 3).await;

        let output = dispatch(Command::Dropout { assassin_id: 2 }, &state).await;
        assert!(matches!(output.reply, Reply::DroppedOut));
        assert_eq!(output.notifications.len(), 1);
        assert_eq!(output.notifications[0].recipient, 1);
        assert!(matches!(
            &output.notifications[0].kind,
            NotificationKind::NewTarget {
                reason: NewTargetReason::TargetDroppedOut,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_leaderboard_resolves_master_and_member() {
        let state = Arc::new(AppState::new());
        started_game(&state, 100, 3).await;

        for chat_id in [100, 2] {
            let output = dispatch(Command::Leaderboard { chat_id }, &state).await;
            match output.reply {
                Reply::Leaderboard { entries } => assert_eq!(entries.len(), 3),
                other => panic!("unexpected reply {other:?}"),
            }
        }

        let output = dispatch(Command::Leaderboard { chat_id: 999 }, &state).await;
        assert!(matches!(output.reply, Reply::Error { .. }));
    }

    #[tokio::test]
    async fn test_wrong_answer_is_an_error_reply() {
        let state = Arc::new(AppState::new());
        let game = started_game(&state, 100, 2).await;
        state.post_task(&game.id, "Task", "right").await.unwrap();

        let output = dispatch(
            Command::AnswerTask {
                assassin_id: 1,
                text: "wrong".to_string(),
            },
            &state,
        )
        .await;
        match output.reply {
            Reply::Error { code, .. } => assert_eq!(code, "INCORRECT_ANSWER"),
            other => panic!("unexpected reply {other:?}"),
        }
    }
}
