use assassins::commands::dispatch;
use assassins::protocol::{Command, NewTargetReason, NotificationKind, Reply};
use assassins::state::AppState;
use assassins::types::{Enrollment, GameId, GameState, UserId};
use std::sync::Arc;

fn signup(id: UserId, code_name: &str) -> Enrollment {
    Enrollment {
        id,
        name: format!("Player {id}"),
        code_name: code_name.to_string(),
        address: "Olympiadorf 1".to_string(),
        major: "Informatics".to_string(),
        needs_weapon: id % 2 == 0,
    }
}

async fn enroll(state: &Arc<AppState>, game_id: &GameId, id: UserId, code_name: &str) {
    let output = dispatch(
        Command::Enroll {
            game_id: game_id.clone(),
            signup: signup(id, code_name),
        },
        state,
    )
    .await;
    assert!(
        matches!(output.reply, Reply::Enrolled { .. }),
        "enrollment of {id} failed: {:?}",
        output.reply
    );
}

/// End-to-end run of a full game: registration, enrollment, the kill
/// protocol, a few task rounds with a joker burn, and the last-man-standing
/// finish.
#[tokio::test]
async fn test_full_game_flow() {
    let state = Arc::new(AppState::new());

    // 1. Master registers a game
    let output = dispatch(
        Command::RegisterGame {
            master_id: 100,
            master_handle: "ossner".to_string(),
        },
        &state,
    )
    .await;
    let game_id = match output.reply {
        Reply::GameRegistered { game } => {
            assert_eq!(game.state, GameState::Open);
            game.id
        }
        other => panic!("expected GameRegistered, got {other:?}"),
    };

    // 2. Four players sign up
    for (id, code_name) in [(1, "MrDoe"), (2, "MrsDoe"), (3, "Hippie"), (4, "TheDoc")] {
        enroll(&state, &game_id, id, code_name).await;
    }

    // 3. Start: everyone is handed their first dossier, ring follows
    //    enrollment order (1 -> 2 -> 3 -> 4 -> 1)
    let output = dispatch(Command::StartGame { master_id: 100 }, &state).await;
    match output.reply {
        Reply::GameStarted { players, .. } => assert_eq!(players, 4),
        other => panic!("expected GameStarted, got {other:?}"),
    }
    assert_eq!(output.notifications.len(), 4);
    let first = output
        .notifications
        .iter()
        .find(|n| n.recipient == 1)
        .unwrap();
    match &first.kind {
        NotificationKind::NewTarget { reason, dossier } => {
            assert_eq!(*reason, NewTargetReason::GameStart);
            assert_eq!(dossier.target_id, 2);
            assert_eq!(dossier.profile.code_name, "MrsDoe");
        }
        other => panic!("expected NewTarget, got {other:?}"),
    }

    // Latecomers are turned away
    let output = dispatch(
        Command::Enroll {
            game_id: game_id.clone(),
            signup: signup(5, "TooLate"),
        },
        &state,
    )
    .await;
    match output.reply {
        Reply::Error { code, .. } => assert_eq!(code, "GAME_NOT_JOINABLE"),
        other => panic!("expected Error, got {other:?}"),
    }

    // 4. P3 subscribes to the kill feed
    let output = dispatch(Command::Subscribe { assassin_id: 3 }, &state).await;
    assert!(matches!(output.reply, Reply::Subscribed { subscribed: true }));

    // 5. P1 assassinates P2: claim, then the victim's confirmation
    let output = dispatch(Command::ClaimKill { hunter_id: 1 }, &state).await;
    assert!(matches!(output.reply, Reply::ClaimFiled { target_id: 2 }));
    assert_eq!(output.notifications[0].recipient, 2);

    let output = dispatch(Command::ConfirmDead { victim_id: 2 }, &state).await;
    assert!(matches!(output.reply, Reply::DeathConfirmed));
    // Subscriber P3 and the master hear about it, P1 gets their new target
    let recipients: Vec<UserId> = output.notifications.iter().map(|n| n.recipient).collect();
    assert_eq!(recipients, vec![3, 100, 1]);
    match &output.notifications[2].kind {
        NotificationKind::NewTarget { reason, dossier } => {
            assert_eq!(*reason, NewTargetReason::KillConfirmed);
            assert_eq!(dossier.target_id, 3);
        }
        other => panic!("expected NewTarget, got {other:?}"),
    }

    // 6. Three task rounds; P4 never answers and burns out on the third
    for round in 0..3 {
        let output = dispatch(
            Command::PostTask {
                master_id: 100,
                message: format!("Challenge {round}"),
                solution_pattern: "tower".to_string(),
            },
            &state,
        )
        .await;
        assert!(matches!(output.reply, Reply::TaskPosted { .. }));

        // A wrong answer is retryable
        let output = dispatch(
            Command::AnswerTask {
                assassin_id: 1,
                text: "the castle".to_string(),
            },
            &state,
        )
        .await;
        assert!(matches!(output.reply, Reply::Error { .. }));

        for assassin_id in [1, 3] {
            let output = dispatch(
                Command::AnswerTask {
                    assassin_id,
                    text: "the clock tower".to_string(),
                },
                &state,
            )
            .await;
            assert!(matches!(output.reply, Reply::AnswerAccepted));
        }

        let output = dispatch(Command::CloseTask { master_id: 100 }, &state).await;
        match &output.reply {
            Reply::TaskClosed { burned } => {
                if round < 2 {
                    assert!(burned.is_empty());
                    assert!(output.notifications.is_empty());
                } else {
                    assert_eq!(burned, &vec![4]);
                    // P4's hunter P3 is re-targeted at P1
                    assert_eq!(output.notifications.len(), 1);
                    assert_eq!(output.notifications[0].recipient, 3);
                    assert!(matches!(
                        &output.notifications[0].kind,
                        NotificationKind::NewTarget {
                            reason: NewTargetReason::TargetBurned,
                            ..
                        }
                    ));
                }
            }
            other => panic!("expected TaskClosed, got {other:?}"),
        }
    }
    assert!(!state.get_assassin(4).await.unwrap().is_alive());
    // A burn never credits a tally
    assert_eq!(state.get_assassin(3).await.unwrap().tally, 0);

    // 7. Standings: living first, then the dead, tally-ranked within each
    let output = dispatch(Command::Leaderboard { chat_id: 100 }, &state).await;
    match output.reply {
        Reply::Leaderboard { entries } => {
            let names: Vec<&str> = entries.iter().map(|e| e.code_name.as_str()).collect();
            assert_eq!(names, vec!["MrDoe", "Hippie", "MrsDoe", "TheDoc"]);
            assert!(entries[0].alive && entries[1].alive);
            assert!(!entries[2].alive && !entries[3].alive);
            assert_eq!(entries[0].tally, 1);
        }
        other => panic!("expected Leaderboard, got {other:?}"),
    }

    // 8. P1 takes out P3; the ring closes and the game ends
    let output = dispatch(Command::ClaimKill { hunter_id: 1 }, &state).await;
    assert!(matches!(output.reply, Reply::ClaimFiled { target_id: 3 }));
    let output = dispatch(Command::ConfirmDead { victim_id: 3 }, &state).await;
    assert!(matches!(output.reply, Reply::DeathConfirmed));

    let game_over: Vec<UserId> = output
        .notifications
        .iter()
        .filter(|n| {
            matches!(
                &n.kind,
                NotificationKind::GameOver { winner_code_name, tally: 2, .. }
                    if winner_code_name == "MrDoe"
            )
        })
        .map(|n| n.recipient)
        .collect();
    assert_eq!(game_over, vec![1, 2, 3, 4]);
    assert_eq!(
        state.get_game(&game_id).await.unwrap().state,
        GameState::Stopped
    );

    // 9. The stop cascaded, and the master is free to register a new game
    let output = dispatch(Command::Leaderboard { chat_id: 1 }, &state).await;
    assert!(matches!(output.reply, Reply::Error { .. }));
    let output = dispatch(
        Command::RegisterGame {
            master_id: 100,
            master_handle: "ossner".to_string(),
        },
        &state,
    )
    .await;
    assert!(matches!(output.reply, Reply::GameRegistered { .. }));
}

/// A player backing out before the start is simply deleted; afterwards their
/// hunter inherits the target without a tally credit.
#[tokio::test]
async fn test_dropout_before_and_after_start() {
    let state = Arc::new(AppState::new());
    let output = dispatch(
        Command::RegisterGame {
            master_id: 100,
            master_handle: "master".to_string(),
        },
        &state,
    )
    .await;
    let game_id = match output.reply {
        Reply::GameRegistered { game } => game.id,
        other => panic!("expected GameRegistered, got {other:?}"),
    };
    for id in 1..=4 {
        enroll(&state, &game_id, id, &format!("P{id}")).await;
    }

    // Pre-start dropout: hard removal, nobody is notified
    let output = dispatch(Command::Dropout { assassin_id: 4 }, &state).await;
    assert!(matches!(output.reply, Reply::DroppedOut));
    assert!(output.notifications.is_empty());
    assert!(state.get_assassin(4).await.is_none());

    let output = dispatch(Command::StartGame { master_id: 100 }, &state).await;
    assert!(matches!(
        output.reply,
        Reply::GameStarted { players: 3, .. }
    ));

    // In-game dropout: splice, hunter notified, no tally anywhere
    let output = dispatch(Command::Dropout { assassin_id: 2 }, &state).await;
    assert!(matches!(output.reply, Reply::DroppedOut));
    assert_eq!(output.notifications.len(), 1);
    assert_eq!(output.notifications[0].recipient, 1);
    let survivor = state.get_assassin(1).await.unwrap();
    assert_eq!(survivor.target, Some(3));
    assert_eq!(survivor.tally, 0);
    // The record outlives the splice for the final standings
    assert!(state.get_assassin(2).await.unwrap().eliminated);
}

/// Masters can only burn players of their own game
#[tokio::test]
async fn test_burn_authorization() {
    let state = Arc::new(AppState::new());
    for (master_id, player_base) in [(100, 0), (200, 10)] {
        let output = dispatch(
            Command::RegisterGame {
                master_id,
                master_handle: format!("master{master_id}"),
            },
            &state,
        )
        .await;
        let game_id = match output.reply {
            Reply::GameRegistered { game } => game.id,
            other => panic!("expected GameRegistered, got {other:?}"),
        };
        for offset in 1..=2 {
            let id = player_base + offset;
            enroll(&state, &game_id, id, &format!("P{id}")).await;
        }
        let output = dispatch(Command::StartGame { master_id }, &state).await;
        assert!(matches!(output.reply, Reply::GameStarted { .. }));
    }

    // Master 200 cannot touch a player of game 100
    let output = dispatch(
        Command::Burn {
            master_id: 200,
            target_id: 1,
        },
        &state,
    )
    .await;
    match output.reply {
        Reply::Error { code, .. } => assert_eq!(code, "NOT_AUTHORIZED"),
        other => panic!("expected Error, got {other:?}"),
    }
    assert!(state.get_assassin(1).await.unwrap().is_alive());
}

/// The two-phase protocol rejects repeated claims and unprompted confirmations
#[tokio::test]
async fn test_kill_protocol_guards() {
    let state = Arc::new(AppState::new());
    let output = dispatch(
        Command::RegisterGame {
            master_id: 100,
            master_handle: "master".to_string(),
        },
        &state,
    )
    .await;
    let game_id = match output.reply {
        Reply::GameRegistered { game } => game.id,
        other => panic!("expected GameRegistered, got {other:?}"),
    };
    for id in 1..=3 {
        enroll(&state, &game_id, id, &format!("P{id}")).await;
    }
    dispatch(Command::StartGame { master_id: 100 }, &state).await;

    // Confirming with no claim pending
    let output = dispatch(Command::ConfirmDead { victim_id: 2 }, &state).await;
    match output.reply {
        Reply::Error { code, .. } => assert_eq!(code, "NO_PENDING_CLAIM"),
        other => panic!("expected Error, got {other:?}"),
    }

    // Claiming twice
    dispatch(Command::ClaimKill { hunter_id: 1 }, &state).await;
    let output = dispatch(Command::ClaimKill { hunter_id: 1 }, &state).await;
    match output.reply {
        Reply::Error { code, .. } => assert_eq!(code, "DUPLICATE_CLAIM"),
        other => panic!("expected Error, got {other:?}"),
    }

    // The original claim still resolves
    let output = dispatch(Command::ConfirmDead { victim_id: 2 }, &state).await;
    assert!(matches!(output.reply, Reply::DeathConfirmed));
}

/// Commands against different games run concurrently without interference
#[tokio::test]
async fn test_concurrent_games_are_independent() {
    let state = Arc::new(AppState::new());
    let mut game_ids = Vec::new();
    for (master_id, player_base) in [(100, 0), (200, 10)] {
        let output = dispatch(
            Command::RegisterGame {
                master_id,
                master_handle: format!("master{master_id}"),
            },
            &state,
        )
        .await;
        let game_id = match output.reply {
            Reply::GameRegistered { game } => game.id,
            other => panic!("expected GameRegistered, got {other:?}"),
        };
        for offset in 1..=3 {
            let id = player_base + offset;
            enroll(&state, &game_id, id, &format!("P{id}")).await;
        }
        dispatch(Command::StartGame { master_id }, &state).await;
        game_ids.push(game_id);
    }

    // Run a full kill in each game at the same time
    let kill = |hunter: UserId, victim: UserId| {
        let state = state.clone();
        async move {
            let output = dispatch(Command::ClaimKill { hunter_id: hunter }, &state).await;
            assert!(matches!(output.reply, Reply::ClaimFiled { .. }));
            let output = dispatch(Command::ConfirmDead { victim_id: victim }, &state).await;
            assert!(matches!(output.reply, Reply::DeathConfirmed));
        }
    };
    tokio::join!(kill(1, 2), kill(11, 12));

    for (hunter, next_target) in [(1, 3), (11, 13)] {
        let assassin = state.get_assassin(hunter).await.unwrap();
        assert_eq!(assassin.tally, 1);
        assert_eq!(assassin.target, Some(next_target));
    }
    for game_id in &game_ids {
        assert_eq!(
            state.get_game(game_id).await.unwrap().state,
            GameState::Started
        );
    }
}
