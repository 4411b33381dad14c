//! High concurrency tests for queue joins and account connections
//!
//! Requests race through the shared repository; every invariant guarded by
//! a check has to hold once all of them settle.

use crate::fixtures::TestSystem;
use meshwell::accounts::AccountRequest;
use meshwell::error::{error_kind, ErrorKind};
use meshwell::types::{Day, Platform};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_never_exceed_capacity() {
    const CAPACITY: usize = 3;
    const PLAYERS: usize = 12;

    let system = TestSystem::new(CAPACITY).await;
    let mut players = Vec::with_capacity(PLAYERS);
    for i in 0..PLAYERS {
        players.push(
            system
                .player_with_window(&format!("player{}", i), Day::Friday, 18, 23, false)
                .await,
        );
    }

    let start = Instant::now();
    let handles: Vec<_> = players
        .into_iter()
        .map(|ctx| {
            let services = system.services().clone();
            tokio::spawn(async move { services.sessions.join_queue(&ctx).await })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let elapsed = start.elapsed();

    let mut per_session: HashMap<_, usize> = HashMap::new();
    for result in results {
        let ticket = result.expect("task panicked").expect("join failed");
        *per_session.entry(ticket.session.session.id).or_default() += 1;
    }

    assert_eq!(per_session.values().sum::<usize>(), PLAYERS);
    assert_eq!(per_session.len(), PLAYERS / CAPACITY);
    for session_id in per_session.keys() {
        let view = system
            .services()
            .sessions
            .get_session(*session_id)
            .await
            .unwrap();
        assert!(
            view.participants.len() <= CAPACITY,
            "session {} has {} participants",
            session_id,
            view.participants.len()
        );
    }

    println!("{} concurrent joins settled in {:?}", PLAYERS, elapsed);
    assert!(elapsed < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_of_one_tag() {
    const CLAIMANTS: usize = 8;

    let system = TestSystem::new(5).await;
    let mut claimants = Vec::with_capacity(CLAIMANTS);
    for i in 0..CLAIMANTS {
        claimants.push(system.register(&format!("claimant{}", i)).await);
    }

    let game_id = system.game.id;
    let handles: Vec<_> = claimants
        .into_iter()
        .map(|ctx| {
            let services = system.services().clone();
            tokio::spawn(async move {
                services
                    .accounts
                    .connect(
                        &ctx,
                        AccountRequest {
                            game_id,
                            platform: Platform::Xbl,
                            game_player_tag: "Shared.Tag".to_string(),
                        },
                    )
                    .await
            })
        })
        .collect();

    let results = futures::future::join_all(handles).await;
    let mut connected = 0;
    for result in results {
        match result.expect("task panicked") {
            Ok(_) => connected += 1,
            Err(e) => assert_eq!(error_kind(&e), ErrorKind::Conflict),
        }
    }
    assert_eq!(connected, 1);

    let stats = system.app.store_stats().unwrap();
    assert_eq!(stats.connected_accounts, 1);
}

#[tokio::test]
async fn test_join_leave_churn_leaves_no_empty_sessions() {
    let system = TestSystem::new(4).await;
    let mut players = Vec::new();
    for i in 0..6 {
        players.push(
            system
                .player_with_window(&format!("churn{}", i), Day::Wednesday, 19, 23, false)
                .await,
        );
    }

    for round in 0..5 {
        for ctx in &players {
            system.services().sessions.join_queue(ctx).await.unwrap();
        }
        let queued = system.app.store_stats().unwrap();
        assert_eq!(queued.session_profiles, players.len());
        assert_eq!(queued.sessions, 2);

        for ctx in players.iter().rev() {
            system.services().sessions.leave_queue(ctx).await.unwrap();
        }

        let stats = system.app.store_stats().unwrap();
        assert_eq!(stats.sessions, 0, "round {} left sessions behind", round);
        assert_eq!(stats.session_profiles, 0);
    }
}
