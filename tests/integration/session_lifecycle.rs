//! End-to-end session workflows: queueing, hosting, leaving and rating

use crate::fixtures::{first_friday, following_saturday, monday_noon, time, TestSystem};
use meshwell::error::{error_kind, ErrorKind};
use meshwell::preferences::MatchmakingPreferences;
use meshwell::rating::{ParticipantFeedback, RatingSubmission};
use meshwell::session::SessionRequest;
use meshwell::types::{Commend, Day, RequestContext, SessionState};
use tokio_test::{assert_err, assert_ok};

fn later(ctx: &RequestContext) -> RequestContext {
    RequestContext::at(ctx.profile_id, following_saturday())
}

#[tokio::test]
async fn test_complete_queue_and_rating_workflow() {
    let system = TestSystem::new(5).await;
    let ash = system.player_with_window("ash", Day::Friday, 18, 23, false).await;
    let thermite = system
        .player_with_window("thermite", Day::Friday, 17, 23, false)
        .await;
    let smoke = system
        .player_with_window("smoke", Day::Friday, 18, 23, false)
        .await;

    // Step 1: first player creates a session at their window
    let first = assert_ok!(system.services().sessions.join_queue(&ash).await);
    assert!(first.created);
    let session_id = first.session.session.id;
    assert_eq!(
        first.session.session.start.date_naive(),
        first_friday(),
        "session anchored at the next Friday"
    );
    assert_eq!(first.session.session.start.time(), time(18));
    assert_eq!(first.session.session.end_time.time(), time(23));

    // Step 2: the others are matched into it
    for ctx in [&thermite, &smoke] {
        let ticket = assert_ok!(system.services().sessions.join_queue(ctx).await);
        assert!(!ticket.created);
        assert_eq!(ticket.session.session.id, session_id);
    }
    assert_eq!(system.publisher.count_events_of_type("SessionCreated"), 1);
    assert_eq!(system.publisher.count_events_of_type("PlayerJoinedSession"), 2);

    let view = system.services().sessions.get_session(session_id).await.unwrap();
    assert_eq!(view.participants.len(), 3);
    assert_eq!(view.state, SessionState::Open);

    // Step 3: ratings are refused until the session has ended
    let submission = RatingSubmission {
        rating: 4,
        feedback: vec![
            ParticipantFeedback {
                profile_id: thermite.profile_id,
                commends: vec![Commend::Teamwork, Commend::Skill],
                report: false,
            },
            ParticipantFeedback {
                profile_id: smoke.profile_id,
                commends: vec![],
                report: true,
            },
        ],
    };
    let early = assert_err!(
        system
            .services()
            .ratings
            .submit(&ash, session_id, submission.clone())
            .await
    );
    assert_eq!(error_kind(&early), ErrorKind::Validation);

    // Step 4: rating after the session applies commends and reports
    let outcome = assert_ok!(
        system
            .services()
            .ratings
            .submit(&later(&ash), session_id, submission.clone())
            .await
    );
    assert_eq!(outcome.rated_participants, 2);
    assert_eq!(outcome.commendations.len(), 2);
    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.reports[0].user_reported, smoke.profile_id);
    assert_eq!(system.publisher.count_events_of_type("SessionRated"), 1);

    let thermite_profile = system.services().profiles.get(thermite.profile_id).await.unwrap();
    assert_eq!(thermite_profile.commends.get(Commend::Teamwork), 1);
    assert_eq!(thermite_profile.commends.get(Commend::Skill), 1);
    assert_eq!(thermite_profile.received_ratings, 1);
    let ash_profile = system.services().profiles.get(ash.profile_id).await.unwrap();
    assert_eq!(ash_profile.sessions_played, 1);
    assert_eq!(ash_profile.received_ratings, 0);

    let view = system.services().sessions.get_session(session_id).await.unwrap();
    assert_eq!(view.state, SessionState::Completed);

    // Step 5: one rating per participant
    let again = assert_err!(
        system
            .services()
            .ratings
            .submit(&later(&ash), session_id, submission)
            .await
    );
    assert_eq!(error_kind(&again), ErrorKind::Conflict);

    // Step 6: the completed session no longer holds anyone in the queue
    let pending = system
        .services()
        .sessions
        .current_queue(&later(&thermite))
        .await
        .unwrap();
    assert!(pending.is_none());

    let next = assert_ok!(system.services().sessions.join_queue(&later(&ash)).await);
    assert!(next.created);
    assert_ne!(next.session.session.id, session_id);
}

#[tokio::test]
async fn test_queue_finds_hosted_session() {
    let system = TestSystem::new(5).await;
    let host = system.player("host").await;
    let hosted = assert_ok!(
        system
            .services()
            .sessions
            .create_session(
                &host,
                SessionRequest {
                    game_id: system.game.id,
                    date: first_friday(),
                    start_time: time(19),
                    end_time: time(21),
                    competitive: false,
                },
            )
            .await
    );
    assert_eq!(hosted.participants.len(), 1);

    let casual = system
        .player_with_window("casual", Day::Friday, 18, 23, false)
        .await;
    let ticket = assert_ok!(system.services().sessions.join_queue(&casual).await);
    assert_eq!(ticket.session.session.id, hosted.session.id);

    // Competitive windows never match casual sessions
    let ranked = system
        .player_with_window("ranked", Day::Friday, 18, 23, true)
        .await;
    let ticket = assert_ok!(system.services().sessions.join_queue(&ranked).await);
    assert!(ticket.created);
    assert!(ticket.session.session.competitive);
}

#[tokio::test]
async fn test_short_sessions_are_rejected() {
    let system = TestSystem::new(5).await;
    let host = system.player("host").await;

    let err = assert_err!(
        system
            .services()
            .sessions
            .create_session(
                &host,
                SessionRequest {
                    game_id: system.game.id,
                    date: first_friday(),
                    start_time: time(19),
                    end_time: time(19) + chrono::Duration::minutes(59),
                    competitive: false,
                },
            )
            .await
    );
    assert_eq!(error_kind(&err), ErrorKind::Validation);

    let err = assert_err!(
        system
            .services()
            .sessions
            .create_session(
                &host,
                SessionRequest {
                    game_id: system.game.id,
                    date: monday_noon().date_naive(),
                    start_time: time(9),
                    end_time: time(11),
                    competitive: false,
                },
            )
            .await
    );
    assert_eq!(error_kind(&err), ErrorKind::Validation);
}

#[tokio::test]
async fn test_leave_queue_removes_empty_sessions() {
    let system = TestSystem::new(5).await;
    let first = system.player_with_window("first", Day::Sunday, 14, 18, false).await;
    let second = system.player_with_window("second", Day::Sunday, 14, 18, false).await;

    let ticket = system.services().sessions.join_queue(&first).await.unwrap();
    let session_id = ticket.session.session.id;
    system.services().sessions.join_queue(&second).await.unwrap();

    let summary = system.services().sessions.leave_queue(&first).await.unwrap();
    assert_eq!(summary.left, vec![session_id]);
    assert!(summary.removed.is_empty());

    let summary = system.services().sessions.leave_queue(&second).await.unwrap();
    assert_eq!(summary.removed, vec![session_id]);
    assert_eq!(system.publisher.count_events_of_type("PlayerLeftSession"), 2);

    let err = assert_err!(system.services().sessions.get_session(session_id).await);
    assert_eq!(error_kind(&err), ErrorKind::NotFound);

    let err = assert_err!(system.services().sessions.leave_queue(&second).await);
    assert_eq!(error_kind(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_pending_participation_blocks_requeue() {
    let system = TestSystem::new(5).await;
    let player = system.player_with_window("eager", Day::Friday, 18, 23, false).await;

    let ticket = system.services().sessions.join_queue(&player).await.unwrap();
    let pending = system.services().sessions.current_queue(&player).await.unwrap();
    assert_eq!(pending, Some(ticket.session_profile));

    let err = assert_err!(system.services().sessions.join_queue(&player).await);
    assert_eq!(error_kind(&err), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_unrated_session_releases_players_once_over() {
    let system = TestSystem::new(5).await;
    let jager = system.player_with_window("jager", Day::Friday, 18, 23, false).await;
    let bandit = system.player_with_window("bandit", Day::Friday, 18, 23, false).await;

    let played = system.services().sessions.join_queue(&jager).await.unwrap();
    let played_id = played.session.session.id;
    system.services().sessions.join_queue(&bandit).await.unwrap();

    // Nobody rated; the session ended Friday night
    let jager_later = later(&jager);
    let pending = system
        .services()
        .sessions
        .current_queue(&jager_later)
        .await
        .unwrap();
    assert!(pending.is_none());

    let next = assert_ok!(system.services().sessions.join_queue(&jager_later).await);
    assert!(next.created);
    assert_ne!(next.session.session.id, played_id);

    // Leaving drops only the upcoming session
    let summary = assert_ok!(system.services().sessions.leave_queue(&jager_later).await);
    assert_eq!(summary.left, vec![next.session.session.id]);

    let view = system.services().sessions.get_session(played_id).await.unwrap();
    assert_eq!(view.participants.len(), 2);
    assert_eq!(view.state, SessionState::Open);

    let err = assert_err!(system.services().sessions.leave_queue(&later(&bandit)).await);
    assert_eq!(error_kind(&err), ErrorKind::NotFound);

    // The played session can still be rated
    let outcome = assert_ok!(
        system
            .services()
            .ratings
            .submit(
                &jager_later,
                played_id,
                RatingSubmission {
                    rating: 5,
                    feedback: vec![ParticipantFeedback {
                        profile_id: bandit.profile_id,
                        commends: vec![Commend::Communication],
                        report: false,
                    }],
                },
            )
            .await
    );
    assert_eq!(outcome.rated_participants, 1);
}

#[tokio::test]
async fn test_preferences_steer_session_choice() {
    let system = TestSystem::new(5).await;

    // Two hosted sessions on Friday; hosts with very different reputations
    let sniper = system.player("sniper").await;
    let medic = system.player("medic").await;
    let repository = system.app.repository();
    repository
        .transaction(|data| {
            for (id, commend) in [
                (sniper.profile_id, Commend::Skill),
                (medic.profile_id, Commend::Teamwork),
            ] {
                let mut profile = data.get_profile(id)?.unwrap();
                profile.received_ratings = 10;
                for _ in 0..10 {
                    profile.commends.increment(commend);
                }
                data.put_profile(profile)?;
            }
            Ok(())
        })
        .unwrap();

    let host = |ctx: RequestContext, start: u32, end: u32| {
        let services = system.services().clone();
        let game_id = system.game.id;
        async move {
            services
                .sessions
                .create_session(
                    &ctx,
                    SessionRequest {
                        game_id,
                        date: first_friday(),
                        start_time: time(start),
                        end_time: time(end),
                        competitive: false,
                    },
                )
                .await
                .unwrap()
        }
    };
    let skilled = host(sniper, 20, 22).await;
    let friendly = host(medic, 18, 20).await;

    // Skill first: the later session with the skilled host wins
    let picky = system.player_with_window("picky", Day::Friday, 17, 23, false).await;
    system
        .services()
        .preferences
        .save(
            &picky,
            MatchmakingPreferences {
                commend_priorities: [
                    Commend::Skill,
                    Commend::Teamwork,
                    Commend::Sportsmanship,
                    Commend::Communication,
                ],
                ignore_matchmaking: false,
                pref_game: None,
            },
        )
        .await
        .unwrap();
    let ticket = system.services().sessions.join_queue(&picky).await.unwrap();
    assert_eq!(ticket.session.session.id, skilled.session.id);

    // Ignoring matchmaking takes the earliest session
    let hurried = system.player_with_window("hurried", Day::Friday, 17, 23, false).await;
    system
        .services()
        .preferences
        .save(
            &hurried,
            MatchmakingPreferences {
                commend_priorities: [
                    Commend::Skill,
                    Commend::Teamwork,
                    Commend::Sportsmanship,
                    Commend::Communication,
                ],
                ignore_matchmaking: true,
                pref_game: None,
            },
        )
        .await
        .unwrap();
    let ticket = system.services().sessions.join_queue(&hurried).await.unwrap();
    assert_eq!(ticket.session.session.id, friendly.session.id);
}

#[tokio::test]
async fn test_deactivated_profile_cannot_queue() {
    let system = TestSystem::new(5).await;
    let quitter = system.player_with_window("quitter", Day::Monday, 18, 22, false).await;

    system.services().profiles.deactivate(&quitter).await.unwrap();
    let err = assert_err!(system.services().sessions.join_queue(&quitter).await);
    assert_eq!(error_kind(&err), ErrorKind::Validation);
    assert!(err.to_string().contains("banned or deactivated"));
}
