//! Connected accounts against a mocked rank service, and the HTTP surface

use crate::fixtures::{MockRankService, TestSystem, GAME};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use meshwell::accounts::AccountRequest;
use meshwell::api::{router, PROFILE_HEADER};
use meshwell::error::{error_kind, ErrorKind};
use meshwell::preferences::MatchmakingPreferences;
use meshwell::types::{Commend, Platform, Ranks, Region};
use mockall::predicate::function;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

#[tokio::test]
async fn test_rank_lookup_uses_profile_region() {
    let mut ranks = MockRankService::new();
    ranks
        .expect_lookup()
        .with(function(|q: &meshwell::accounts::RankQuery| {
            q.tag == "Valk.Cams" && q.region == Region::Emea && q.platform == Platform::Psn
        }))
        .times(1)
        .returning(|_| {
            Ok(Some(Ranks {
                casual: "Silver I".to_string(),
                competitive: "Copper V".to_string(),
            }))
        });

    let system = TestSystem::with_rank_provider(5, Arc::new(ranks)).await;
    let ctx = system.register("valkyrie").await;

    let account = assert_ok!(
        system
            .services()
            .accounts
            .connect(
                &ctx,
                AccountRequest {
                    game_id: system.game.id,
                    platform: Platform::Psn,
                    game_player_tag: "Valk.Cams".to_string(),
                },
            )
            .await
    );
    assert_eq!(account.comp_rank, "Copper V");
}

#[tokio::test]
async fn test_unknown_tag_is_external_failure() {
    let mut ranks = MockRankService::new();
    ranks.expect_lookup().times(1).returning(|_| Ok(None));

    let system = TestSystem::with_rank_provider(5, Arc::new(ranks)).await;
    let ctx = system.register("ghost").await;

    let err = assert_err!(
        system
            .services()
            .accounts
            .connect(
                &ctx,
                AccountRequest {
                    game_id: system.game.id,
                    platform: Platform::Uplay,
                    game_player_tag: "Nobody".to_string(),
                },
            )
            .await
    );
    assert_eq!(error_kind(&err), ErrorKind::ExternalService);
    assert!(system.services().accounts.list(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tag_cannot_be_claimed_twice() {
    let system = TestSystem::new(5).await;
    let owner = system.player("owner").await;
    let thief = system.register("thief").await;

    let err = assert_err!(
        system
            .services()
            .accounts
            .connect(
                &thief,
                AccountRequest {
                    game_id: system.game.id,
                    platform: Platform::Uplay,
                    game_player_tag: "owner.R6".to_string(),
                },
            )
            .await
    );
    assert_eq!(error_kind(&err), ErrorKind::Conflict);
    assert_eq!(system.services().accounts.list(&owner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_preferred_game_defaults_to_first_account() {
    let system = TestSystem::new(5).await;
    let ctx = system.register("solo").await;

    let prefs = system.services().preferences.get(&ctx).await.unwrap();
    assert_eq!(prefs.pref_game, None);
    assert_eq!(prefs.commend_priorities, Commend::ALL);

    let unconnected = system
        .services()
        .preferences
        .save(
            &ctx,
            MatchmakingPreferences {
                pref_game: Some(system.game.id),
                ..prefs
            },
        )
        .await;
    assert!(unconnected.is_err());

    let ctx = system.player("duo").await;
    let saved = system
        .services()
        .preferences
        .save(
            &ctx,
            MatchmakingPreferences {
                commend_priorities: [
                    Commend::Communication,
                    Commend::Skill,
                    Commend::Teamwork,
                    Commend::Sportsmanship,
                ],
                ignore_matchmaking: false,
                pref_game: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(saved.pref_game, Some(system.game.id));

    let duplicate = system
        .services()
        .preferences
        .save(
            &ctx,
            MatchmakingPreferences {
                commend_priorities: [
                    Commend::Skill,
                    Commend::Skill,
                    Commend::Teamwork,
                    Commend::Sportsmanship,
                ],
                ignore_matchmaking: false,
                pref_game: None,
            },
        )
        .await;
    let err = assert_err!(duplicate);
    assert!(err.to_string().contains("commend_priority_1 and commend_priority_2"));
}

async fn call(
    app: &axum::Router,
    method: &str,
    uri: &str,
    profile: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let token = meshwell::config::ApiSettings::default().token;
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Token {}", token));
    if let Some(profile) = profile {
        builder = builder.header(PROFILE_HEADER, profile);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_http_queue_flow() {
    let system = TestSystem::new(5).await;
    let app = router(system.app.api_state());

    let mut ids = Vec::new();
    for name in ["kapkan", "tachanka"] {
        let (status, profile) = call(
            &app,
            "POST",
            "/api/profiles",
            None,
            Some(json!({
                "username": name,
                "email": format!("{}@example.com", name),
                "birth_date": "1995-02-03",
                "pref_server": "eu",
                "tos": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = profile["id"].as_str().unwrap().to_string();

        let (status, _) = call(
            &app,
            "POST",
            "/api/accounts",
            Some(&id),
            Some(json!({
                "game_id": system.game.id,
                "platform": "uplay",
                "game_player_tag": format!("{}.R6", name)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = call(
            &app,
            "POST",
            "/api/availability",
            Some(&id),
            Some(json!({
                "day": "saturday",
                "start_time": "12:00:00",
                "end_time": "16:00:00",
                "competitive": false
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(id);
    }

    let (status, first) = call(&app, "POST", "/api/queue", Some(&ids[0]), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = first["session"]["session"]["id"].as_str().unwrap().to_string();

    let (status, second) = call(&app, "POST", "/api/queue", Some(&ids[1]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["session"]["session"]["id"], session_id.as_str());

    let (status, pending) = call(&app, "GET", "/api/queue", Some(&ids[1]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["session_id"], session_id.as_str());

    let (status, view) = call(&app, "GET", &format!("/api/sessions/{}", session_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["participants"].as_array().unwrap().len(), 2);
    assert_eq!(view["state"], "open");

    // Rating before the session has happened
    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/sessions/{}/rating", session_id),
        Some(&ids[0]),
        Some(json!({ "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, games) = call(&app, "GET", "/api/games", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(games[0]["name"], GAME);

    let (status, left) = call(&app, "DELETE", "/api/queue", Some(&ids[0]), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(left["left"].as_array().unwrap().len(), 1);
}
