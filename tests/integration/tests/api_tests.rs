//! API Integration Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Environment variables: DATABASE_URL, JWT_SECRET, API_PORT
//!
//! Run with: cargo test -p integration-tests --test api_tests

use cmt_core::entities::Chapter;
use integration_tests::{
    assert_error, assert_json, assert_status, check_test_env, seed_chapter, seed_member,
    unique_id, TestServer, TEST_PASSWORD,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Server plus a chapter whose president and a national officer are logged in
struct World {
    server: TestServer,
    chapter: Chapter,
    chapter_id: String,
    president: String,
    national: String,
}

async fn world() -> World {
    let server = TestServer::start().await.expect("Failed to start server");
    let chapter = seed_chapter(&server.pool).await.unwrap();
    let president = seed_member(&server.pool, &chapter, Some("president")).await.unwrap();
    let national = seed_member(&server.pool, &chapter, Some("national officer")).await.unwrap();

    World {
        president: server.login(&president.email, TEST_PASSWORD).await.unwrap(),
        national: server.login(&national.email, TEST_PASSWORD).await.unwrap(),
        chapter_id: chapter.id.to_string(),
        chapter,
        server,
    }
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();

    let response = server.get("/health/ready").await.expect("Request failed");
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_openapi_document_served() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/api-docs/openapi.json").await.unwrap();
    let doc: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(doc["paths"]["/api/v1/members/{member_id}/transitions"].is_object());
}

// ============================================================================
// Auth Tests
// ============================================================================

#[tokio::test]
async fn test_login_and_me() {
    if !check_test_env() {
        return;
    }

    let world = world().await;
    let response = world.server.get_auth("/api/v1/members/@me", &world.president).await.unwrap();
    let me: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(me["status"], "active");
    assert_eq!(me["roles"], json!(["president"]));
    assert!(me["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p == "MANAGE_MEMBERS"));
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server
        .post(
            "/api/v1/auth/login",
            &json!({ "email": "nobody@example.edu", "password": "Wrong1234" }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_requires_bearer_token() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/api/v1/members/@me").await.unwrap();
    let code = assert_error(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(code, "MISSING_AUTHORIZATION");
}

#[tokio::test]
async fn test_refresh_token() {
    if !check_test_env() {
        return;
    }

    let server = TestServer::start().await.expect("Failed to start server");
    let chapter = seed_chapter(&server.pool).await.unwrap();
    let member = seed_member(&server.pool, &chapter, None).await.unwrap();

    let response = server
        .post(
            "/api/v1/auth/login",
            &json!({ "email": member.email, "password": TEST_PASSWORD }),
        )
        .await
        .unwrap();
    let auth: Value = assert_json(response, StatusCode::OK).await.unwrap();

    let response = server
        .post(
            "/api/v1/auth/refresh",
            &json!({ "refresh_token": auth["refresh_token"] }),
        )
        .await
        .unwrap();
    let refreshed: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(refreshed["access_token"].as_str().is_some_and(|t| !t.is_empty()));
}

// ============================================================================
// Membership Tests
// ============================================================================

#[tokio::test]
async fn test_pledge_through_initiation() {
    if !check_test_env() {
        return;
    }

    let world = world().await;
    let server = &world.server;
    let suffix = unique_id();

    let response = server
        .post_auth(
            &format!("/api/v1/chapters/{}/members", world.chapter_id),
            &world.president,
            &json!({
                "email": format!("pledge{suffix}@example.edu"),
                "first_name": "Ada",
                "last_name": "Lovelace",
                "start": "2024-09-10",
            }),
        )
        .await
        .unwrap();
    let member: Value = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(member["status"], "pnm");
    let member_id = member["id"].as_str().unwrap().to_string();

    let response = server
        .post_auth(
            &format!("/api/v1/members/{member_id}/transitions"),
            &world.president,
            &json!({ "transition": { "kind": "initiation" }, "effective_date": "2024-12-01" }),
        )
        .await
        .unwrap();
    let outcome: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(outcome["applied"], true);
    assert_eq!(outcome["history"]["current_status"], "active");

    let intervals = outcome["history"]["intervals"].as_array().unwrap();
    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[0]["status"], "pnm");
    assert_eq!(intervals[0]["end"], "2024-11-30");
    assert_eq!(intervals[1]["status"], "active");
    assert!(intervals[1]["end"].is_null());

    let response = server
        .get_auth(&format!("/api/v1/members/{member_id}/transitions"), &world.president)
        .await
        .unwrap();
    let transitions: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(transitions.as_array().unwrap().len(), 1);
    assert_eq!(transitions[0]["kind"], "initiation");

    let response = server
        .get_auth(&format!("/api/v1/members/{member_id}/audit"), &world.president)
        .await
        .unwrap();
    let audit: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!audit.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_set_needs_national_officer() {
    if !check_test_env() {
        return;
    }

    let world = world().await;
    let response = world
        .server
        .get_auth("/api/v1/members/@me", &world.president)
        .await
        .unwrap();
    let me: Value = assert_json(response, StatusCode::OK).await.unwrap();
    let member_id = me["id"].as_str().unwrap();

    let body = json!({
        "transition": { "kind": "admin_set", "status": "alumni" },
        "effective_date": "2024-06-01",
    });
    let response = world
        .server
        .post_auth(&format!("/api/v1/members/{member_id}/transitions"), &world.president, &body)
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();

    let response = world
        .server
        .post_auth(&format!("/api/v1/members/{member_id}/transitions"), &world.national, &body)
        .await
        .unwrap();
    let outcome: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(outcome["history"]["current_status"], "alumni");
}

#[tokio::test]
async fn test_roster_filters_by_status() {
    if !check_test_env() {
        return;
    }

    let world = world().await;
    let response = world
        .server
        .get_auth(
            &format!("/api/v1/chapters/{}/members?status=active", world.chapter_id),
            &world.president,
        )
        .await
        .unwrap();
    let roster: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(roster.as_array().unwrap().len(), 2);

    let response = world
        .server
        .get_auth(
            &format!("/api/v1/chapters/{}/members?status=bogus", world.chapter_id),
            &world.president,
        )
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "INVALID_QUERY_PARAMETER");
}

#[tokio::test]
async fn test_invalid_member_id_rejected() {
    if !check_test_env() {
        return;
    }

    let world = world().await;
    let response = world
        .server
        .get_auth("/api/v1/members/not-a-number", &world.president)
        .await
        .unwrap();
    let code = assert_error(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(code, "INVALID_PATH_PARAMETER");
}

// ============================================================================
// Role Tests
// ============================================================================

#[tokio::test]
async fn test_election_replaces_president() {
    if !check_test_env() {
        return;
    }

    let world = world().await;
    let server = &world.server;
    let successor = seed_member(&server.pool, &world.chapter, None).await.unwrap();

    let response = server
        .post_auth(
            &format!("/api/v1/chapters/{}/elections", world.chapter_id),
            &world.president,
            &json!({
                "start": "2025-01-01",
                "officers": [{ "member_id": successor.id.to_string(), "role": "president" }],
            }),
        )
        .await
        .unwrap();
    let election: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(election["ended"], 1);
    assert_eq!(election["assigned"], 1);

    let response = server
        .get_auth(
            &format!("/api/v1/members/{}/roles", successor.id),
            &world.national,
        )
        .await
        .unwrap();
    let roles: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(roles["intervals"][0]["role"], "president");
    assert_eq!(roles["intervals"][0]["start"], "2025-01-01");
}

#[tokio::test]
async fn test_assign_and_end_role() {
    if !check_test_env() {
        return;
    }

    let world = world().await;
    let server = &world.server;
    let response = server.get_auth("/api/v1/members/@me", &world.national).await.unwrap();
    let me: Value = assert_json(response, StatusCode::OK).await.unwrap();
    let member_id = me["id"].as_str().unwrap().to_string();

    let response = server
        .post_auth(
            &format!("/api/v1/members/{member_id}/roles"),
            &world.president,
            &json!({ "role": "treasurer", "start": "2024-01-01", "end": "2099-12-31" }),
        )
        .await
        .unwrap();
    let roles: Value = assert_json(response, StatusCode::CREATED).await.unwrap();
    let treasurer = roles["intervals"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["role"] == "treasurer")
        .cloned()
        .unwrap();
    assert_eq!(treasurer["end"], "2099-12-31");

    let response = server
        .delete_auth(
            &format!("/api/v1/members/{member_id}/roles/{}", treasurer["id"].as_str().unwrap()),
            &world.president,
        )
        .await
        .unwrap();
    let roles: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!roles["current_roles"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r == "treasurer"));
}

// ============================================================================
// Scoring Tests
// ============================================================================

#[tokio::test]
async fn test_record_event_and_read_scores() {
    if !check_test_env() {
        return;
    }

    let world = world().await;
    let server = &world.server;
    let slug = format!("svc{}", unique_id());

    let response = server
        .post_auth(
            "/api/v1/score-types",
            &world.president,
            &json!({
                "slug": slug, "name": "Service event", "section": "Ser", "kind": "Evt",
                "points": 100.0, "term_points": 50.0,
            }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::FORBIDDEN).await.unwrap();

    let response = server
        .post_auth(
            "/api/v1/score-types",
            &world.national,
            &json!({
                "slug": slug, "name": "Service event", "section": "Ser", "kind": "Evt",
                "points": 100.0, "term_points": 50.0,
                "formula": "BASE + MEMBER_ADD * MEMBERS",
                "base_points": 5.0, "member_add": 1.0,
            }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::CREATED).await.unwrap();

    let response = server
        .post_auth(
            &format!("/api/v1/chapters/{}/events", world.chapter_id),
            &world.president,
            &json!({ "score_type": slug, "name": "Food drive", "date": "2024-10-05", "members": 3 }),
        )
        .await
        .unwrap();
    let activity: Value = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(activity["score"], 8.0);
    assert_eq!(activity["term"], "fa2024");

    let response = server
        .get_auth(
            &format!("/api/v1/chapters/{}/scores?year=2024", world.chapter_id),
            &world.president,
        )
        .await
        .unwrap();
    let scores: Value = assert_json(response, StatusCode::OK).await.unwrap();
    let entry = scores["scores"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["slug"] == slug.as_str())
        .cloned()
        .unwrap();
    assert_eq!(entry["score"], 8.0);
}

#[tokio::test]
async fn test_bad_formula_rejected() {
    if !check_test_env() {
        return;
    }

    let world = world().await;
    let response = world
        .server
        .post_auth(
            "/api/v1/score-types",
            &world.national,
            &json!({
                "slug": format!("bad{}", unique_id()), "name": "Broken", "section": "Pro",
                "kind": "Evt", "points": 10.0, "term_points": 10.0, "formula": "BASE +",
            }),
        )
        .await
        .unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}
