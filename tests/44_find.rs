mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::TestApp;

async fn seed_reminders(app: &TestApp) -> Result<()> {
    let rows = [
        ("feed", "pet-1", false, 3),
        ("walk", "pet-1", true, 1),
        ("vet", "pet-1", false, 2),
        ("bath", "pet-2", false, 4),
    ];
    for (title, pet_id, done, priority) in rows {
        let (status, body) = app
            .call(
                Method::POST,
                "/api/entities/reminders",
                None,
                Some(json!({ "title": title, "pet_id": pet_id, "done": done, "priority": priority })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "seed failed: {}", body);
    }
    Ok(())
}

fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|r| r["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn find_requires_every_condition() -> Result<()> {
    let app = TestApp::new();
    seed_reminders(&app).await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/find/reminders",
            None,
            Some(json!({ "where": { "pet_id": "pet-1", "done": false }, "order": "priority" })),
        )
        .await?;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(titles(&body), vec!["vet", "feed"]);
    Ok(())
}

#[tokio::test]
async fn find_accepts_explicit_eq_and_limit() -> Result<()> {
    let app = TestApp::new();
    seed_reminders(&app).await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/find/reminders",
            None,
            Some(json!({ "where": { "pet_id": { "$eq": "pet-1" } }, "order": "-priority", "limit": 2 })),
        )
        .await?;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(titles(&body), vec!["feed", "vet"]);
    Ok(())
}

#[tokio::test]
async fn find_without_matches_is_an_empty_list() -> Result<()> {
    let app = TestApp::new();
    seed_reminders(&app).await?;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/find/reminders",
            None,
            Some(json!({ "where": { "pet_id": "pet-9" } })),
        )
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn range_operators_are_rejected() -> Result<()> {
    let app = TestApp::new();
    seed_reminders(&app).await?;

    for clause in [
        json!({ "priority": { "$gt": 1 } }),
        json!({ "$or": [{ "pet_id": "pet-1" }, { "pet_id": "pet-2" }] }),
    ] {
        let (status, body) = app
            .call(Method::POST, "/api/find/reminders", None, Some(json!({ "where": clause })))
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
        assert_eq!(body["code"], "INVALID_ARGUMENT");
    }
    Ok(())
}

#[tokio::test]
async fn legacy_field_spellings_are_normalized() -> Result<()> {
    let app = TestApp::new();
    seed_reminders(&app).await?;

    // `createdAt` sorts on the canonical `created_at` field
    let (status, body) = app
        .call(
            Method::POST,
            "/api/find/reminders",
            None,
            Some(json!({ "where": {}, "order": "createdAt desc" })),
        )
        .await?;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(4));
    Ok(())
}

#[tokio::test]
async fn invalid_limit_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let (status, body) = app
        .call(Method::POST, "/api/find/reminders", None, Some(json!({ "limit": -1 })))
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
    Ok(())
}
