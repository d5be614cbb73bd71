mod helpers;

use chrono::{Duration, Utc};
use helpers::login_as_default_admin;
use serde_json::json;

test_with_server!(status_starts_closed, |server, ctx_state, config| {
    let response = server.get("/api/periods/status").await;
    assert_eq!(response.status_code(), 200);
    let status = response.json::<serde_json::Value>();
    assert_eq!(status["participation_open"], false);
    assert_eq!(status["voting_open"], false);
});

test_with_server!(period_admin_requires_login, |server, ctx_state, config| {
    let response = server
        .post("/api/periods")
        .json(&json!({
            "activity": "Participation",
            "start_at": Utc::now().to_rfc3339(),
            "end_at": (Utc::now() + Duration::hours(1)).to_rfc3339(),
        }))
        .await;
    assert_eq!(response.status_code(), 401);
});

test_with_server!(activation_opens_the_window, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    let response = server
        .post("/api/periods")
        .json(&json!({
            "activity": "Participation",
            "start_at": (Utc::now() - Duration::hours(1)).to_rfc3339(),
            "end_at": (Utc::now() + Duration::hours(1)).to_rfc3339(),
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let window = response.json::<serde_json::Value>();
    let window_id = window["id"].as_object().unwrap();
    let window_id = format!(
        "{}:{}",
        window_id["tb"].as_str().unwrap(),
        window_id["id"]["String"].as_str().unwrap()
    );

    // created inactive, the window does not open anything yet
    let status = server.get("/api/periods/status").await.json::<serde_json::Value>();
    assert_eq!(status["participation_open"], false);

    let response = server
        .post(&format!("/api/periods/{window_id}/activate"))
        .await;
    assert_eq!(response.status_code(), 200);

    let status = server.get("/api/periods/status").await.json::<serde_json::Value>();
    assert_eq!(status["participation_open"], true);
    assert_eq!(status["voting_open"], false);
});

test_with_server!(activating_replaces_the_sibling, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    let mut ids = vec![];
    for offset in [0, 1] {
        let response = server
            .post("/api/periods")
            .json(&json!({
                "activity": "Voting",
                "start_at": (Utc::now() - Duration::hours(1 + offset)).to_rfc3339(),
                "end_at": (Utc::now() + Duration::hours(1 + offset)).to_rfc3339(),
            }))
            .await;
        assert_eq!(response.status_code(), 200);
        let window = response.json::<serde_json::Value>();
        let id = window["id"].as_object().unwrap();
        ids.push(format!(
            "{}:{}",
            id["tb"].as_str().unwrap(),
            id["id"]["String"].as_str().unwrap()
        ));
    }

    for id in &ids {
        let response = server.post(&format!("/api/periods/{id}/activate")).await;
        assert_eq!(response.status_code(), 200);
    }

    let windows = server.get("/api/periods").await.json::<serde_json::Value>();
    let active: Vec<&serde_json::Value> = windows
        .as_array()
        .unwrap()
        .iter()
        .filter(|w| w["active"] == true)
        .collect();
    assert_eq!(active.len(), 1);
});

test_with_server!(expired_window_counts_as_closed, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    let response = server
        .post("/api/periods")
        .json(&json!({
            "activity": "Voting",
            "start_at": (Utc::now() - Duration::hours(3)).to_rfc3339(),
            "end_at": (Utc::now() - Duration::hours(1)).to_rfc3339(),
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let window = response.json::<serde_json::Value>();
    let id = window["id"].as_object().unwrap();
    let id = format!(
        "{}:{}",
        id["tb"].as_str().unwrap(),
        id["id"]["String"].as_str().unwrap()
    );

    let response = server.post(&format!("/api/periods/{id}/activate")).await;
    assert_eq!(response.status_code(), 200);

    let status = server.get("/api/periods/status").await.json::<serde_json::Value>();
    assert_eq!(status["voting_open"], false);
});

test_with_server!(bounds_are_validated, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    let response = server
        .post("/api/periods")
        .json(&json!({
            "activity": "Voting",
            "start_at": (Utc::now() + Duration::hours(2)).to_rfc3339(),
            "end_at": Utc::now().to_rfc3339(),
        }))
        .await;
    assert_eq!(response.status_code(), 400);
});
