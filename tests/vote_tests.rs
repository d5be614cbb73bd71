mod helpers;

use concours_server::entities::participation_entity::ParticipationStatus;
use concours_server::entities::period_entity::Activity;
use concours_server::entities::vote_entity::VoteDbService;
use helpers::{open_period, seed_category, seed_participation, test_ctx};
use serde_json::json;

test_with_server!(submit_rejected_outside_period, |server, ctx_state, config| {
    let response = server
        .post("/api/votes")
        .json(&json!({"voter_email": "voter@example.fr", "selections": []}))
        .await;
    assert_eq!(response.status_code(), 403);
});

test_with_server!(ballot_bootstraps_categories, |server, ctx_state, config| {
    seed_participation(
        &ctx_state,
        "Boulangerie Martin",
        vec!["Commerce", "Service"],
        ParticipationStatus::Approved,
    )
    .await;
    seed_participation(
        &ctx_state,
        "Garage Dupont",
        vec!["Service"],
        ParticipationStatus::Approved,
    )
    .await;
    seed_participation(
        &ctx_state,
        "Fleuriste Lea",
        vec!["Commerce"],
        ParticipationStatus::Pending,
    )
    .await;

    let response = server.get("/api/ballot").await;
    assert_eq!(response.status_code(), 200);
    let ballot = response.json::<serde_json::Value>();

    let categories = ballot["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);

    // only approved candidacies are listed
    let participations = ballot["participations"].as_array().unwrap();
    assert_eq!(participations.len(), 2);
});

test_with_server!(one_batch_per_email, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Voting).await;

    let category = seed_category(&ctx_state, "Commerce").await;
    let participation = seed_participation(
        &ctx_state,
        "Boulangerie Martin",
        vec!["Commerce"],
        ParticipationStatus::Approved,
    )
    .await;

    let selections = json!([{
        "category_id": category.id.as_ref().unwrap().to_raw(),
        "participation_id": participation.id.as_ref().unwrap().to_raw(),
    }]);

    let response = server
        .post("/api/votes")
        .json(&json!({"voter_email": "Voter@Example.fr", "selections": selections}))
        .await;
    assert_eq!(response.status_code(), 200);
    let receipt = response.json::<serde_json::Value>();
    assert_eq!(receipt["cast"], 1);
    assert_eq!(receipt["voter_email"], "voter@example.fr");
    assert_eq!(receipt["establishments"], json!(["Boulangerie Martin"]));

    // a second batch from the same address, any casing, is rejected
    let response = server
        .post("/api/votes")
        .json(&json!({"voter_email": "voter@example.fr", "selections": selections}))
        .await;
    assert_eq!(response.status_code(), 409);

    let ctx = test_ctx();
    let votes = VoteDbService {
        db: &ctx_state.db.client,
        ctx: &ctx,
    };
    assert_eq!(votes.count_by_email("voter@example.fr").await.unwrap(), 1);
});

test_with_server!(empty_selection_casts_no_rows, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Voting).await;

    let response = server
        .post("/api/votes")
        .json(&json!({"voter_email": "empty@example.fr", "selections": []}))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<serde_json::Value>()["cast"], 0);

    let ctx = test_ctx();
    let votes = VoteDbService {
        db: &ctx_state.db.client,
        ctx: &ctx,
    };
    assert_eq!(votes.count_by_email("empty@example.fr").await.unwrap(), 0);
    // zero rows means the address has not voted yet
    assert!(!votes.exists_by_email("empty@example.fr").await.unwrap());
});

test_with_server!(blank_email_is_rejected, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Voting).await;

    let response = server
        .post("/api/votes")
        .json(&json!({"voter_email": "   ", "selections": []}))
        .await;
    assert_eq!(response.status_code(), 400);
});

test_with_server!(votes_only_target_approved, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Voting).await;

    let category = seed_category(&ctx_state, "Commerce").await;
    let pending = seed_participation(
        &ctx_state,
        "Fleuriste Lea",
        vec!["Commerce"],
        ParticipationStatus::Pending,
    )
    .await;

    let response = server
        .post("/api/votes")
        .json(&json!({
            "voter_email": "voter@example.fr",
            "selections": [{
                "category_id": category.id.as_ref().unwrap().to_raw(),
                "participation_id": pending.id.as_ref().unwrap().to_raw(),
            }],
        }))
        .await;
    assert_eq!(response.status_code(), 400);

    let ctx = test_ctx();
    let votes = VoteDbService {
        db: &ctx_state.db.client,
        ctx: &ctx,
    };
    // the failed batch left nothing behind
    assert_eq!(votes.count_by_email("voter@example.fr").await.unwrap(), 0);
});
