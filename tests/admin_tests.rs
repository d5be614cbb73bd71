mod helpers;

use chrono::Utc;
use concours_server::entities::admin_user_entity::{AdminCredential, AdminUserDbService};
use concours_server::entities::participation_entity::{Participation, ParticipationStatus};
use concours_server::services::admin_service::DEFAULT_ADMIN_EMAIL;
use concours_server::utils::hash::hash_password;
use helpers::{login_as_default_admin, seed_participation, test_ctx, TEST_ADMIN_PASSWORD};
use serde_json::json;

test_with_server!(login_rejects_bad_password, |server, ctx_state, config| {
    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": DEFAULT_ADMIN_EMAIL,
            "password": "definitely-not-it",
        }))
        .await;
    assert_eq!(response.status_code(), 403);
});

test_with_server!(provisioning_and_duplicate_email, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    let response = server
        .post("/api/admin/users")
        .json(&json!({
            "email": "nouvelle@concours.fr",
            "password": "un-mot-de-passe-long",
            "role": "Admin",
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .post("/api/admin/users")
        .json(&json!({
            "email": "nouvelle@concours.fr",
            "password": "un-autre-mot-de-passe",
            "role": "Admin",
        }))
        .await;
    assert_eq!(response.status_code(), 409);

    // the provisioned admin can log in
    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "nouvelle@concours.fr",
            "password": "un-mot-de-passe-long",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
});

test_with_server!(short_password_is_rejected, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    let response = server
        .post("/api/admin/users")
        .json(&json!({
            "email": "nouvelle@concours.fr",
            "password": "court",
            "role": "Admin",
        }))
        .await;
    assert_eq!(response.status_code(), 400);
});

test_with_server!(plain_admin_cannot_provision, |server, ctx_state, config| {
    login_as_default_admin(&server).await;
    let response = server
        .post("/api/admin/users")
        .json(&json!({
            "email": "collegue@concours.fr",
            "password": "un-mot-de-passe-long",
            "role": "Admin",
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    // switch session to the plain admin
    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "collegue@concours.fr",
            "password": "un-mot-de-passe-long",
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .post("/api/admin/users")
        .json(&json!({
            "email": "autre@concours.fr",
            "password": "un-mot-de-passe-long",
            "role": "Admin",
        }))
        .await;
    assert_eq!(response.status_code(), 403);
});

test_with_server!(review_moves_status, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    let pending = seed_participation(
        &ctx_state,
        "Boulangerie Martin",
        vec!["Commerce"],
        ParticipationStatus::Pending,
    )
    .await;
    let id = pending.id.as_ref().unwrap().to_raw();

    let response = server
        .post(&format!("/api/admin/participations/{id}/approve"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.json::<Participation>().status,
        ParticipationStatus::Approved
    );

    let response = server
        .get("/api/admin/participations")
        .add_query_param("status", "Approved")
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Vec<Participation>>().len(), 1);

    let response = server
        .post(&format!("/api/admin/participations/{id}/reject"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.json::<Participation>().status,
        ParticipationStatus::Rejected
    );
});

test_with_server!(review_requires_login, |server, ctx_state, config| {
    let response = server.get("/api/admin/participations").await;
    assert_eq!(response.status_code(), 401);
});

test_with_server!(reconcile_backfills_directory_rows, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    // a credential without its directory row, as a crashed provisioning
    // would leave behind
    let ctx = test_ctx();
    let admins = AdminUserDbService {
        db: &ctx_state.db.client,
        ctx: &ctx,
    };
    admins
        .create_credential(AdminCredential {
            id: None,
            email: "orpheline@concours.fr".to_string(),
            password_hash: hash_password(TEST_ADMIN_PASSWORD).unwrap(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let response = server.post("/api/admin/users/reconcile").await;
    assert_eq!(response.status_code(), 200);
    let report = response.json::<serde_json::Value>();
    assert_eq!(report["backfilled"], json!(["orpheline@concours.fr"]));

    // running it again finds nothing to repair
    let response = server.post("/api/admin/users/reconcile").await;
    assert_eq!(response.status_code(), 200);
    let report = response.json::<serde_json::Value>();
    assert_eq!(report["backfilled"].as_array().unwrap().len(), 0);

    let users = server.get("/api/admin/users").await.json::<serde_json::Value>();
    let emails: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert!(emails.contains(&"orpheline@concours.fr"));
});

test_with_server!(deactivated_admin_is_locked_out, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    let response = server
        .post("/api/admin/users")
        .json(&json!({
            "email": "sortant@concours.fr",
            "password": "un-mot-de-passe-long",
            "role": "Admin",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let created = response.json::<serde_json::Value>();
    let id = created["id"].as_object().unwrap();
    let id = format!(
        "{}:{}",
        id["tb"].as_str().unwrap(),
        id["id"]["String"].as_str().unwrap()
    );

    let response = server
        .post(&format!("/api/admin/users/{id}/active"))
        .json(&json!({"active": false}))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": "sortant@concours.fr",
            "password": "un-mot-de-passe-long",
        }))
        .await;
    assert_eq!(response.status_code(), 403);
});
