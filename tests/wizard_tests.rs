mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use concours_server::entities::participation_entity::{
    Participation, ParticipationDbService, ParticipationStatus,
};
use concours_server::entities::period_entity::Activity;
use helpers::{create_draft, open_period, seed_participation, step_one_payload};
use serde_json::json;

test_with_server!(create_rejected_outside_period, |server, ctx_state, config| {
    let response = server
        .post("/api/participations")
        .json(&step_one_payload())
        .await;
    assert_eq!(response.status_code(), 403);
});

test_with_server!(wizard_walks_all_five_steps, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Participation).await;

    let draft = create_draft(&server).await;
    assert_eq!(draft.current_step, 1);
    assert_eq!(draft.status, ParticipationStatus::Draft);
    let id = draft.id.unwrap().to_raw();

    let response = server
        .post(&format!("/api/participations/{id}/advance"))
        .json(&step_one_payload())
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Participation>().current_step, 2);

    // the narrative step has no required fields
    let response = server
        .post(&format!("/api/participations/{id}/advance"))
        .json(&json!({"activity_description": "Fournil au levain"}))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Participation>().current_step, 3);

    let response = server
        .post(&format!("/api/participations/{id}/advance"))
        .json(&json!({"selected_categories": ["Commerce"]}))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Participation>().current_step, 4);

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 2048])
            .file_name("presentation.mp4")
            .mime_type("video/mp4"),
    );
    let response = server
        .post(&format!("/api/participations/{id}/video"))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 200);
    let with_video = response.json::<Participation>();
    assert!(with_video.video_url.is_some());

    let response = server
        .post(&format!("/api/participations/{id}/advance"))
        .json(&json!({"diffusion_authorized": true, "regulation_accepted": true}))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Participation>().current_step, 5);

    let response = server
        .post(&format!("/api/participations/{id}/signature"))
        .json(&json!({"data_url": "data:image/png;base64,aGVsbG8="}))
        .await;
    assert_eq!(response.status_code(), 200);
    assert!(response.json::<Participation>().signature_url.is_some());

    // the last step is submitted, never advanced past
    let response = server
        .post(&format!("/api/participations/{id}/advance"))
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .post(&format!("/api/participations/{id}/submit"))
        .await;
    assert_eq!(response.status_code(), 200);
    let submitted = response.json::<Participation>();
    assert!(submitted.completed);
    assert_eq!(submitted.status, ParticipationStatus::Pending);

    let response = server
        .post(&format!("/api/participations/{id}/submit"))
        .await;
    assert_eq!(response.status_code(), 409);
});

test_with_server!(advance_blocks_on_missing_step_data, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Participation).await;

    let draft = create_draft(&server).await;
    let id = draft.id.unwrap().to_raw();

    // step 1 without consent
    let mut payload = step_one_payload();
    payload["candidacy_consent"] = json!(false);
    let response = server
        .post(&format!("/api/participations/{id}/advance"))
        .json(&payload)
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server.get(&format!("/api/participations/{id}")).await;
    assert_eq!(response.json::<Participation>().current_step, 1);
});

test_with_server!(retreat_only_moves_backward, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Participation).await;

    let draft = create_draft(&server).await;
    let id = draft.id.unwrap().to_raw();

    let response = server
        .post(&format!("/api/participations/{id}/retreat"))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .post(&format!("/api/participations/{id}/advance"))
        .json(&step_one_payload())
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server
        .post(&format!("/api/participations/{id}/retreat"))
        .await;
    assert_eq!(response.status_code(), 200);
    let record = response.json::<Participation>();
    assert_eq!(record.current_step, 1);
    // the data gathered so far stays untouched
    assert_eq!(record.establishment_name, "Boulangerie Martin");
});

test_with_server!(finalize_checks_last_step_only, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Participation).await;

    let draft = create_draft(&server).await;
    let id = draft.id.unwrap().to_raw();

    // no signature, no accepted regulation yet
    let response = server
        .post(&format!("/api/participations/{id}/submit"))
        .await;
    assert_eq!(response.status_code(), 400);
});

test_with_server!(finalize_ignores_earlier_step_fields, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Participation).await;

    // a step 5 record whose identity fields were blanked after the fact
    let ctx = helpers::test_ctx();
    let participations = ParticipationDbService {
        db: &ctx_state.db.client,
        ctx: &ctx,
    };
    let mut record = seed_participation(
        &ctx_state,
        "Boulangerie Martin",
        vec!["Commerce"],
        ParticipationStatus::Draft,
    )
    .await;
    record.completed = false;
    record.establishment_name = String::new();
    record.siret = String::new();
    record.video_url = Some("http://files/video.mp4".to_string());
    record.signature_url = Some("http://files/signature.png".to_string());
    let record = participations.update(record).await.unwrap();
    let id = record.id.unwrap().to_raw();

    let response = server
        .post(&format!("/api/participations/{id}/submit"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert!(response.json::<Participation>().completed);
});

test_with_server!(video_content_type_is_validated, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Participation).await;

    let draft = create_draft(&server).await;
    let id = draft.id.unwrap().to_raw();

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 128])
            .file_name("document.pdf")
            .mime_type("application/pdf"),
    );
    let response = server
        .post(&format!("/api/participations/{id}/video"))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server.get(&format!("/api/participations/{id}")).await;
    assert!(response.json::<Participation>().video_url.is_none());
});

test_with_server!(document_uploads_fill_their_fields, |server, ctx_state, config| {
    open_period(&ctx_state, Activity::Participation).await;

    let draft = create_draft(&server).await;
    let id = draft.id.unwrap().to_raw();

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"%PDF-1.4".to_vec())
            .file_name("attestation.pdf")
            .mime_type("application/pdf"),
    );
    let response = server
        .post(&format!(
            "/api/participations/{id}/documents/fiscal_attestation"
        ))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 200);
    let record = response.json::<Participation>();
    assert!(record.fiscal_attestation_url.is_some());
    assert!(record.registry_extract_url.is_none());

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"%PDF-1.4".to_vec())
            .file_name("kbis.pdf")
            .mime_type("application/pdf"),
    );
    let response = server
        .post(&format!("/api/participations/{id}/documents/unknown_kind"))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 400);
});

test_with_server!(get_unknown_participation_is_404, |server, ctx_state, config| {
    let response = server.get("/api/participations/participation:missing").await;
    assert_eq!(response.status_code(), 404);
});
