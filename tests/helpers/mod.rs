pub mod test_with_server;

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use concours_server::entities::category_entity::{Category, CategoryDbService};
use concours_server::entities::participation_entity::{
    Participation, ParticipationDbService, ParticipationStatus,
};
use concours_server::entities::period_entity::{Activity, PeriodDbService, PeriodWindow};
use concours_server::middleware::ctx::Ctx;
use concours_server::middleware::mw_ctx::CtxState;
use concours_server::services::admin_service::DEFAULT_ADMIN_EMAIL;

pub const TEST_ADMIN_PASSWORD: &str = "test-start-password";

#[allow(dead_code)]
pub fn test_ctx() -> Ctx {
    Ctx::new(Ok("test".to_string()), Uuid::new_v4())
}

#[allow(dead_code)]
pub async fn login_as_default_admin(server: &TestServer) {
    let response = server
        .post("/api/auth/login")
        .json(&json!({
            "email": DEFAULT_ADMIN_EMAIL,
            "password": TEST_ADMIN_PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Opens a one hour window around now for the given activity.
#[allow(dead_code)]
pub async fn open_period(ctx_state: &Arc<CtxState>, activity: Activity) {
    let ctx = test_ctx();
    let service = PeriodDbService {
        db: &ctx_state.db.client,
        ctx: &ctx,
    };
    let window = service
        .create(PeriodWindow {
            id: None,
            activity,
            start_at: Utc::now() - Duration::hours(1),
            end_at: Utc::now() + Duration::hours(1),
            active: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();
    service
        .activate(window.id.unwrap(), activity)
        .await
        .unwrap();
}

#[allow(dead_code)]
pub fn step_one_payload() -> serde_json::Value {
    json!({
        "establishment_name": "Boulangerie Martin",
        "candidate_surname": "Martin",
        "candidate_first_name": "Claire",
        "acting_capacity": "Gérante",
        "structure_name": "SARL Martin",
        "siret": "12345678900019",
        "naf_code": "1071C",
        "email": "claire@example.fr",
        "candidacy_consent": true,
    })
}

#[allow(dead_code)]
pub async fn create_draft(server: &TestServer) -> Participation {
    let response = server
        .post("/api/participations")
        .json(&step_one_payload())
        .await;
    assert_eq!(response.status_code(), 200);
    response.json::<Participation>()
}

#[allow(dead_code)]
pub async fn seed_category(ctx_state: &Arc<CtxState>, name: &str) -> Category {
    let ctx = test_ctx();
    CategoryDbService {
        db: &ctx_state.db.client,
        ctx: &ctx,
    }
    .create(Category {
        id: None,
        name: name.to_string(),
        description: None,
        display_order: 0,
        created_at: Utc::now(),
    })
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn seed_participation(
    ctx_state: &Arc<CtxState>,
    establishment_name: &str,
    categories: Vec<&str>,
    status: ParticipationStatus,
) -> Participation {
    let ctx = test_ctx();
    ParticipationDbService {
        db: &ctx_state.db.client,
        ctx: &ctx,
    }
    .create(Participation {
        id: None,
        establishment_name: establishment_name.to_string(),
        candidate_surname: "Martin".to_string(),
        candidate_first_name: "Claire".to_string(),
        acting_capacity: "Gérante".to_string(),
        structure_name: format!("SARL {establishment_name}"),
        commercial_name: None,
        siret: "12345678900019".to_string(),
        naf_code: "1071C".to_string(),
        email: format!(
            "{}@example.fr",
            establishment_name.to_lowercase().replace(' ', ".")
        ),
        phone: None,
        activity_description: Some("Artisan local".to_string()),
        clientele: None,
        products: None,
        communication_modes: None,
        strengths_weaknesses: None,
        digital_transition: None,
        disability_inclusion: None,
        disability_needs: None,
        disability_percentage: None,
        disability_support: None,
        participation_reasons: None,
        improvement_axes: None,
        selected_categories: categories.into_iter().map(String::from).collect(),
        video_url: None,
        fiscal_attestation_url: None,
        registry_extract_url: None,
        signature_url: None,
        candidacy_consent: true,
        diffusion_authorized: true,
        regulation_accepted: true,
        current_step: 5,
        completed: true,
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    })
    .await
    .unwrap()
}
