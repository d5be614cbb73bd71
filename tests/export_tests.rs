mod helpers;

use chrono::Utc;
use concours_server::entities::participation_entity::ParticipationStatus;
use concours_server::entities::vote_entity::{Vote, VoteDbService};
use helpers::{login_as_default_admin, seed_category, seed_participation, test_ctx};

test_with_server!(archive_holds_approved_dossiers_only, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    for name in ["Boulangerie Martin", "Garage Dupont", "Fleuriste Lea"] {
        seed_participation(
            &ctx_state,
            name,
            vec!["Commerce"],
            ParticipationStatus::Approved,
        )
        .await;
    }
    seed_participation(
        &ctx_state,
        "Cafe Durand",
        vec!["Commerce"],
        ParticipationStatus::Pending,
    )
    .await;
    seed_participation(
        &ctx_state,
        "Tabac Petit",
        vec!["Commerce"],
        ParticipationStatus::Rejected,
    )
    .await;

    let response = server.get("/api/admin/export/archive").await;
    assert_eq!(response.status_code(), 200);

    let bytes = response.as_bytes().to_vec();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();

    assert!(names.contains(&"resultats.csv".to_string()));
    let dossiers: Vec<&String> = names.iter().filter(|n| n.starts_with("dossiers/")).collect();
    assert_eq!(dossiers.len(), 3);
    assert!(dossiers.iter().all(|n| n.ends_with(".pdf")));
    assert!(dossiers.iter().any(|n| n.contains("Boulangerie_Martin")));
    assert!(!dossiers.iter().any(|n| n.contains("Cafe_Durand")));
});

test_with_server!(results_csv_lists_tallies, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    let category = seed_category(&ctx_state, "Commerce").await;
    let participation = seed_participation(
        &ctx_state,
        "Boulangerie Martin",
        vec!["Commerce"],
        ParticipationStatus::Approved,
    )
    .await;

    let ctx = test_ctx();
    let votes = VoteDbService {
        db: &ctx_state.db.client,
        ctx: &ctx,
    };
    let rows = (0..3)
        .map(|i| Vote {
            id: None,
            participation: participation.id.clone().unwrap(),
            category: category.id.clone().unwrap(),
            voter_email: format!("voter{i}@example.fr"),
            value: 1,
            created_at: Utc::now(),
        })
        .collect();
    votes.create_batch(rows).await.unwrap();

    let response = server.get("/api/admin/export/results.csv").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("categorie,etablissement,structure,voix"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("Commerce,Boulangerie Martin,SARL Boulangerie Martin"));
    assert!(row.ends_with(",3"));
});

test_with_server!(participations_csv_flattens_every_record, |server, ctx_state, config| {
    login_as_default_admin(&server).await;

    seed_participation(
        &ctx_state,
        "Boulangerie Martin",
        vec!["Commerce"],
        ParticipationStatus::Approved,
    )
    .await;
    seed_participation(
        &ctx_state,
        "Cafe Durand",
        vec!["Commerce"],
        ParticipationStatus::Pending,
    )
    .await;

    let response = server.get("/api/admin/export/participations.csv").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    let lines: Vec<&str> = body.lines().collect();
    // header plus one row per record, status notwithstanding
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,establishment_name,candidate_surname"));
    assert!(lines[0].ends_with(",status,created_at,updated_at"));
    assert!(body.contains("Boulangerie Martin"));
    assert!(body.contains("Cafe Durand"));
});

test_with_server!(exports_require_login, |server, ctx_state, config| {
    let response = server.get("/api/admin/export/archive").await;
    assert_eq!(response.status_code(), 401);
    let response = server.get("/api/admin/export/results.csv").await;
    assert_eq!(response.status_code(), 401);
    let response = server.get("/api/admin/export/participations.csv").await;
    assert_eq!(response.status_code(), 401);
});
