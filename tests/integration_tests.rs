use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use taxflow::config::AppConfig;
use taxflow::handlers;
use taxflow::models::{ComplexityLevel, Specialization, TaxProfessional};
use taxflow::services::notify::Notifier;
use taxflow::state::AppState;
use taxflow::store::Stores;

// ── Mock notifier ──

struct MockNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, client_id: &str, message: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((client_id.to_string(), message.to_string()));
        Ok(())
    }
}

// ── Helpers ──

fn pro(
    id: &str,
    specs: Vec<Specialization>,
    max: ComplexityLevel,
    cap: u32,
    rating: f64,
) -> TaxProfessional {
    TaxProfessional {
        id: id.to_string(),
        name: format!("Pro {id}"),
        specializations: specs,
        max_complexity: max,
        current_load: 0,
        max_daily_appointments: cap,
        available: true,
        rating,
    }
}

fn test_state() -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    let stores = Stores::new();
    stores.tax_pros.put(
        "tp-gen",
        pro(
            "tp-gen",
            vec![Specialization::Individual],
            ComplexityLevel::Moderate,
            8,
            4.2,
        ),
    );
    stores.tax_pros.put(
        "tp-crypto",
        pro(
            "tp-crypto",
            vec![
                Specialization::Individual,
                Specialization::Crypto,
                Specialization::Investments,
            ],
            ComplexityLevel::Expert,
            4,
            4.9,
        ),
    );

    let sent = Arc::new(Mutex::new(vec![]));
    let state = Arc::new(AppState {
        stores,
        config: AppConfig::default(),
        notifier: Box::new(MockNotifier {
            sent: Arc::clone(&sent),
        }),
    });
    (state, sent)
}

fn test_app() -> (Router, Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    let (state, sent) = test_state();
    (handlers::router(Arc::clone(&state)), state, sent)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    request(app, "GET", uri, None).await
}

async fn post(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    request(app, "POST", uri, Some(body)).await
}

/// Drive the intake script to completion and return (client_id, session_id).
async fn complete_intake(app: &Router, answers: &[&str]) -> (String, String) {
    let (status, started) = post(app, "/api/intake/start", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let client_id = started["client_id"].as_str().unwrap().to_string();
    let session_id = started["session_id"].as_str().unwrap().to_string();

    for answer in answers {
        let (status, _) = post(
            app,
            "/api/intake/respond",
            serde_json::json!({"session_id": session_id, "answer": answer}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    (client_id, session_id)
}

const CRYPTO_ANSWERS: [&str; 7] = [
    "Jordan Blake",
    "single",
    "0",
    "W-2 wages and stock investments",
    "charitable donations",
    "crypto trading on two exchanges",
    "nothing else",
];

// ── Tests ──

#[tokio::test]
async fn test_health() {
    let (app, _, _) = test_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tax_pros"], 2);
}

#[tokio::test]
async fn test_start_intake_advances_past_welcome() {
    let (app, _, _) = test_app();
    let (status, body) = post(&app, "/api/intake/start", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["prompt"].as_str().unwrap().contains("name"));
    assert_eq!(body["flow"]["current_stage"], "intake_questions");
}

#[tokio::test]
async fn test_intake_completion_reaches_summary_review() {
    let (app, _, _) = test_app();
    let (client_id, _) = complete_intake(&app, &CRYPTO_ANSWERS).await;

    let (status, flow) = get(&app, &format!("/api/flow/{client_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["current_stage"], "summary_review");
    assert_eq!(
        flow["completed_stages"],
        serde_json::json!(["welcome", "intake_questions"])
    );
}

#[tokio::test]
async fn test_crypto_client_scores_complex_and_requires_crypto() {
    let (app, _, _) = test_app();
    let (client_id, _) = complete_intake(&app, &CRYPTO_ANSWERS).await;

    let (status, body) = get(&app, &format!("/api/clients/{client_id}/complexity")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["score"].as_u64().unwrap() >= 51);
    let level = body["level"].as_str().unwrap();
    assert!(level == "complex" || level == "expert");
    assert!(body["required_specializations"]
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s == "crypto"));
}

#[tokio::test]
async fn test_routing_picks_crypto_specialist() {
    let (app, state, _) = test_app();
    let (client_id, _) = complete_intake(&app, &CRYPTO_ANSWERS).await;

    let (status, body) = post(
        &app,
        &format!("/api/clients/{client_id}/route"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], true);
    assert_eq!(body["tax_pro"]["id"], "tp-crypto");

    let client = state.stores.clients.get(&client_id).unwrap();
    assert_eq!(client.assigned_tax_pro.as_deref(), Some("tp-crypto"));
    assert_eq!(state.stores.tax_pros.get("tp-crypto").unwrap().current_load, 1);
}

#[tokio::test]
async fn test_routing_no_match_is_structured_not_error() {
    let (app, state, _) = test_app();
    let (client_id, _) = complete_intake(&app, &CRYPTO_ANSWERS).await;
    state
        .stores
        .tax_pros
        .update("tp-crypto", |p| p.available = false);

    let (status, body) = post(
        &app,
        &format!("/api/clients/{client_id}/route"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched"], false);
    assert!(body["message"].as_str().unwrap().contains("crypto"));
    assert_eq!(body["alternates"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_route_unknown_client_is_404() {
    let (app, _, _) = test_app();
    let (status, _) = post(&app, "/api/clients/ghost/route", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_routing_never_overbooks() {
    let (app, state, _) = test_app();

    // Two crypto clients, one remaining slot on the only crypto specialist
    let (first, _) = complete_intake(&app, &CRYPTO_ANSWERS).await;
    let (second, _) = complete_intake(&app, &CRYPTO_ANSWERS).await;
    state.stores.tax_pros.update("tp-crypto", |p| {
        p.current_load = p.max_daily_appointments - 1;
    });

    let first_uri = format!("/api/clients/{first}/route");
    let second_uri = format!("/api/clients/{second}/route");
    let (a, b) = tokio::join!(
        post(&app, &first_uri, serde_json::json!({})),
        post(&app, &second_uri, serde_json::json!({})),
    );

    let matched = [a.1["matched"].clone(), b.1["matched"].clone()]
        .iter()
        .filter(|m| **m == serde_json::json!(true))
        .count();
    assert_eq!(matched, 1, "exactly one routing call may win the last slot");

    let pro = state.stores.tax_pros.get("tp-crypto").unwrap();
    assert_eq!(pro.current_load, pro.max_daily_appointments);
}

#[tokio::test]
async fn test_estimate_rewards_completed_intake() {
    let (app, state, _) = test_app();
    let (client_id, _) = complete_intake(&app, &CRYPTO_ANSWERS).await;

    let (_, complete) = get(&app, &format!("/api/clients/{client_id}/estimate")).await;
    state
        .stores
        .clients
        .update(&client_id, |c| c.intake_completed = false);
    let (_, incomplete) = get(&app, &format!("/api/clients/{client_id}/estimate")).await;

    assert!(
        incomplete["duration_minutes"].as_u64().unwrap()
            >= complete["duration_minutes"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn test_advance_without_new_data_does_not_move() {
    let (app, _, _) = test_app();
    let (status, started) = post(&app, "/api/intake/start", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let client_id = started["client_id"].as_str().unwrap();

    // Intake is incomplete: advancing repeatedly stays on intake_questions
    for _ in 0..3 {
        let (status, flow) = post(
            &app,
            &format!("/api/flow/{client_id}/advance"),
            serde_json::json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(flow["current_stage"], "intake_questions");
        assert_eq!(flow["advanced"], false);
        assert_eq!(flow["blockers"][0], "intake questions are not finished");
    }
}

#[tokio::test]
async fn test_flow_endpoints_for_unknown_client_are_404() {
    let (app, _, _) = test_app();
    for uri in [
        "/api/flow/ghost",
        "/api/flow/ghost/progress",
        "/api/flow/ghost/next-action",
    ] {
        let (status, _) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_full_conversation_reaches_complete() {
    let (app, state, sent) = test_app();
    let (client_id, _) = complete_intake(&app, &CRYPTO_ANSWERS).await;

    // summary_review: viewing the summary records it as shown
    let (status, summary) = get(&app, &format!("/api/clients/{client_id}/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(summary["summary"].as_str().unwrap().contains("Jordan Blake"));

    // summary_confirmation
    let (status, flow) = post(
        &app,
        &format!("/api/flow/{client_id}/confirm-summary"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["current_stage"], "document_checklist");

    // document_checklist
    let (status, checklist) = post(
        &app,
        &format!("/api/clients/{client_id}/checklist"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(checklist["documents"]
        .as_array()
        .unwrap()
        .iter()
        .any(|d| d.as_str().unwrap().contains("crypto")));
    assert_eq!(checklist["flow"]["current_stage"], "availability_inquiry");

    // availability_inquiry
    let (status, flow) = post(
        &app,
        &format!("/api/flow/{client_id}/preferences"),
        serde_json::json!({
            "dates": ["2026-03-02", "2026-03-03"],
            "times": ["10:00", "14:00"],
            "appointment_type": "virtual",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["current_stage"], "taxpro_routing");

    // taxpro_routing
    let (status, routed) = post(
        &app,
        &format!("/api/clients/{client_id}/route"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(routed["matched"], true);
    let (_, flow) = get(&app, &format!("/api/flow/{client_id}")).await;
    assert_eq!(flow["current_stage"], "appointment_scheduling");

    // appointment_scheduling + reminders_setup
    let (status, booked) = post(
        &app,
        "/api/appointments",
        serde_json::json!({
            "client_id": client_id,
            "scheduled_time": "2026-03-02 10:00",
            "appointment_type": "virtual",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booked["booked"], true);
    assert_eq!(booked["flow"]["current_stage"], "complete");

    // Reminders exist and went through the notifier
    assert!(state.stores.reminders.len() >= 2);
    assert!(!sent.lock().unwrap().is_empty());

    let (_, progress) = get(&app, &format!("/api/flow/{client_id}/progress")).await;
    assert!(progress["display"].as_str().unwrap().contains("Progress: 100%"));
}

#[tokio::test]
async fn test_sync_backfills_directly_mutated_client() {
    let (app, state, _) = test_app();
    let (status, started) = post(&app, "/api/intake/start", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let client_id = started["client_id"].as_str().unwrap().to_string();

    // Simulate a direct API path that bypassed the conversation
    state
        .stores
        .clients
        .update(&client_id, |c| c.intake_completed = true);

    let (status, flow) = post(
        &app,
        &format!("/api/flow/{client_id}/sync"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flow["current_stage"], "summary_review");

    // Second sync with unchanged ground truth is a no-op
    let (_, again) = post(
        &app,
        &format!("/api/flow/{client_id}/sync"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(again["current_stage"], "summary_review");
    assert_eq!(again["completed_stages"], flow["completed_stages"]);
}

#[tokio::test]
async fn test_list_tax_pros_sorted() {
    let (app, _, _) = test_app();
    let (status, body) = get(&app, "/api/taxpros").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["tax_pros"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["tp-crypto", "tp-gen"]);
}

#[tokio::test]
async fn test_collect_document_moves_between_lists() {
    let (app, _, _) = test_app();
    let (client_id, _) = complete_intake(&app, &CRYPTO_ANSWERS).await;
    post(
        &app,
        &format!("/api/clients/{client_id}/checklist"),
        serde_json::json!({}),
    )
    .await;

    let (_, docs) = get(&app, &format!("/api/clients/{client_id}/documents")).await;
    let first = docs["pending"][0].as_str().unwrap().to_string();

    let (status, docs) = post(
        &app,
        &format!("/api/clients/{client_id}/documents/collect"),
        serde_json::json!({"document": first}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(docs["collected"]
        .as_array()
        .unwrap()
        .iter()
        .any(|d| d == &serde_json::json!(first)));
    assert!(!docs["pending"]
        .as_array()
        .unwrap()
        .iter()
        .any(|d| d == &serde_json::json!(first)));
}
