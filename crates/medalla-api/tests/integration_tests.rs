//! # Integration Tests for medalla-api
//!
//! Drives the full router (auth, rate limiting, metrics layers included)
//! through `tower::ServiceExt::oneshot`: CRUD contracts, the rental stock
//! cycle, the customer CRM view, partner search, events and auth.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use medalla_api::state::{AppConfig, AppState};

const TOKEN: &str = "s3cret";

/// Helper: app with auth disabled (every caller is admin).
fn test_app() -> (AppState, axum::Router) {
    let state = AppState::new();
    (state.clone(), medalla_api::app(state))
}

/// Helper: app with auth enabled.
fn test_app_with_auth() -> axum::Router {
    let config = AppConfig {
        auth_token: Some(TOKEN.to_string()),
        metrics_enabled: false,
        ..AppConfig::default()
    };
    medalla_api::app(AppState::with_config(config, None))
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("Authorization", auth);
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
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn create(app: &axum::Router, uri: &str, body: Value) -> Value {
    let (status, value) = send(app, "POST", uri, Some(body), None).await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri}: {value}");
    value
}

async fn keg_stock(app: &axum::Router, keg_id: &str) -> i64 {
    let (_, kegs) = send(app, "GET", "/api/kegs/all", None, None).await;
    kegs.as_array()
        .unwrap()
        .iter()
        .find(|k| k["id"] == keg_id)
        .map(|k| k["stock"].as_i64().unwrap())
        .unwrap()
}

async fn set_status(app: &axum::Router, rental_id: &str, status: &str) -> Value {
    let (code, body) = send(
        app,
        "PUT",
        &format!("/api/rentals/{rental_id}"),
        Some(json!({ "status": status })),
        None,
    )
    .await;
    assert_eq!(code, StatusCode::OK, "{body}");
    body
}

// -- Plumbing -----------------------------------------------------------------

#[tokio::test]
async fn test_root_banner() {
    let (_, app) = test_app();
    let (status, body) = send(&app, "GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Medalla API is running");
}

#[tokio::test]
async fn test_health_probes() {
    let (_, app) = test_app();
    let (status, body) = send(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!((status, body), (StatusCode::OK, json!("ok")));
    let (status, body) = send(&app, "GET", "/health/readiness", None, None).await;
    assert_eq!((status, body), (StatusCode::OK, json!("ready")));
}

#[tokio::test]
async fn test_metrics_disabled_is_404() {
    let (_, app) = test_app();
    let (status, _) = send(&app, "GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_json() {
    let (_, app) = test_app();
    let (status, body) = send(&app, "GET", "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/rentals"].is_object());
}

// -- CRUD contract ------------------------------------------------------------

#[tokio::test]
async fn test_keg_crud_contract() {
    let (_, app) = test_app();
    let created = create(&app, "/api/kegs", json!({"size": "20 Litros", "stock": 50, "serves": "80 pintas"})).await;
    let id = created["id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
    assert_eq!(created["stock"], 50);

    let uri = format!("/api/kegs/{id}");
    let payload = json!({"ideal": "Cumpleaños", "price": "$25.000"});
    let (status, first) = send(&app, "PUT", &uri, Some(payload.clone()), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(&app, "PUT", &uri, Some(payload), None).await;
    for field in ["id", "size", "serves", "ideal", "price", "stock", "is_active", "created_at"] {
        assert_eq!(first[field], second[field], "{field}");
    }

    let (status, _) = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, all) = send(&app, "GET", "/api/kegs/all", None, None).await;
    assert!(all.as_array().unwrap().is_empty());
    let (status, _) = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_and_malformed_bodies() {
    let (_, app) = test_app();
    let (status, body) = send(&app, "POST", "/api/kegs", Some(json!({"size": ""})), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app, "POST", "/api/kegs", Some(json!({"stock": 3})), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// -- Rentals & stock ------------------------------------------------------------

#[tokio::test]
async fn test_rental_create_decrements_stock() {
    let (_, app) = test_app();
    let keg = create(&app, "/api/kegs", json!({"size": "30 Litros", "stock": 35})).await;
    let beer = create(&app, "/api/beers", json!({"name": "RED IPA"})).await;
    let keg_id = keg["id"].as_str().unwrap();

    let rental = create(
        &app,
        "/api/rentals",
        json!({
            "customer_name": "Lucía",
            "contact": "3564 555123",
            "items": [
                {"keg_id": keg_id, "beer_id": beer["id"], "quantity": 2},
                {"keg_id": keg_id, "quantity": 1}
            ],
            "amount": 60000
        }),
    )
    .await;

    assert_eq!(keg_stock(&app, keg_id).await, 32);
    assert_eq!(rental["status"], "Reservado");
    assert_eq!(rental["payment_method"], "Efectivo");
    assert_eq!(rental["items"][0]["keg"]["size"], "30 Litros");
    assert_eq!(rental["items"][0]["beer"]["name"], "RED IPA");
    assert!(rental["items"][1]["beer"].is_null());
}

#[tokio::test]
async fn test_full_cycle_restores_stock() {
    let (_, app) = test_app();
    let keg = create(&app, "/api/kegs", json!({"size": "50 Litros", "stock": 20})).await;
    let keg_id = keg["id"].as_str().unwrap();
    let rental = create(
        &app,
        "/api/rentals",
        json!({"customer_name": "Club Atlético", "items": [{"keg_id": keg_id, "quantity": 4}]}),
    )
    .await;
    let rental_id = rental["id"].as_str().unwrap();
    assert_eq!(keg_stock(&app, keg_id).await, 16);

    let picked = set_status(&app, rental_id, "Retirado").await;
    assert!(picked["return_date"].is_null());
    assert_eq!(keg_stock(&app, keg_id).await, 16);

    let returned = set_status(&app, rental_id, "Devuelto").await;
    assert!(returned["return_date"].is_string());
    assert_eq!(keg_stock(&app, keg_id).await, 20);

    // Marking it returned again must not restore twice.
    set_status(&app, rental_id, "Devuelto").await;
    assert_eq!(keg_stock(&app, keg_id).await, 20);
}

#[tokio::test]
async fn test_return_uses_requested_date() {
    let (_, app) = test_app();
    let keg = create(&app, "/api/kegs", json!({"size": "10 Litros", "stock": 5})).await;
    let rental = create(
        &app,
        "/api/rentals",
        json!({"customer_name": "Ana", "status": "Retirado", "items": [{"keg_id": keg["id"], "quantity": 1}]}),
    )
    .await;
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/rentals/{}", rental["id"].as_str().unwrap()),
        Some(json!({"status": "Devuelto", "return_date": "2026-03-10T18:00:00Z"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["return_date"], "2026-03-10T18:00:00Z");
}

#[tokio::test]
async fn test_reverting_a_return_withdraws_stock() {
    let (_, app) = test_app();
    let keg = create(&app, "/api/kegs", json!({"size": "20 Litros", "stock": 1})).await;
    let keg_id = keg["id"].as_str().unwrap();
    let rental = create(
        &app,
        "/api/rentals",
        json!({"customer_name": "Bar Norte", "items": [{"keg_id": keg_id, "quantity": 1}]}),
    )
    .await;
    let rental_id = rental["id"].as_str().unwrap();
    set_status(&app, rental_id, "Devuelto").await;
    assert_eq!(keg_stock(&app, keg_id).await, 1);

    // Someone else takes the last keg, then the return is reverted.
    create(
        &app,
        "/api/rentals",
        json!({"customer_name": "Otro", "items": [{"keg_id": keg_id, "quantity": 1}]}),
    )
    .await;
    let reverted = set_status(&app, rental_id, "Retirado").await;
    assert!(reverted["return_date"].is_null());
    assert_eq!(keg_stock(&app, keg_id).await, -1);
}

#[tokio::test]
async fn test_insufficient_stock_is_409_and_atomic() {
    let (_, app) = test_app();
    let small = create(&app, "/api/kegs", json!({"size": "10 Litros", "stock": 10})).await;
    let large = create(&app, "/api/kegs", json!({"size": "50 Litros", "stock": 1})).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/rentals",
        Some(json!({
            "customer_name": "Fiesta",
            "items": [
                {"keg_id": small["id"], "quantity": 3},
                {"keg_id": large["id"], "quantity": 1},
                {"keg_id": large["id"], "quantity": 1}
            ]
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_STOCK");
    assert!(body["error"]["message"].as_str().unwrap().contains("50 Litros"));
    assert_eq!(body["error"]["details"]["requested"], 2);
    assert_eq!(keg_stock(&app, small["id"].as_str().unwrap()).await, 10);

    let (_, rentals) = send(&app, "GET", "/api/rentals", None, None).await;
    assert!(rentals.as_array().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_rentals_never_oversell() {
    let (state, app) = test_app();
    let keg = create(&app, "/api/kegs", json!({"size": "50 Litros", "stock": 5})).await;
    let keg_id = keg["id"].as_str().unwrap().to_string();

    let mut tasks = Vec::new();
    for i in 0..40 {
        let app = app.clone();
        let body = json!({
            "customer_name": format!("Cliente {i}"),
            "items": [{"keg_id": keg_id, "quantity": 1}]
        });
        tasks.push(tokio::spawn(async move {
            send(&app, "POST", "/api/rentals", Some(body), None).await.0
        }));
    }
    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => {}
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, 5);
    assert_eq!(state.rentals.len(), 5);
    assert_eq!(keg_stock(&app, &keg_id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_returns_restore_once() {
    let (_, app) = test_app();
    let keg = create(&app, "/api/kegs", json!({"size": "20 Litros", "stock": 10})).await;
    let keg_id = keg["id"].as_str().unwrap().to_string();
    let rental = create(
        &app,
        "/api/rentals",
        json!({"customer_name": "Peña", "status": "Retirado", "items": [{"keg_id": keg_id, "quantity": 3}]}),
    )
    .await;
    let uri = format!("/api/rentals/{}", rental["id"].as_str().unwrap());
    assert_eq!(keg_stock(&app, &keg_id).await, 7);

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let app = app.clone();
        let uri = uri.clone();
        tasks.push(tokio::spawn(async move {
            send(&app, "PUT", &uri, Some(json!({"status": "Devuelto"})), None).await.0
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(keg_stock(&app, &keg_id).await, 10);
}

#[tokio::test]
async fn test_stock_ceiling_blocks_overflowing_return() {
    let (_, app) = test_app();
    let keg = create(&app, "/api/kegs", json!({"size": "10 Litros", "stock": 5})).await;
    let keg_id = keg["id"].as_str().unwrap();
    let keg_uri = format!("/api/kegs/{keg_id}");
    let rental = create(
        &app,
        "/api/rentals",
        json!({"customer_name": "Ana", "items": [{"keg_id": keg_id, "quantity": 1}]}),
    )
    .await;
    let rental_id = rental["id"].as_str().unwrap();

    let (status, _) = send(&app, "PUT", &keg_uri, Some(json!({"stock": i64::MAX})), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(keg_stock(&app, keg_id).await, 4);

    let ceiling = i64::from(i32::MAX);
    let (status, _) = send(&app, "PUT", &keg_uri, Some(json!({"stock": ceiling})), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/rentals/{rental_id}"),
        Some(json!({"status": "Devuelto"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(keg_stock(&app, keg_id).await, ceiling);

    let (_, rentals) = send(&app, "GET", "/api/rentals", None, None).await;
    assert_eq!(rentals[0]["status"], "Reservado");
    assert!(rentals[0]["return_date"].is_null());
}

#[tokio::test]
async fn test_legacy_id_numbering_ceiling() {
    let (_, app) = test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/beers",
        Some(json!({"name": "A", "legacy_id": i64::MAX})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    create(&app, "/api/beers", json!({"name": "A", "legacy_id": i32::MAX})).await;
    let (status, body) = send(&app, "POST", "/api/beers", Some(json!({"name": "B"})), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (_, beers) = send(&app, "GET", "/api/beers", None, None).await;
    assert_eq!(beers.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rental_rejections() {
    let (_, app) = test_app();
    let keg = create(&app, "/api/kegs", json!({"size": "10 Litros", "stock": 10})).await;
    let cases = [
        json!({"customer_name": "X", "items": [{"keg_id": uuid::Uuid::new_v4(), "quantity": 1}]}),
        json!({"customer_name": "X", "items": [{"keg_id": keg["id"], "quantity": 1, "beer_id": uuid::Uuid::new_v4()}]}),
        json!({"customer_name": "X", "status": "Devuelto", "items": [{"keg_id": keg["id"], "quantity": 1}]}),
        json!({"customer_name": "X", "payment_method": "Cheque", "items": [{"keg_id": keg["id"], "quantity": 1}]}),
        json!({"customer_name": "X", "items": []}),
    ];
    for body in cases {
        let (status, _) = send(&app, "POST", "/api/rentals", Some(body.clone()), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    }
    assert_eq!(keg_stock(&app, keg["id"].as_str().unwrap()).await, 10);
}

#[tokio::test]
async fn test_rental_update_ignores_items_and_delete_keeps_stock() {
    let (_, app) = test_app();
    let keg = create(&app, "/api/kegs", json!({"size": "20 Litros", "stock": 5})).await;
    let keg_id = keg["id"].as_str().unwrap();
    let rental = create(
        &app,
        "/api/rentals",
        json!({"customer_name": "Ana", "items": [{"keg_id": keg_id, "quantity": 2}]}),
    )
    .await;
    let uri = format!("/api/rentals/{}", rental["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(json!({"is_paid": true, "payment_method": "Transferencia", "items": []})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_paid"], true);
    assert_eq!(body["payment_method"], "Transferencia");
    assert_eq!(body["items"][0]["quantity"], 2);

    let (status, _) = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(keg_stock(&app, keg_id).await, 3);
    let (status, _) = send(&app, "DELETE", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Customers ------------------------------------------------------------------

#[tokio::test]
async fn test_rental_upserts_customer_and_history() {
    let (state, app) = test_app();
    let keg = create(&app, "/api/kegs", json!({"size": "20 Litros", "stock": 10})).await;
    for (amount, pickup) in [(10000, "2026-03-01T12:00:00Z"), (15000, "2026-03-08T12:00:00Z")] {
        create(
            &app,
            "/api/rentals",
            json!({
                "customer_name": "Martín",
                "contact": "3564 400400",
                "pickup_date": pickup,
                "amount": amount,
                "items": [{"keg_id": keg["id"], "quantity": 1}]
            }),
        )
        .await;
    }
    assert_eq!(state.customers.len(), 1);

    let (status, customers) = send(&app, "GET", "/api/customers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let customer = &customers[0];
    assert_eq!(customer["phone"], "3564 400400");
    assert_eq!(customer["total_rentals"], 2);
    assert_eq!(customer["total_spent"], 25000.0);

    let id = customer["id"].as_str().unwrap();
    let (status, history) = send(&app, "GET", &format!("/api/customers/{id}/history"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let pickups: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["pickup_date"].as_str().unwrap())
        .collect();
    assert_eq!(pickups, vec!["2026-03-08T12:00:00Z", "2026-03-01T12:00:00Z"]);
    assert_eq!(history[0]["items"][0]["keg"]["size"], "20 Litros");
}

#[tokio::test]
async fn test_customer_phone_is_unique() {
    let (_, app) = test_app();
    let first = create(&app, "/api/customers", json!({"name": "Ana", "phone": "3564 111"})).await;
    let other = create(&app, "/api/customers", json!({"name": "Beto", "phone": "3564 222"})).await;

    let (status, _) = send(&app, "POST", "/api/customers", Some(json!({"name": "Ana B", "phone": "3564 111"})), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/customers/{}", other["id"].as_str().unwrap()),
        Some(json!({"phone": "3564 111"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/api/customers/{}", first["id"].as_str().unwrap()),
        Some(json!({"email": "ana@example.com", "phone": "3564 111"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["email"], "ana@example.com");
}

// -- Partners & events ------------------------------------------------------------

#[tokio::test]
async fn test_partners_near() {
    let (_, app) = test_app();
    create(&app, "/api/partners", json!({"name": "Lejos", "type": "Bar", "location": {"lat": -34.60, "lng": -58.38}})).await;
    create(&app, "/api/partners", json!({"name": "Cerca", "type": "Almacén", "location": {"lat": -31.43, "lng": -62.09}})).await;
    create(&app, "/api/partners", json!({"name": "Más cerca", "type": "Bar", "location": {"lat": -31.428, "lng": -62.083}})).await;

    let (status, found) = send(&app, "GET", "/api/partners/near?lat=-31.428&lng=-62.082&dist=10", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = found.as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Más cerca", "Cerca"]);

    let (status, _) = send(&app, "GET", "/api/partners/near?dist=10", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/partners",
        Some(json!({"name": "X", "type": "Bar", "location": {"lat": -31.4, "lng": 200.0}})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_upcoming_events() {
    let (_, app) = test_app();
    let now = chrono::Utc::now();
    for (title, days) in [("Pasado", -3), ("Lejano", 40), ("Próximo", 4)] {
        create(
            &app,
            "/api/events",
            json!({"title": title, "date": now + chrono::Duration::days(days)}),
        )
        .await;
    }
    let (_, upcoming) = send(&app, "GET", "/api/events", None, None).await;
    let titles: Vec<&str> = upcoming.as_array().unwrap().iter().map(|e| e["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Próximo", "Lejano"]);

    let (_, all) = send(&app, "GET", "/api/events/all", None, None).await;
    let titles: Vec<&str> = all.as_array().unwrap().iter().map(|e| e["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Lejano", "Próximo", "Pasado"]);
}

// -- Auth ---------------------------------------------------------------------------

#[tokio::test]
async fn test_public_reads_without_token() {
    let app = test_app_with_auth();
    for uri in ["/api/beers", "/api/kegs", "/api/partners", "/api/events"] {
        let (status, _) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = test_app_with_auth();
    for uri in ["/api/rentals", "/api/customers", "/api/kegs/all", "/api/events/all", "/api/partners/all"] {
        let (status, _) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
    let (status, _) = send(&app, "POST", "/api/kegs", Some(json!({"size": "5 Litros"})), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let bearer = format!("Bearer {TOKEN}");
    let (status, _) = send(&app, "GET", "/api/rentals", None, Some(&bearer)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/api/beers", None, Some("Bearer wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_editor_can_write_but_not_delete() {
    let app = test_app_with_auth();
    let editor = format!("Bearer editor:{TOKEN}");
    let admin = format!("Bearer admin:{TOKEN}");
    let (status, keg) = send(&app, "POST", "/api/kegs", Some(json!({"size": "5 Litros"})), Some(&editor)).await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/kegs/{}", keg["id"].as_str().unwrap());
    let (status, body) = send(&app, "DELETE", &uri, None, Some(&editor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    let (status, _) = send(&app, "DELETE", &uri, None, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit() {
    let config = AppConfig {
        metrics_enabled: false,
        rate_limit_per_minute: 2,
        ..AppConfig::default()
    };
    let app = medalla_api::app(AppState::with_config(config, None));
    for _ in 0..2 {
        let (status, _) = send(&app, "GET", "/api/beers", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&app, "GET", "/api/beers", None, None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
    // Probes are outside the limiter.
    let (status, _) = send(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
