use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection, EntityTrait};
use tower::ServiceExt;
use uuid::Uuid;

use ledger::{AccrualPolicy, Engine};
use migration::MigratorTrait;

async fn app() -> (Router, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    let router = server::app(engine, db.clone(), AccrualPolicy::default());
    (router, db)
}

fn basic(phone: &str, password: &str) -> String {
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(format!("{phone}:{password}"))
    )
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap()
}

async fn register(app: &Router, name: &str, phone: &str) -> serde_json::Value {
    register_with_code(app, name, phone, None).await
}

async fn register_with_code(
    app: &Router,
    name: &str,
    phone: &str,
    referral_code: Option<&str>,
) -> serde_json::Value {
    let response = send(
        app,
        post_json(
            "/register",
            None,
            serde_json::json!({
                "name": name,
                "phone": phone,
                "password": "password",
                "referral_code": referral_code,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn grant_admin(db: &DatabaseConnection, id: &str) {
    let model = ledger::account::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let mut active: ledger::account::ActiveModel = model.into();
    active.is_admin = ActiveValue::Set(true);
    active.update(db).await.unwrap();
}

#[tokio::test]
async fn register_returns_created_account() {
    let (app, _db) = app().await;

    let account = register(&app, "Asha", "9800000001").await;
    assert_eq!(account["deposit_wallet_minor"], 0);
    assert_eq!(account["withdrawal_wallet_minor"], 0);
    assert!(!account["referral_code"].as_str().unwrap().is_empty());

    // Same phone again conflicts.
    let response = send(
        &app,
        post_json(
            "/register",
            None,
            serde_json::json!({
                "name": "Imposter",
                "phone": "9800000001",
                "password": "password",
                "referral_code": null,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn wrong_credentials_are_rejected() {
    let (app, _db) = app().await;
    register(&app, "Asha", "9800000001").await;

    let response = send(&app, get("/account", &basic("9800000001", "wrong"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deposit_shows_up_in_account_snapshot() {
    let (app, _db) = app().await;
    register(&app, "Asha", "9800000001").await;
    let auth = basic("9800000001", "password");

    let response = send(
        &app,
        post_json(
            "/deposit",
            Some(&auth),
            serde_json::json!({ "amount_minor": 100000, "upi_reference": "upi-123" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["applied"], true);
    assert_eq!(result["deposit_wallet_minor"], 100000);
    assert_eq!(result["record"]["kind"], "deposit");

    let response = send(&app, get("/account", &auth)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let account = body_json(response).await;
    assert_eq!(account["deposit_wallet_minor"], 100000);
    assert_eq!(account["total_deposited_minor"], 100000);
}

#[tokio::test]
async fn purchase_and_sell_through_the_api() {
    let (app, _db) = app().await;
    register(&app, "Asha", "9800000001").await;
    let auth = basic("9800000001", "password");

    send(
        &app,
        post_json(
            "/deposit",
            Some(&auth),
            serde_json::json!({ "amount_minor": 100000, "upi_reference": null }),
        ),
    )
    .await;

    let response = send(&app, get("/products", &auth)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let products = body_json(response).await;
    let starter = products
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "Starter Plan")
        .unwrap();
    let product_id = starter["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        post_json(
            "/purchase",
            Some(&auth),
            serde_json::json!({ "product_id": product_id }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["applied"], true);
    assert_eq!(result["deposit_wallet_minor"], 50000);

    let response = send(&app, get("/account", &auth)).await;
    let account = body_json(response).await;
    let positions = account["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0]["active"], true);
    let position_id = positions[0]["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        post_json(
            "/sell",
            Some(&auth),
            serde_json::json!({ "position_id": position_id }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    // Starter Plan resale value goes to the withdrawal wallet.
    assert_eq!(result["withdrawal_wallet_minor"], 20000);
    assert_eq!(result["deposit_wallet_minor"], 50000);

    // An unknown product id is a lookup failure.
    let response = send(
        &app,
        post_json(
            "/purchase",
            Some(&auth),
            serde_json::json!({ "product_id": Uuid::new_v4() }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bounced_withdraw_is_ok_with_failed_record() {
    let (app, _db) = app().await;
    register(&app, "Asha", "9800000001").await;
    let auth = basic("9800000001", "password");

    let response = send(
        &app,
        post_json(
            "/withdraw",
            Some(&auth),
            serde_json::json!({ "amount_minor": 5000, "destination": null }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["applied"], false);
    assert_eq!(result["record"]["status"], "failed");
    assert_eq!(result["withdrawal_wallet_minor"], 0);
}

#[tokio::test]
async fn records_listing_and_csv_export() {
    let (app, _db) = app().await;
    register(&app, "Asha", "9800000001").await;
    let auth = basic("9800000001", "password");

    send(
        &app,
        post_json(
            "/deposit",
            Some(&auth),
            serde_json::json!({ "amount_minor": 100000, "upi_reference": "upi-123" }),
        ),
    )
    .await;
    send(
        &app,
        post_json(
            "/withdraw",
            Some(&auth),
            serde_json::json!({ "amount_minor": 500, "destination": null }),
        ),
    )
    .await;

    let response = send(&app, get("/records", &auth)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing = body_json(response).await;
    let records = listing["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    // Newest first: the bounced withdraw.
    assert_eq!(records[0]["kind"], "withdraw");
    assert_eq!(records[0]["status"], "failed");
    assert_eq!(records[1]["kind"], "deposit");
    assert_eq!(records[1]["detail"], "deposit via UPI upi-123");

    let response = send(&app, get("/records/export", &auth)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/csv"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(csv.starts_with("id,kind,status,amount_minor,occurred_at,detail"));
    assert!(csv.contains("deposit via UPI upi-123"));
}

#[tokio::test]
async fn admin_surface_requires_the_admin_flag() {
    let (app, db) = app().await;
    let user = register(&app, "Asha", "9800000001").await;
    let admin = register(&app, "Root", "9800000000").await;
    grant_admin(&db, admin["id"].as_str().unwrap()).await;

    let user_auth = basic("9800000001", "password");
    let admin_auth = basic("9800000000", "password");

    let response = send(&app, get("/admin/accounts", &user_auth)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, get("/admin/accounts", &admin_auth)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing = body_json(response).await;
    assert_eq!(listing["accounts"].as_array().unwrap().len(), 2);

    // Blocking locks the user out of authentication entirely.
    let response = send(
        &app,
        post_json(
            &format!("/admin/accounts/{}/block", user["id"].as_str().unwrap()),
            Some(&admin_auth),
            serde_json::json!({ "blocked": true }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, get("/account", &user_auth)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn referral_flow_through_the_api() {
    let (app, db) = app().await;
    let referrer = register(&app, "Asha", "9800000001").await;
    let referrer_code = referrer["referral_code"].as_str().unwrap().to_string();
    register_with_code(&app, "Ravi", "9800000002", Some(&referrer_code)).await;

    let admin = register(&app, "Root", "9800000000").await;
    grant_admin(&db, admin["id"].as_str().unwrap()).await;
    let admin_auth = basic("9800000000", "password");

    // First deposit by the referred account opens the pending entry.
    send(
        &app,
        post_json(
            "/deposit",
            Some(&basic("9800000002", "password")),
            serde_json::json!({ "amount_minor": 100000, "upi_reference": null }),
        ),
    )
    .await;

    let response = send(&app, get("/admin/referrals", &admin_auth)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing = body_json(response).await;
    let referrals = listing["referrals"].as_array().unwrap();
    assert_eq!(referrals.len(), 1);
    assert_eq!(referrals[0]["first_deposit_minor"], 100000);
    let referral_id = referrals[0]["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        post_json(
            &format!("/admin/referrals/{referral_id}/approve"),
            Some(&admin_auth),
            serde_json::json!({}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["record"]["kind"], "referral_bonus");
    assert_eq!(result["withdrawal_wallet_minor"], 10000);

    // Approving twice conflicts.
    let response = send(
        &app,
        post_json(
            &format!("/admin/referrals/{referral_id}/approve"),
            Some(&admin_auth),
            serde_json::json!({}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The referrer sees the standing on the summary endpoint.
    let response = send(&app, get("/referrals", &basic("9800000001", "password"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["approved"], 1);
    assert_eq!(summary["current_tier"]["bonus_percent"], 10);
}
