use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use bodega_auth::{JwtClaims, Role};
use bodega_core::{CompanyId, PrincipalId};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Decimals serialize as JSON strings; compare by value, not formatting.
fn as_decimal(v: &serde_json::Value) -> Decimal {
    v.as_str().unwrap().parse().unwrap()
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Same router as prod, bound to an ephemeral port. DATABASE_URL is
        // unset in the test environment, so state is in-memory per server.
        let app = bodega_api::app::build_app(jwt_secret.to_string())
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, company_id: CompanyId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        company_id,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// Create a company and return a token scoped to it.
async fn onboard_company(srv: &TestServer, jwt_secret: &str, name: &str) -> (String, String) {
    // Company creation is authenticated but not company-scoped, so any valid
    // token will do for the bootstrap call.
    let bootstrap = mint_jwt(jwt_secret, CompanyId::new(), vec![Role::new("admin")]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/companies", srv.base_url))
        .bearer_auth(&bootstrap)
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let company_id = body["id"].as_str().unwrap().to_string();

    let token = mint_jwt(
        jwt_secret,
        company_id.parse().unwrap(),
        vec![Role::new("admin")],
    );
    (company_id, token)
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn("test-secret").await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn company_context_is_derived_from_token() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;

    let company_id = CompanyId::new();
    let token = mint_jwt(jwt_secret, company_id, vec![Role::new("admin")]);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["company_id"].as_str().unwrap(), company_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
}

#[tokio::test]
async fn inventory_lifecycle_create_variant_lot_query() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let (_company_id, token) = onboard_company(&srv, jwt_secret, "Acme Trading").await;
    let client = reqwest::Client::new();

    // Inventory
    let res = client
        .post(format!("{}/inventories", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Main warehouse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let inventory: serde_json::Value = res.json().await.unwrap();
    let inventory_id = inventory["id"].as_str().unwrap().to_string();

    // Storage
    let res = client
        .post(format!("{}/storages", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Dock A", "code": "DA" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let storage: serde_json::Value = res.json().await.unwrap();
    let storage_id = storage["id"].as_str().unwrap().to_string();

    // Variant
    let res = client
        .post(format!("{}/variants", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "inventory_id": inventory_id,
            "sku": "SKU-001",
            "name": "Blue widget",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let variant: serde_json::Value = res.json().await.unwrap();
    let variant_id = variant["id"].as_str().unwrap().to_string();

    // Duplicate SKU conflicts.
    let res = client
        .post(format!("{}/variants", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "inventory_id": inventory_id,
            "sku": "SKU-001",
            "name": "Another widget",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Lot, with the storage name joined into the response.
    let res = client
        .post(format!("{}/lots", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "variant_id": variant_id,
            "storage_id": storage_id,
            "lot_number": "LOT-2026-01",
            "quantity": "100",
            "unit_cost": "12.50",
            "manufactured_on": "2026-01-10",
            "expires_on": "2027-01-10",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let lot: serde_json::Value = res.json().await.unwrap();
    assert_eq!(lot["storage_name"].as_str().unwrap(), "Dock A");

    // Filtered listing.
    let res = client
        .get(format!(
            "{}/lots?variant_id={}",
            srv.base_url, variant_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let lots: serde_json::Value = res.json().await.unwrap();
    assert_eq!(lots.as_array().unwrap().len(), 1);

    // Malformed id is a 400, unknown id a 404.
    let res = client
        .get(format!("{}/variants/not-a-uuid", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/variants/{}", srv.base_url, CompanyId::new()))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn current_price_is_unique_per_variant_and_kind() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let (_company_id, token) = onboard_company(&srv, jwt_secret, "Acme Trading").await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/inventories", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Main" }))
        .send()
        .await
        .unwrap();
    let inventory: serde_json::Value = res.json().await.unwrap();

    let res = client
        .post(format!("{}/variants", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "inventory_id": inventory["id"],
            "sku": "SKU-001",
            "name": "Widget",
        }))
        .send()
        .await
        .unwrap();
    let variant: serde_json::Value = res.json().await.unwrap();
    let variant_id = variant["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/currencies", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "code": "EUR", "name": "Euro" }))
        .send()
        .await
        .unwrap();
    let currency: serde_json::Value = res.json().await.unwrap();
    let currency_id = currency["id"].as_str().unwrap().to_string();

    // Two current retail prices in sequence: the second demotes the first.
    let res = client
        .post(format!("{}/prices", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "variant_id": variant_id,
            "currency_id": currency_id,
            "kind": "retail",
            "amount": "9.99",
            "make_current": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let first: serde_json::Value = res.json().await.unwrap();

    let res = client
        .post(format!("{}/prices", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "variant_id": variant_id,
            "currency_id": currency_id,
            "kind": "retail",
            "amount": "10.99",
            "make_current": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!(
            "{}/prices?variant_id={}",
            srv.base_url, variant_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let prices: serde_json::Value = res.json().await.unwrap();
    let prices = prices.as_array().unwrap();
    assert_eq!(prices.len(), 2);
    let current: Vec<_> = prices
        .iter()
        .filter(|p| p["is_current"].as_bool().unwrap())
        .collect();
    assert_eq!(current.len(), 1);
    assert_eq!(as_decimal(&current[0]["amount"]), dec("10.99"));
    assert_eq!(current[0]["currency_code"].as_str().unwrap(), "EUR");

    // Promote the first price back via the dedicated route.
    let first_id = first["id"].as_str().unwrap();
    let res = client
        .post(format!("{}/prices/{}/current", srv.base_url, first_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let promoted: serde_json::Value = res.json().await.unwrap();
    assert!(promoted["is_current"].as_bool().unwrap());
}

#[tokio::test]
async fn currency_base_designation_and_conversion() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let (_company_id, token) = onboard_company(&srv, jwt_secret, "Acme Trading").await;
    let client = reqwest::Client::new();

    // First currency becomes base automatically.
    let res = client
        .post(format!("{}/currencies", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "code": "EUR", "name": "Euro" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let eur: serde_json::Value = res.json().await.unwrap();
    assert!(eur["is_base"].as_bool().unwrap());

    let res = client
        .post(format!("{}/currencies", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "code": "USD", "name": "US Dollar" }))
        .send()
        .await
        .unwrap();
    let usd: serde_json::Value = res.json().await.unwrap();
    assert!(!usd["is_base"].as_bool().unwrap());
    let usd_id = usd["id"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/currencies", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "code": "GBP", "name": "Pound Sterling" }))
        .send()
        .await
        .unwrap();
    let gbp: serde_json::Value = res.json().await.unwrap();
    let gbp_id = gbp["id"].as_str().unwrap().to_string();

    // The base currency cannot carry an exchange rate.
    let res = client
        .post(format!("{}/exchanges", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "currency_id": eur["id"],
            "rate": "1.0",
            "method": "multiply",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // 1 USD = 0.8 EUR, 1 GBP = 1.25 EUR.
    let res = client
        .post(format!("{}/exchanges", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "currency_id": usd_id,
            "rate": "0.8",
            "method": "multiply",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/exchanges", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "currency_id": gbp_id,
            "rate": "1.25",
            "method": "multiply",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Cross conversion goes through the base.
    let res = client
        .post(format!("{}/exchanges/convert", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "amount": "100",
            "from_currency_id": usd_id,
            "to_currency_id": gbp_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let outcome: serde_json::Value = res.json().await.unwrap();
    assert_eq!(as_decimal(&outcome["base_amount"]), dec("80"));
    assert_eq!(as_decimal(&outcome["converted"]), dec("64"));

    // Re-designating the base clears the old flag and drops the promoted
    // currency's exchange.
    let res = client
        .post(format!("{}/currencies/{}/base", srv.base_url, usd_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let promoted: serde_json::Value = res.json().await.unwrap();
    assert!(promoted["is_base"].as_bool().unwrap());

    let res = client
        .get(format!("{}/exchanges", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let exchanges: serde_json::Value = res.json().await.unwrap();
    assert_eq!(exchanges.as_array().unwrap().len(), 1);
    assert_eq!(
        exchanges[0]["currency_code"].as_str().unwrap(),
        "GBP"
    );
}

#[tokio::test]
async fn companies_are_isolated() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let (_acme_id, acme_token) = onboard_company(&srv, jwt_secret, "Acme").await;
    let (_globex_id, globex_token) = onboard_company(&srv, jwt_secret, "Globex").await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/inventories", srv.base_url))
        .bearer_auth(&acme_token)
        .json(&json!({ "name": "Acme main" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let inventory: serde_json::Value = res.json().await.unwrap();

    // Globex cannot see Acme's inventory, by id or in listings.
    let res = client
        .get(format!(
            "{}/inventories/{}",
            srv.base_url,
            inventory["id"].as_str().unwrap()
        ))
        .bearer_auth(&globex_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/inventories", srv.base_url))
        .bearer_auth(&globex_token)
        .send()
        .await
        .unwrap();
    let listed: serde_json::Value = res.json().await.unwrap();
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn validation_errors_are_bad_requests() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let (_company_id, token) = onboard_company(&srv, jwt_secret, "Acme").await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/inventories", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"].as_str().unwrap(), "validation_error");

    let res = client
        .post(format!("{}/currencies", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "code": "€", "name": "Euro" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
