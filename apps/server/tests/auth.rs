use std::time::Duration;

use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::{rngs::OsRng, RngCore};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

use coinhub_server::{api::app_router, build_state, config::Config};

const PASSWORD: &str = "super-secret";

struct TestApp {
    router: Router,
    // Keeps the seed file alive for the duration of the test.
    _dir: TempDir,
}

fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

async fn build_test_app() -> TestApp {
    let dir = tempdir().unwrap();
    let password_hash = hash(PASSWORD);
    let seed = serde_json::json!({
        "tenants": [
            { "id": "tenant-a", "name": "Acme" },
            { "id": "tenant-b", "name": "Globex" }
        ],
        "clients": [{
            "client_id": "web",
            "client_secret": "client-secret",
            "secure_key": "secure-key",
            "tenant_id": "tenant-a"
        }],
        "users": [
            {
                "id": "u-alice",
                "tenant_id": "tenant-a",
                "username": "alice",
                "password_hash": password_hash,
                "permissions": ["coin_view"]
            },
            {
                "id": "u-bob",
                "tenant_id": "tenant-a",
                "username": "bob",
                "password_hash": password_hash,
                "permissions": []
            },
            {
                "id": "u-carol",
                "tenant_id": "tenant-a",
                "username": "carol",
                "password_hash": password_hash,
                "permissions": ["coin_view", "trader_view", "trader_create", "trader_update"]
            },
            {
                "id": "u-dave",
                "tenant_id": "tenant-b",
                "username": "dave",
                "password_hash": password_hash,
                "permissions": ["coin_view", "trader_view", "trader_create", "trader_update"]
            }
        ]
    });
    let seed_path = dir.path().join("seed.json");
    std::fs::write(&seed_path, seed.to_string()).unwrap();

    let mut secret_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut secret_bytes);

    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        client_id: "web".to_string(),
        secret_key: BASE64.encode(secret_bytes),
        seed_file: Some(seed_path),
        cors_allow: vec!["*".to_string()],
        request_timeout: Duration::from_secs(5),
        warm_up: false,
    };
    let state = build_state(&config).await.unwrap();
    TestApp {
        router: app_router(state, &config),
        _dir: dir,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn login(app: &TestApp, username: &str) -> serde_json::Value {
    let (status, body) = send(
        app,
        post_json(
            "/api/v1/auth/login",
            serde_json::json!({ "username": username, "password": PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn login_and_access_protected_route() {
    let app = build_test_app().await;

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/api/v1/exchanges")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            serde_json::json!({ "username": "alice", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/login",
            serde_json::json!({ "username": "nobody", "password": PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let pair = login(&app, "alice").await;
    assert_eq!(pair["token_type"], "Bearer");
    assert_eq!(pair["expires_in"], 3600);
    let token = pair["access_token"].as_str().unwrap();

    let (status, session) = send(&app, authed(Method::GET, "/api/v1/auth/session", token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["username"], "alice");
    assert_eq!(session["tenant_id"], "tenant-a");
    assert_eq!(session["timezone"], "Asia/Ho_Chi_Minh");
    assert_eq!(session["permissions"], serde_json::json!(["coin_view"]));

    let (status, exchanges) = send(&app, authed(Method::GET, "/api/v1/exchanges", token)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = exchanges
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(names.contains(&"binance"));
}

#[tokio::test]
async fn token_and_timezone_accepted_from_query() {
    let app = build_test_app().await;
    let pair = login(&app, "alice").await;
    let token = pair["access_token"].as_str().unwrap();

    let (status, session) = send(
        &app,
        Request::builder()
            .uri(format!(
                "/api/v1/auth/session?access_token={token}&timezone=Europe/Paris"
            ))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["timezone"], "Europe/Paris");

    let mut request = authed(Method::GET, "/api/v1/auth/session", token);
    request
        .headers_mut()
        .insert("timezone", "Mars/Olympus".parse().unwrap());
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_token_is_single_use() {
    let app = build_test_app().await;
    let pair = login(&app, "alice").await;
    let refresh = pair["refresh_token"].as_str().unwrap();
    let old_access = pair["access_token"].as_str().unwrap();

    let (status, renewed) = send(
        &app,
        post_json(
            "/api/v1/auth/refresh",
            serde_json::json!({ "refresh_token": refresh }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = renewed["access_token"].as_str().unwrap();
    assert_ne!(new_access, old_access);

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/refresh",
            serde_json::json!({ "refresh_token": refresh }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, authed(Method::GET, "/api/v1/auth/session", old_access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, authed(Method::GET, "/api/v1/auth/session", new_access)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn revoked_token_is_rejected() {
    let app = build_test_app().await;
    let pair = login(&app, "alice").await;
    let token = pair["access_token"].as_str().unwrap();

    let (status, _) = send(&app, authed(Method::POST, "/api/v1/auth/revoke", token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, authed(Method::GET, "/api/v1/auth/session", token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoke_all_invalidates_every_session() {
    let app = build_test_app().await;
    let first = login(&app, "alice").await;
    let second = login(&app, "alice").await;
    let first_token = first["access_token"].as_str().unwrap();
    let second_token = second["access_token"].as_str().unwrap();

    let (status, _) = send(
        &app,
        authed(Method::POST, "/api/v1/auth/revoke-all", first_token),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for token in [first_token, second_token] {
        let (status, _) = send(&app, authed(Method::GET, "/api/v1/auth/session", token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = send(
        &app,
        post_json(
            "/api/v1/auth/refresh",
            serde_json::json!({ "refresh_token": second["refresh_token"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let fresh = login(&app, "alice").await;
    let (status, _) = send(
        &app,
        authed(
            Method::GET,
            "/api/v1/auth/session",
            fresh["access_token"].as_str().unwrap(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let app = build_test_app().await;
    let pair = login(&app, "bob").await;
    let token = pair["access_token"].as_str().unwrap();

    let (status, body) = send(&app, authed(Method::GET, "/api/v1/exchanges", token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 403);
}

#[tokio::test]
async fn unknown_and_unsupported_exchanges_are_not_found() {
    let app = build_test_app().await;
    let pair = login(&app, "alice").await;
    let token = pair["access_token"].as_str().unwrap();

    for uri in [
        "/api/v1/exchanges/kraken/symbols",
        "/api/v1/exchanges/bybit/symbols",
    ] {
        let (status, _) = send(&app, authed(Method::GET, uri, token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn account_routes_require_a_trader() {
    let app = build_test_app().await;
    let pair = login(&app, "alice").await;
    let token = pair["access_token"].as_str().unwrap();

    let (status, body) = send(
        &app,
        authed(Method::GET, "/api/v1/exchanges/binance/balances", token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "trader_id is required");

    let (status, _) = send(
        &app,
        authed(
            Method::GET,
            "/api/v1/exchanges/binance/balances?trader_id=missing",
            token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn no_order_route_outside_the_session_guard() {
    let app = build_test_app().await;
    let order = serde_json::json!({
        "symbol": "BTC/USDT",
        "order_type": "market",
        "order_side": "buy",
        "amount": 0.1
    });

    let (status, _) = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/agent/exchanges/binance/orders?trader_id=a1")
            .header(header::CONTENT_TYPE, "application/json")
            .header(
                header::AUTHORIZATION,
                format!("Basic {}", BASE64.encode("web:client-secret")),
            )
            .body(Body::from(order.to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/exchanges/binance/orders?trader_id=a1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(order.to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn authed_json(method: Method, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn list_accounts(app: &TestApp, token: &str) -> serde_json::Value {
    let (status, ids) = send(app, authed(Method::GET, "/api/v1/trading-accounts", token)).await;
    assert_eq!(status, StatusCode::OK);
    ids
}

#[tokio::test]
async fn trading_accounts_are_managed_per_tenant() {
    let app = build_test_app().await;
    let carol = login(&app, "carol").await;
    let carol = carol["access_token"].as_str().unwrap();
    let dave = login(&app, "dave").await;
    let dave = dave["access_token"].as_str().unwrap();
    // No credentials, so the adapter never signs anything.
    let account = serde_json::json!({ "name": "Main", "exchange": "binance" });

    let (status, _) = send(
        &app,
        authed_json(
            Method::PUT,
            "/api/v1/trading-accounts/acc-1",
            carol,
            account.clone(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(list_accounts(&app, carol).await, serde_json::json!(["acc-1"]));
    assert_eq!(list_accounts(&app, dave).await, serde_json::json!([]));

    // To another tenant the id does not exist.
    let (status, _) = send(
        &app,
        authed_json(
            Method::PUT,
            "/api/v1/trading-accounts/acc-1",
            dave,
            account,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        authed_json(
            Method::PUT,
            "/api/v1/trading-accounts/acc-1/status",
            dave,
            serde_json::json!({ "data_status": "disable" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        authed(Method::DELETE, "/api/v1/trading-accounts/acc-1", dave),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(list_accounts(&app, carol).await, serde_json::json!(["acc-1"]));
}

#[tokio::test]
async fn account_changes_reach_the_exchange_routes() {
    let app = build_test_app().await;
    let pair = login(&app, "carol").await;
    let token = pair["access_token"].as_str().unwrap();
    let balances = "/api/v1/exchanges/binance/balances?trader_id=acc-1";

    let (status, _) = send(
        &app,
        authed_json(
            Method::PUT,
            "/api/v1/trading-accounts/acc-1",
            token,
            serde_json::json!({ "exchange": "binance", "data_status": "disable" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, authed(Method::GET, balances, token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Trader is disabled: acc-1");

    let (status, _) = send(
        &app,
        authed(Method::DELETE, "/api/v1/trading-accounts/acc-1", token),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, authed(Method::GET, balances, token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        authed(Method::DELETE, "/api/v1/trading-accounts/acc-1", token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trading_account_routes_check_permissions() {
    let app = build_test_app().await;
    let pair = login(&app, "alice").await;
    let token = pair["access_token"].as_str().unwrap();

    let (status, _) = send(&app, authed(Method::GET, "/api/v1/trading-accounts", token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        authed_json(
            Method::PUT,
            "/api/v1/trading-accounts/acc-9",
            token,
            serde_json::json!({ "exchange": "binance" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
