#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    routing::post,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use reqwest::Url;
use serde_json::json;
use shop_probe::{
    client::ShopClient,
    dto::{auth::LoginRequest, sync::SyncPayload},
    response::{ApiResponse, Meta},
};
use tokio::net::TcpListener;

pub const USER: &str = "alice";
pub const PASSWORD: &str = "secret";

#[derive(Clone, Default)]
pub struct MockState {
    pub sync: Arc<Mutex<HashMap<String, SyncPayload>>>,
    pub pushes: Arc<Mutex<Vec<SyncPayload>>>,
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: MockState,
}

impl MockBackend {
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("mock url")
    }

    pub fn client(&self) -> ShopClient {
        ShopClient::new(self.url(), Duration::from_secs(3)).expect("client")
    }
}

pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

/// A port nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

pub async fn spawn_backend() -> MockBackend {
    let state = MockState::default();
    state.sync.lock().unwrap().insert(
        "1".into(),
        serde_json::from_value(json!({
            "favorites": [{ "id": 7, "name": "Ferris Mug" }],
            "cart": [{ "id": 7, "quantity": 1 }],
            "version": 3
        }))
        .unwrap(),
    );

    let router = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/orders/user/{id}", get(user_orders))
        .route("/api/users/{id}/sync", get(get_sync).post(push_sync))
        .with_state(state.clone());

    MockBackend {
        addr: serve(router).await,
        state,
    }
}

/// A backend whose health check never answers within a short timeout.
pub async fn spawn_slow_backend(delay: Duration) -> SocketAddr {
    let router = Router::new().route(
        "/api/health",
        get(move || async move {
            tokio::time::sleep(delay).await;
            "late"
        }),
    );
    serve(router).await
}

async fn health(headers: HeaderMap) -> Response {
    let mut response = Json(ApiResponse::success(
        "Health check",
        json!({ "status": "ok" }),
        Some(Meta::empty()),
    ))
    .into_response();
    if let Some(request_id) = headers.get("x-request-id") {
        response
            .headers_mut()
            .insert("x-request-id", request_id.clone());
    }
    response
}

pub fn issue_token(sub: &str, role: &str) -> String {
    let claims = json!({
        "sub": sub,
        "role": role,
        "exp": 4_102_444_800_i64,
        "email": "alice@example.com",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"mock-secret"),
    )
    .expect("encode token")
}

async fn login(Json(request): Json<LoginRequest>) -> Response {
    if request.login_input == USER && request.password == PASSWORD {
        let token = issue_token("1", "user");
        Json(ApiResponse::success(
            "Logged in",
            json!({ "token": format!("Bearer {token}") }),
            Some(Meta::empty()),
        ))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response()
    }
}

async fn user_orders(Path(id): Path<String>) -> Response {
    if id != "1" {
        return (StatusCode::NOT_FOUND, format!("Cannot GET /api/orders/user/{id}")).into_response();
    }
    Json(json!({
        "data": [
            {
                "id": 1,
                "user_id": 1,
                "items": "[{\"id\":7,\"quantity\":2},{\"id\":9,\"quantity\":1}]",
                "total_amount": "39.80",
                "status": "pending"
            },
            {
                "id": 2,
                "user_id": 1,
                "items": "7x2",
                "total_amount": 12,
                "status": "lost",
                "coupon": null
            }
        ]
    }))
    .into_response()
}

async fn get_sync(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    match state.sync.lock().unwrap().get(&id) {
        Some(payload) => Json(json!({ "data": payload })).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "no sync state" }))).into_response(),
    }
}

async fn push_sync(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(payload): Json<SyncPayload>,
) -> Response {
    state.pushes.lock().unwrap().push(payload.clone());

    let mut store = state.sync.lock().unwrap();
    let current = store.get(&id).map(|p| p.version).unwrap_or(0);
    if payload.version <= current {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "message": "version conflict", "version": current })),
        )
            .into_response();
    }
    store.insert(id, payload.clone());
    Json(json!({ "data": payload })).into_response()
}
