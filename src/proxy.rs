use std::time::Duration;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, HeaderName, Method, Request, Response, StatusCode, Uri},
    routing::any,
};
use reqwest::{Client, Url};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::{
    client::REQUEST_ID_HEADER,
    config::ProbeConfig,
    error::{ProbeError, ProbeResult},
    response::{ApiResponse, Meta},
};

pub const BODY_LIMIT: usize = 1024 * 1024;
pub const CONCURRENCY_LIMIT: usize = 100;

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

#[derive(Clone)]
pub struct ProxyState {
    client: Client,
    upstream: Url,
}

impl ProxyState {
    pub fn new(client: Client, upstream: Url) -> Self {
        Self { client, upstream }
    }

    pub fn from_config(config: &ProbeConfig) -> ProbeResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProbeError::Config(e.to_string()))?;
        Ok(Self::new(client, config.proxy_upstream.clone()))
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }
}

pub fn router(state: ProxyState) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "proxy_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id
            )
        })
        .on_response(|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
            tracing::info!(
                status = %response.status(),
                ms = %latency.as_millis(),
                "proxied"
            );
        });

    Router::new()
        .route("/api/{*path}", any(forward))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(ConcurrencyLimitLayer::new(CONCURRENCY_LIMIT))
        .with_state(state)
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Forwards `/api/*` from the front-end dev port to the backend.
async fn forward(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    mut headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response<Body>, ProbeError> {
    let body = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ProbeError::PayloadTooLarge(rejection.body_text()),
        _ => ProbeError::Transport(rejection.body_text()),
    })?;
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = state
        .upstream
        .join(path.trim_start_matches('/'))
        .map_err(|e| ProbeError::InvalidUrl(format!("{path}: {e}")))?;

    strip_hop_by_hop(&mut headers);

    tracing::debug!(%method, %target, "forwarding");
    let upstream = state
        .client
        .request(method, target)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|err| {
            let err = ProbeError::from(err);
            tracing::warn!(error = %err, "upstream unreachable");
            err
        })?;

    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);
    let bytes = upstream.bytes().await.map_err(ProbeError::from)?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}

/// Bind `PROXY_HOST:PROXY_PORT`. The host may be an IP or a name like `localhost`.
pub async fn bind(config: &ProbeConfig) -> std::io::Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((config.proxy_host.as_str(), config.proxy_port)).await
}

/// Bind the proxy and serve until Ctrl-C.
pub async fn serve(config: &ProbeConfig) -> anyhow::Result<()> {
    let state = ProxyState::from_config(config)?;
    let listener = bind(config).await?;
    tracing::info!(
        "proxying http://{} /api -> {}",
        listener.local_addr()?,
        state.upstream()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
        })
        .await?;

    Ok(())
}
