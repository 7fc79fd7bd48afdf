use std::time::{Duration, Instant};

use reqwest::{Client, Method, Url, header::HeaderValue};
use serde::Serialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    config::ProbeConfig,
    dto::{auth::LoginRequest, sync::SyncPayload},
    error::{ProbeError, ProbeResult},
    response::{ProbeReport, ReportBody},
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct ShopClient {
    client: Client,
    base_url: Url,
}

impl ShopClient {
    pub fn new(base_url: Url, timeout: Duration) -> ProbeResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shop-probe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::Config(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ProbeConfig) -> ProbeResult<Self> {
        Self::new(config.base_url.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> ProbeResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProbeError::InvalidUrl(format!("{path}: {e}")))
    }

    pub async fn health(&self) -> ProbeResult<ProbeReport> {
        self.send::<()>("health", Method::GET, "/api/health", None)
            .await
    }

    pub async fn login(&self, request: &LoginRequest) -> ProbeResult<ProbeReport> {
        self.send("login", Method::POST, "/api/auth/login", Some(request))
            .await
    }

    pub async fn user_orders(&self, user_id: &str) -> ProbeResult<ProbeReport> {
        let path = format!("/api/orders/user/{}", segment(user_id)?);
        self.send::<()>("orders", Method::GET, &path, None).await
    }

    pub async fn fetch_sync(&self, user_id: &str) -> ProbeResult<ProbeReport> {
        let path = format!("/api/users/{}/sync", segment(user_id)?);
        self.send::<()>("sync-get", Method::GET, &path, None).await
    }

    pub async fn push_sync(
        &self,
        user_id: &str,
        payload: &SyncPayload,
    ) -> ProbeResult<ProbeReport> {
        let path = format!("/api/users/{}/sync", segment(user_id)?);
        self.send("sync-push", Method::POST, &path, Some(payload))
            .await
    }

    #[instrument(skip(self, body), fields(base = %self.base_url))]
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        probe: &str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ProbeResult<ProbeReport> {
        let url = self.endpoint(path)?;
        let request_id = Uuid::new_v4().to_string();
        let header_value = HeaderValue::from_str(&request_id)
            .map_err(|e| ProbeError::Internal(anyhow::anyhow!(e)))?;

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(REQUEST_ID_HEADER, header_value);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, %url, %request_id, "sending request");
        let started = Instant::now();
        let response = request.send().await.map_err(|err| {
            let err = ProbeError::from(err);
            warn!(%method, %url, error = %err, "request failed");
            err
        })?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let text = response.text().await.map_err(ProbeError::from)?;
        let elapsed = started.elapsed();

        if status.is_success() {
            debug!(status = %status, ms = %elapsed.as_millis(), "request finished");
        } else {
            warn!(status = %status, ms = %elapsed.as_millis(), "server returned an error status");
        }

        Ok(ProbeReport {
            probe: probe.to_string(),
            method: method.to_string(),
            url: url.to_string(),
            request_id,
            status: status.as_u16(),
            headers,
            body: ReportBody::from_text(text),
            elapsed,
        })
    }
}

/// Reject ids that would escape their path segment, including dot segments
/// that URL normalization would collapse.
fn segment(id: &str) -> ProbeResult<&str> {
    let id = id.trim();
    let dots_only = id.chars().all(|c| c == '.');
    if id.is_empty() || dots_only || id.contains(['/', '\\', '?', '#', '%']) {
        return Err(ProbeError::InvalidUrl(format!("invalid id {id:?}")));
    }
    Ok(id)
}
