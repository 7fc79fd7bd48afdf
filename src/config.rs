use std::{env, time::Duration};

use reqwest::Url;

use crate::error::ProbeError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3004";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_PROXY_PORT: u16 = 5174;

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub login_input: Option<String>,
    pub login_password: Option<String>,
    pub proxy_host: String,
    pub proxy_port: u16,
    pub proxy_upstream: Url,
}

impl ProbeConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = parse_base_url(
            &env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        )?;
        let timeout = env::var("PROBE_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse::<u64>().ok())
            .map(timeout_from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let login_input = env::var("LOGIN_INPUT").ok().filter(|v| !v.is_empty());
        let login_password = env::var("LOGIN_PASSWORD").ok().filter(|v| !v.is_empty());
        let proxy_host = env::var("PROXY_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let proxy_port = env::var("PROXY_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PROXY_PORT);
        let proxy_upstream = match env::var("PROXY_UPSTREAM") {
            Ok(raw) => parse_base_url(&raw)?,
            Err(_) => base_url.clone(),
        };

        Ok(Self {
            base_url,
            timeout,
            login_input,
            login_password,
            proxy_host,
            proxy_port,
            proxy_upstream,
        })
    }

    /// Override the backend root. The proxy follows unless it had its own upstream.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ProbeError> {
        let base_url = parse_base_url(raw)?;
        if self.proxy_upstream == self.base_url {
            self.proxy_upstream = base_url.clone();
        }
        self.base_url = base_url;
        Ok(self)
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = timeout_from_secs(secs);
        self
    }
}

/// Clamp a timeout into the accepted 1..=60 second window.
pub fn timeout_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(1, 60))
}

/// Parse an absolute http(s) URL used as a backend root.
pub fn parse_base_url(raw: &str) -> Result<Url, ProbeError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ProbeError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ProbeError::InvalidUrl(format!(
                "{raw}: unsupported scheme {other}"
            )));
        }
    }
    if url.host_str().is_none() {
        return Err(ProbeError::InvalidUrl(format!("{raw}: missing host")));
    }
    // endpoints are joined relative to the base path
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
