use std::fmt;

use chrono::Utc;

use super::{ProbeDetail, ProbeRun};
use crate::{
    client::ShopClient,
    dto::auth::{LoginRequest, TokenInfo, extract_token, inspect_token},
    error::ProbeResult,
};

#[derive(Debug, Clone, Default)]
pub struct LoginDetail {
    pub token: Option<TokenInfo>,
    pub token_error: Option<String>,
}

pub async fn run(client: &ShopClient, request: &LoginRequest) -> ProbeResult<ProbeRun> {
    let report = client.login(request).await?;

    let mut detail = LoginDetail::default();
    if let Some(token) = report.json().and_then(extract_token) {
        match inspect_token(token) {
            Ok(info) => detail.token = Some(info),
            Err(err) => {
                tracing::warn!(error = %err, "login token could not be decoded");
                detail.token_error = Some(err.to_string());
            }
        }
    }

    Ok(ProbeRun {
        report,
        detail: ProbeDetail::Login(detail),
    })
}

impl fmt::Display for LoginDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(err) = &self.token_error {
            return writeln!(f, "token: undecodable ({err})");
        }
        let Some(info) = &self.token else {
            return writeln!(f, "token: none in response");
        };
        writeln!(f, "token ({:?}, signature not verified):", info.algorithm)?;
        if let Some(sub) = &info.claims.sub {
            writeln!(f, "  sub: {sub}")?;
        }
        if let Some(role) = &info.claims.role {
            writeln!(f, "  role: {role}")?;
        }
        match info.claims.expires_at() {
            Some(at) if info.claims.is_expired(Utc::now()) => writeln!(f, "  exp: {at} (expired)")?,
            Some(at) => writeln!(f, "  exp: {at}")?,
            None => writeln!(f, "  exp: none")?,
        }
        for (key, value) in &info.claims.extra {
            writeln!(f, "  {key}: {value}")?;
        }
        Ok(())
    }
}
