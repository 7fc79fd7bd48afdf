use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, decode_header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProbeError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login_input: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(login_input: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login_input: login_input.into(),
            password: password.into(),
        }
    }
}

/// Claims carried by a login token. Only the common ones are named.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenClaims {
    pub sub: Option<Value>,
    pub role: Option<String>,
    pub exp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }
}

const TOKEN_KEYS: [&str; 3] = ["token", "accessToken", "access_token"];

/// Find a token in a login response body, at the top level or under `data`.
pub fn extract_token(body: &Value) -> Option<&str> {
    fn lookup(value: &Value) -> Option<&str> {
        TOKEN_KEYS
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
    }
    lookup(body)
        .or_else(|| body.get("data").and_then(lookup))
        .map(strip_bearer)
}

pub fn strip_bearer(token: &str) -> &str {
    token
        .trim()
        .strip_prefix("Bearer ")
        .unwrap_or(token)
        .trim()
}

/// A token's header algorithm plus its claims.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub algorithm: Algorithm,
    pub claims: TokenClaims,
}

/// Decode a JWT's header and claims for display. The signature is NOT verified.
pub fn inspect_token(token: &str) -> Result<TokenInfo, ProbeError> {
    let token = strip_bearer(token);
    let header = decode_header(token).map_err(|e| ProbeError::Token(e.to_string()))?;

    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ProbeError::Token("missing payload segment".into()))?;
    let raw = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ProbeError::Token(e.to_string()))?;
    let claims = serde_json::from_slice::<TokenClaims>(&raw)
        .map_err(|e| ProbeError::Token(e.to_string()))?;

    Ok(TokenInfo {
        algorithm: header.alg,
        claims,
    })
}
