use std::{fmt, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::ProbeError;

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// The `{message, data, meta}` envelope the backend family wraps payloads in.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportBody {
    /// Parsed for inspection; `raw` is exactly what the server sent.
    Json { value: Value, raw: String },
    Text(String),
    Empty,
}

impl ReportBody {
    /// Classify a raw body by trying JSON first, whatever the content type claims.
    pub fn from_text(text: String) -> Self {
        if text.is_empty() {
            return ReportBody::Empty;
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => ReportBody::Json { value, raw: text },
            Err(_) => ReportBody::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ReportBody::Json { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            ReportBody::Json { raw, .. } => raw,
            ReportBody::Text(text) => text,
            ReportBody::Empty => "",
        }
    }
}

/// One request/response exchange, as printed to the console.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub probe: String,
    pub method: String,
    pub url: String,
    pub request_id: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ReportBody,
    pub elapsed: Duration,
}

impl ProbeReport {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<&Value> {
        self.body.as_json()
    }

    /// The envelope's `data` when present, otherwise the whole JSON body.
    pub fn payload(&self) -> Option<&Value> {
        let value = self.json()?;
        match value.get("data") {
            Some(data) if !data.is_null() => Some(data),
            _ => Some(value),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProbeError> {
        let value = self
            .payload()
            .ok_or_else(|| ProbeError::Decode("response body is not JSON".into()))?;
        Ok(serde_json::from_value(value.clone())?)
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[{}] {} {} -> {} ({} ms, request id {})",
            self.probe,
            self.method,
            self.url,
            self.status,
            self.elapsed.as_millis(),
            self.request_id
        )?;
        let mut headers = self.headers.clone();
        headers.sort();
        writeln!(f, "headers:")?;
        for (name, value) in &headers {
            writeln!(f, "  {name}: {value}")?;
        }
        match &self.body {
            ReportBody::Empty => writeln!(f, "body: <empty>"),
            body => writeln!(f, "body:\n{}", body.raw()),
        }
    }
}
