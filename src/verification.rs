use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct VerificationResult {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl VerificationResult {
    pub fn succeeded(result: Option<&Self>) -> bool {
        result.and_then(|r| r.success).unwrap_or(false)
    }
}

/// `true` only for an object whose `success` is the JSON boolean `true`.
pub fn is_success(result: Option<&Value>) -> bool {
    result
        .and_then(|value| value.get("success"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Parse a raw body into a typed result, treating anything unusable as absent.
pub fn parse_result(body: Option<&Value>) -> Option<VerificationResult> {
    body.filter(|value| value.is_object())
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

pub struct DemoCase {
    pub label: &'static str,
    pub input: Option<Value>,
}

/// The four inputs a verification response can realistically take.
pub fn demo_cases() -> Vec<DemoCase> {
    vec![
        DemoCase {
            label: "undefined",
            input: None,
        },
        DemoCase {
            label: "null",
            input: Some(Value::Null),
        },
        DemoCase {
            label: "object without success",
            input: Some(json!({ "message": "code sent" })),
        },
        DemoCase {
            label: "success: true",
            input: Some(json!({ "success": true })),
        },
    ]
}
