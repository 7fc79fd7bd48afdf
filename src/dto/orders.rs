use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ORDER_STATUS: &str = "pending";

/// The order row shape the front-end assumes. `items` is stored as serialized JSON text.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderRecord {
    pub id: Value,
    pub user_id: Value,
    #[serde(default)]
    pub items: Option<Value>,
    #[serde(default)]
    pub total_amount: Option<Value>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    DEFAULT_ORDER_STATUS.to_string()
}

impl OrderRecord {
    /// Decode `items` whether it was stored as JSON text or returned already parsed.
    pub fn line_items(&self) -> Option<Vec<Value>> {
        match self.items.as_ref()? {
            Value::String(text) => serde_json::from_str::<Vec<Value>>(text).ok(),
            Value::Array(items) => Some(items.clone()),
            _ => None,
        }
    }
}

/// Locate the order list in a response: bare array, `data`, `orders` or `data.items`.
pub fn extract_records(body: &Value) -> Vec<&Value> {
    let list = match body {
        Value::Array(items) => Some(items),
        _ => body
            .get("data")
            .and_then(Value::as_array)
            .or_else(|| body.get("orders").and_then(Value::as_array))
            .or_else(|| {
                body.get("data")
                    .and_then(|data| data.get("items").or_else(|| data.get("orders")))
                    .and_then(Value::as_array)
            }),
    };
    list.map(|items| items.iter().collect()).unwrap_or_default()
}
