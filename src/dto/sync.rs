use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Item ids arrive as integers from some clients and as strings from others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(i64),
    Text(String),
}

impl FromStr for ItemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty item id".into());
        }
        Ok(s.parse::<i64>()
            .map(ItemId::Number)
            .unwrap_or_else(|_| ItemId::Text(s.to_string())))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{n}"),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub id: ItemId,
    pub name: String,
}

/// Parses `ID:NAME`.
impl FromStr for FavoriteEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, name) = s
            .split_once(':')
            .ok_or_else(|| format!("expected ID:NAME, got {s:?}"))?;
        Ok(Self {
            id: id.parse()?,
            name: name.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: ItemId,
    pub quantity: u32,
}

/// Parses `ID:QTY`.
impl FromStr for CartEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, quantity) = s
            .split_once(':')
            .ok_or_else(|| format!("expected ID:QTY, got {s:?}"))?;
        let quantity = quantity
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid quantity in {s:?}: {e}"))?;
        Ok(Self {
            id: id.parse()?,
            quantity,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SyncPayload {
    #[serde(default)]
    pub favorites: Vec<FavoriteEntry>,
    #[serde(default)]
    pub cart: Vec<CartEntry>,
    #[serde(default)]
    pub version: i64,
}

impl SyncPayload {
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }
}

/// Read the version counter out of a sync response, enveloped or bare.
/// A response without one counts as version 0.
pub fn current_version(body: &Value) -> i64 {
    body.get("version")
        .or_else(|| body.get("data").and_then(|data| data.get("version")))
        .and_then(Value::as_i64)
        .unwrap_or(0)
}
