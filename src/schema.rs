use std::fmt;

use serde_json::Value;

use crate::dto::orders::DEFAULT_ORDER_STATUS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Number,
    Text,
    /// Text holding a serialized JSON array.
    JsonText,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::Integer => {
                value.as_i64().is_some()
                    || value.as_str().is_some_and(|s| s.parse::<i64>().is_ok())
            }
            // numeric columns often come back as strings ("19.90")
            FieldKind::Number => {
                value.is_number() || value.as_str().is_some_and(|s| s.parse::<f64>().is_ok())
            }
            FieldKind::Text => value.is_string(),
            FieldKind::JsonText => value.is_string() || value.is_array(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Number => "numeric",
            FieldKind::Text => "text",
            FieldKind::JsonText => "json text",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: Option<&'static str>,
    pub note: &'static str,
}

pub const ORDER_SCHEMA: &[ColumnSpec] = &[
    ColumnSpec {
        name: "id",
        kind: FieldKind::Integer,
        default: None,
        note: "primary key",
    },
    ColumnSpec {
        name: "user_id",
        kind: FieldKind::Integer,
        default: None,
        note: "owner of the order",
    },
    ColumnSpec {
        name: "items",
        kind: FieldKind::JsonText,
        default: None,
        note: "serialized list of purchased items",
    },
    ColumnSpec {
        name: "total_amount",
        kind: FieldKind::Number,
        default: None,
        note: "order total",
    },
    ColumnSpec {
        name: "status",
        kind: FieldKind::Text,
        default: Some(DEFAULT_ORDER_STATUS),
        note: "order lifecycle state",
    },
];

pub const KNOWN_STATUSES: &[&str] = &[
    "pending",
    "paid",
    "processing",
    "shipped",
    "delivered",
    "cancelled",
];

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaFinding {
    NotAnObject,
    MissingField(&'static str),
    WrongKind {
        field: &'static str,
        expected: FieldKind,
        found: String,
    },
    ItemsNotJson(String),
    UnexpectedStatus(String),
    ExtraField(String),
}

impl SchemaFinding {
    /// Findings that do not break the front-end's assumptions.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            SchemaFinding::UnexpectedStatus(_) | SchemaFinding::ExtraField(_)
        )
    }
}

impl fmt::Display for SchemaFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaFinding::NotAnObject => write!(f, "record is not a JSON object"),
            SchemaFinding::MissingField(field) => write!(f, "missing field `{field}`"),
            SchemaFinding::WrongKind {
                field,
                expected,
                found,
            } => write!(
                f,
                "field `{field}` expected {}, found {found}",
                expected.as_str()
            ),
            SchemaFinding::ItemsNotJson(reason) => {
                write!(f, "`items` is not a JSON array: {reason}")
            }
            SchemaFinding::UnexpectedStatus(status) => {
                write!(f, "unexpected status {status:?}")
            }
            SchemaFinding::ExtraField(field) => write!(f, "extra field `{field}`"),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn check_order(record: &Value) -> Vec<SchemaFinding> {
    let Some(object) = record.as_object() else {
        return vec![SchemaFinding::NotAnObject];
    };

    let mut findings = Vec::new();
    for column in ORDER_SCHEMA {
        let value = match object.get(column.name) {
            Some(Value::Null) | None if column.default.is_some() => continue,
            Some(value) => value,
            None => {
                findings.push(SchemaFinding::MissingField(column.name));
                continue;
            }
        };

        if !column.kind.accepts(value) {
            findings.push(SchemaFinding::WrongKind {
                field: column.name,
                expected: column.kind,
                found: kind_of(value).to_string(),
            });
            continue;
        }

        if column.kind == FieldKind::JsonText
            && let Value::String(text) = value
            && let Err(err) = serde_json::from_str::<Vec<Value>>(text)
        {
            findings.push(SchemaFinding::ItemsNotJson(err.to_string()));
        }

        if column.name == "status"
            && let Some(status) = value.as_str()
            && !KNOWN_STATUSES.contains(&status)
        {
            findings.push(SchemaFinding::UnexpectedStatus(status.to_string()));
        }
    }

    let mut extras: Vec<&String> = object
        .keys()
        .filter(|key| !ORDER_SCHEMA.iter().any(|c| c.name == key.as_str()))
        .collect();
    extras.sort();
    findings.extend(extras.into_iter().cloned().map(SchemaFinding::ExtraField));

    findings
}

/// Render the assumed schema as a console table.
pub fn print_assumptions() -> String {
    let mut out = String::from("assumed `orders` schema:\n");
    for column in ORDER_SCHEMA {
        let default = column
            .default
            .map(|d| format!(" default {d:?}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {:<13} {:<10}{default}  -- {}\n",
            column.name,
            column.kind.as_str(),
            column.note
        ));
    }
    out
}
