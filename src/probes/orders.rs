use std::fmt;

use super::{ProbeDetail, ProbeRun};
use crate::{
    client::ShopClient,
    dto::orders::{OrderRecord, extract_records},
    error::ProbeResult,
    schema::{SchemaFinding, check_order},
};

#[derive(Debug, Clone, Default)]
pub struct OrdersDetail {
    pub count: usize,
    pub line_items: usize,
    /// Per-record findings, keyed by position in the response. Only set with schema checks on.
    pub findings: Vec<(usize, Vec<SchemaFinding>)>,
    pub checked: bool,
}

impl OrdersDetail {
    pub fn has_errors(&self) -> bool {
        self.findings
            .iter()
            .any(|(_, findings)| findings.iter().any(|f| !f.is_warning()))
    }
}

pub async fn run(client: &ShopClient, user_id: &str, check_schema: bool) -> ProbeResult<ProbeRun> {
    let report = client.user_orders(user_id).await?;

    let records = report.json().map(extract_records).unwrap_or_default();
    let line_items = records
        .iter()
        .filter_map(|value| serde_json::from_value::<OrderRecord>((*value).clone()).ok())
        .filter_map(|record| record.line_items())
        .map(|items| items.len())
        .sum();

    let findings = if check_schema {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| (index, check_order(record)))
            .filter(|(_, findings)| !findings.is_empty())
            .collect()
    } else {
        Vec::new()
    };

    let detail = OrdersDetail {
        count: records.len(),
        line_items,
        findings,
        checked: check_schema,
    };
    if detail.has_errors() {
        tracing::warn!(user_id, "order records deviate from the assumed schema");
    }

    Ok(ProbeRun {
        report,
        detail: ProbeDetail::Orders(detail),
    })
}

impl fmt::Display for OrdersDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "orders: {} record(s), {} line item(s)",
            self.count, self.line_items
        )?;
        if !self.checked {
            return Ok(());
        }
        if self.findings.is_empty() {
            return writeln!(f, "schema: all records match");
        }
        for (index, findings) in &self.findings {
            for finding in findings {
                let level = if finding.is_warning() { "warn" } else { "error" };
                writeln!(f, "schema [{index}] {level}: {finding}")?;
            }
        }
        Ok(())
    }
}
