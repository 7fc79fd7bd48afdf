use std::fmt;

use super::{ProbeDetail, ProbeRun};
use crate::{
    client::ShopClient,
    dto::sync::{SyncPayload, current_version},
    error::ProbeResult,
};

#[derive(Debug, Clone)]
pub struct SyncPushDetail {
    pub version_sent: i64,
    /// Version read from the server before pushing, when no version was given.
    pub fetched_version: Option<i64>,
}

/// Push a payload. Without an explicit version the current one is fetched first
/// and the push carries `current + 1`.
pub async fn push(
    client: &ShopClient,
    user_id: &str,
    payload: SyncPayload,
    version: Option<i64>,
) -> ProbeResult<ProbeRun> {
    let (version_sent, fetched_version) = match version {
        Some(version) => (version, None),
        None => {
            let current = client.fetch_sync(user_id).await?;
            let found = if current.is_success() {
                current.json().map(current_version).unwrap_or(0)
            } else {
                tracing::warn!(
                    status = current.status,
                    "could not read current sync state, assuming version 0"
                );
                0
            };
            (found + 1, Some(found))
        }
    };

    let payload = payload.with_version(version_sent);
    let report = client.push_sync(user_id, &payload).await?;

    Ok(ProbeRun {
        report,
        detail: ProbeDetail::SyncPush(SyncPushDetail {
            version_sent,
            fetched_version,
        }),
    })
}

impl fmt::Display for SyncPushDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fetched_version {
            Some(found) => writeln!(
                f,
                "sync: server had version {found}, pushed version {}",
                self.version_sent
            ),
            None => writeln!(f, "sync: pushed version {}", self.version_sent),
        }
    }
}
