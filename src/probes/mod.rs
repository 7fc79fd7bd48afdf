use std::fmt;

use crate::{
    client::ShopClient,
    dto::{auth::LoginRequest, sync::SyncPayload},
    error::ProbeResult,
    response::ProbeReport,
};

pub mod login;
pub mod orders;
pub mod smoke;
pub mod sync;

pub use login::LoginDetail;
pub use orders::OrdersDetail;
pub use smoke::{SmokePlan, SmokeStep, smoke};
pub use sync::SyncPushDetail;

#[derive(Debug, Clone)]
pub enum Probe {
    Health,
    Login(LoginRequest),
    Orders {
        user_id: String,
        check_schema: bool,
    },
    SyncGet {
        user_id: String,
    },
    SyncPush {
        user_id: String,
        payload: SyncPayload,
        /// `None` bumps whatever version the server currently holds.
        version: Option<i64>,
    },
}

impl Probe {
    pub fn name(&self) -> &'static str {
        match self {
            Probe::Health => "health",
            Probe::Login(_) => "login",
            Probe::Orders { .. } => "orders",
            Probe::SyncGet { .. } => "sync-get",
            Probe::SyncPush { .. } => "sync-push",
        }
    }

    pub async fn run(&self, client: &ShopClient) -> ProbeResult<ProbeRun> {
        tracing::info!(probe = self.name(), base = %client.base_url(), "running probe");
        match self {
            Probe::Health => Ok(ProbeRun::plain(client.health().await?)),
            Probe::Login(request) => login::run(client, request).await,
            Probe::Orders {
                user_id,
                check_schema,
            } => orders::run(client, user_id, *check_schema).await,
            Probe::SyncGet { user_id } => Ok(ProbeRun::plain(client.fetch_sync(user_id).await?)),
            Probe::SyncPush {
                user_id,
                payload,
                version,
            } => sync::push(client, user_id, payload.clone(), *version).await,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProbeDetail {
    None,
    Login(LoginDetail),
    Orders(OrdersDetail),
    SyncPush(SyncPushDetail),
}

/// A finished probe: the raw exchange plus whatever the probe derived from it.
#[derive(Debug, Clone)]
pub struct ProbeRun {
    pub report: ProbeReport,
    pub detail: ProbeDetail,
}

impl ProbeRun {
    pub fn plain(report: ProbeReport) -> Self {
        Self {
            report,
            detail: ProbeDetail::None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.report.is_success()
    }
}

impl fmt::Display for ProbeRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report)?;
        match &self.detail {
            ProbeDetail::None => Ok(()),
            ProbeDetail::Login(detail) => write!(f, "{detail}"),
            ProbeDetail::Orders(detail) => write!(f, "{detail}"),
            ProbeDetail::SyncPush(detail) => write!(f, "{detail}"),
        }
    }
}
