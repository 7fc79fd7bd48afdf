use std::fmt;

use super::{Probe, ProbeRun};
use crate::{client::ShopClient, dto::auth::LoginRequest, error::ProbeResult};

#[derive(Debug, Clone, Default)]
pub struct SmokePlan {
    pub login: Option<LoginRequest>,
    pub user_id: Option<String>,
    pub check_schema: bool,
}

impl SmokePlan {
    pub fn probes(&self) -> Vec<Probe> {
        let mut probes = vec![Probe::Health];
        if let Some(login) = &self.login {
            probes.push(Probe::Login(login.clone()));
        }
        if let Some(user_id) = &self.user_id {
            probes.push(Probe::Orders {
                user_id: user_id.clone(),
                check_schema: self.check_schema,
            });
            probes.push(Probe::SyncGet {
                user_id: user_id.clone(),
            });
        }
        probes
    }
}

pub struct SmokeStep {
    pub name: &'static str,
    pub result: ProbeResult<ProbeRun>,
}

impl SmokeStep {
    pub fn passed(&self) -> bool {
        self.result.as_ref().is_ok_and(ProbeRun::is_success)
    }
}

impl fmt::Display for SmokeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(run) => write!(
                f,
                "{:<10} {:<4} {} ({} ms)",
                self.name,
                if self.passed() { "ok" } else { "FAIL" },
                run.report.status,
                run.report.elapsed.as_millis()
            ),
            Err(err) => write!(f, "{:<10} FAIL {err}", self.name),
        }
    }
}

/// Run the plan one probe at a time. A failed step does not stop the run.
pub async fn smoke(client: &ShopClient, plan: &SmokePlan) -> Vec<SmokeStep> {
    let mut steps = Vec::new();
    for probe in plan.probes() {
        let result = probe.run(client).await;
        if let Err(err) = &result {
            tracing::warn!(probe = probe.name(), error = %err, "smoke step failed");
        }
        steps.push(SmokeStep {
            name: probe.name(),
            result,
        });
    }
    steps
}
