//! `tbprov-provision` library crate.
//!
//! Rule chain import ordering, the provisioning session and the solution
//! recipes. The binary entrypoint lives in `main.rs`.

pub mod config;
pub mod orchestrator;
pub mod session;
pub mod solution;

use tbprov_core::error::ProvisionResult;
use tbprov_core::platform::PlatformApi;

use crate::config::ProvisionConfig;
use crate::session::ProvisioningSession;
use crate::solution::ProvisionSummary;

/// Run one complete provisioning session with `api` as configured.
pub async fn provision<P: PlatformApi>(
    api: P,
    config: &ProvisionConfig,
) -> ProvisionResult<ProvisionSummary> {
    tracing::info!(solution = %config.solution, "Preparing to start solution");

    let mut session =
        ProvisioningSession::start(api, config.template_store(), &config.credentials).await?;
    let summary = solution::run_solution(config.solution, &mut session).await?;

    tracing::info!(
        rule_chains = summary.rule_chains,
        dashboards = summary.dashboards,
        widgets_bundles = summary.widgets_bundles,
        widget_types = summary.widget_types,
        attribute_writes = summary.attribute_writes,
        "Provisioning complete"
    );
    Ok(summary)
}
