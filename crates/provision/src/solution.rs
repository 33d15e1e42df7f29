//! Solution types and the provisioning recipe each one runs.

use std::fmt;
use std::str::FromStr;

use tbprov_core::error::{ProvisionError, ProvisionResult};
use tbprov_core::platform::PlatformApi;

use crate::session::ProvisioningSession;

/// Which provisioning recipe to run, selected by `SOLUTION_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolutionType {
    /// Manifest-driven recipe over the `cli` solution directory.
    #[default]
    Cli,
}

impl SolutionType {
    pub const ALL: &'static [SolutionType] = &[SolutionType::Cli];

    /// Selector name accepted in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Self::Cli => "cli",
        }
    }

    /// Directory under `<data_dir>/json` holding this solution's templates.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Cli => "cli",
        }
    }
}

impl fmt::Display for SolutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolutionType {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|solution| solution.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::ALL.iter().map(|s| s.name()).collect();
                ProvisionError::Configuration(format!(
                    "Unsupported solution type: [{wanted}] (supported: {})",
                    supported.join(", ")
                ))
            })
    }
}

/// Counts of entities created by a provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionSummary {
    pub existing_rule_chains: usize,
    pub rule_chains: usize,
    pub dashboards: usize,
    pub widgets_bundles: usize,
    pub widget_types: usize,
    pub attribute_writes: usize,
}

/// Run the recipe for `solution` against an already started session.
pub async fn run_solution<P: PlatformApi>(
    solution: SolutionType,
    session: &mut ProvisioningSession<P>,
) -> ProvisionResult<ProvisionSummary> {
    match solution {
        SolutionType::Cli => provision_from_manifest(session).await,
    }
}

/// Provision everything listed in the solution's `solution.json`:
/// existing rule chains, rule chains in manifest order, dashboards,
/// widgets bundles, then tenant attribute files.
pub async fn provision_from_manifest<P: PlatformApi>(
    session: &mut ProvisioningSession<P>,
) -> ProvisionResult<ProvisionSummary> {
    let manifest = session.store().load_manifest()?;
    let mut summary = ProvisionSummary {
        existing_rule_chains: session
            .seed_existing(&manifest.existing_rule_chains)
            .await?,
        ..Default::default()
    };

    for entry in &manifest.rule_chains {
        session
            .import_rule_chain(&entry.file, entry.root, &entry.references)
            .await?;
        summary.rule_chains += 1;
    }

    for file in &manifest.dashboards {
        session.create_dashboard(file).await?;
        summary.dashboards += 1;
    }

    for file in &manifest.widgets_bundles {
        let created = session.create_widgets_bundle(file).await?;
        summary.widgets_bundles += 1;
        summary.widget_types += created.widget_types;
    }

    for entry in &manifest.attributes {
        if session.save_tenant_attributes(&entry.file).await? {
            summary.attribute_writes += 1;
        }
    }

    Ok(summary)
}
