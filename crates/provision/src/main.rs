//! `tbprov` -- one-shot tenant provisioning.
//!
//! Logs in to the platform, resolves the tenant and creates the rule
//! chains, dashboards, widgets bundles and attributes of the configured
//! solution, then exits.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default  | Description                         |
//! |------------------------|----------|----------|-------------------------------------|
//! | `TB_REST_URL`          | yes      | --       | Platform URL, e.g. `http://localhost:8080` |
//! | `TB_USERNAME`          | yes      | --       | Tenant administrator login          |
//! | `TB_PASSWORD`          | yes      | --       | Tenant administrator password       |
//! | `TB_DATA_DIR`          | no       | `./data` | Directory holding `json/<solution>` |
//! | `SOLUTION_TYPE`        | no       | `cli`    | Recipe to run                       |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`     | HTTP request timeout                |
//!
//! Exit code is `0` on success, otherwise the error category's code.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tbprov_client::RestClient;
use tbprov_core::error::ProvisionResult;
use tbprov_provision::config::ProvisionConfig;
use tbprov_provision::solution::ProvisionSummary;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tbprov=info,tbprov_provision=info,tbprov_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let code = match run().await {
        Ok(_) => 0,
        Err(e) => {
            tracing::error!(error = %e, "Unexpected error during solution loading");
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run() -> ProvisionResult<ProvisionSummary> {
    let config = ProvisionConfig::from_env()?;
    tracing::info!(
        url = %config.rest_url,
        data_dir = %config.data_dir.display(),
        solution = %config.solution,
        "Loaded configuration"
    );

    let client = RestClient::new(config.rest_url.clone(), config.request_timeout())?;
    tbprov_provision::provision(client, &config).await
}
