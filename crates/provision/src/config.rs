use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tbprov_core::error::{ProvisionError, ProvisionResult};
use tbprov_core::template::TemplateStore;

use crate::solution::SolutionType;

/// Directory probed under the working directory when `TB_DATA_DIR` is unset.
const DEFAULT_DATA_DIR: &str = "data";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Login credentials of the tenant administrator.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Provisioning run configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Platform base URL.
    pub rest_url: String,
    pub credentials: Credentials,
    /// Root data directory holding `json/<solution>/...`.
    pub data_dir: PathBuf,
    /// Recipe to run.
    pub solution: SolutionType,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl ProvisionConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                | Default                           |
    /// |------------------------|-----------------------------------|
    /// | `TB_REST_URL`          | required                          |
    /// | `TB_USERNAME`          | required                          |
    /// | `TB_PASSWORD`          | required                          |
    /// | `TB_DATA_DIR`          | `./data` if it is a directory     |
    /// | `SOLUTION_TYPE`        | `cli`                             |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                              |
    pub fn from_env() -> ProvisionResult<Self> {
        let work_dir = std::env::current_dir().map_err(|e| {
            ProvisionError::Configuration(format!("Cannot determine working directory: {e}"))
        })?;
        Self::from_lookup(|key| std::env::var(key).ok(), &work_dir)
    }

    /// Load configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        work_dir: &Path,
    ) -> ProvisionResult<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| {
                ProvisionError::Configuration(format!("{key} environment variable is required"))
            })
        };

        let rest_url = required("TB_REST_URL")?;
        let credentials = Credentials {
            username: required("TB_USERNAME")?,
            password: required("TB_PASSWORD")?,
        };

        let data_dir = resolve_data_dir(var("TB_DATA_DIR"), work_dir)?;

        let solution = match var("SOLUTION_TYPE") {
            Some(name) => name.parse()?,
            None => SolutionType::default(),
        };

        let request_timeout_secs = match var("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ProvisionError::Configuration(format!(
                    "REQUEST_TIMEOUT_SECS must be a valid u64, got '{raw}'"
                ))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            rest_url,
            credentials,
            data_dir,
            solution,
            request_timeout_secs,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Template store for the configured solution.
    pub fn template_store(&self) -> TemplateStore {
        TemplateStore::new(&self.data_dir, self.solution.dir_name())
    }
}

fn resolve_data_dir(explicit: Option<String>, work_dir: &Path) -> ProvisionResult<PathBuf> {
    if let Some(dir) = explicit {
        let path = PathBuf::from(&dir);
        if !path.is_dir() {
            return Err(ProvisionError::Configuration(format!(
                "TB_DATA_DIR '{dir}' is not a valid directory"
            )));
        }
        return Ok(path);
    }

    let fallback = work_dir.join(DEFAULT_DATA_DIR);
    if fallback.is_dir() {
        Ok(fallback)
    } else {
        Err(ProvisionError::Configuration(format!(
            "No data directory found at {}; set TB_DATA_DIR to the directory holding the JSON templates",
            fallback.display()
        )))
    }
}
