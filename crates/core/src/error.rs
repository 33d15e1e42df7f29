use std::path::PathBuf;

/// Errors surfaced by the remote platform client.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// A call that needs a session token was made before logging in.
    #[error("Not authenticated: call login first")]
    NotAuthenticated,

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The platform returned a non-2xx status code.
    #[error("Platform API error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

/// Provisioning error taxonomy. Every variant aborts the session.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid template {}: {reason}", path.display())]
    TemplateParse { path: PathBuf, reason: String },

    #[error("Incorrect import order: rule chain '{template}' references '{rule_chain}' which has not been imported yet")]
    OutOfOrderImport {
        template: String,
        rule_chain: String,
    },

    #[error("Rule chain '{template}' has a connection to node '{node_ref}' that is not mapped to any rule chain name")]
    UnmappedConnection { template: String, node_ref: String },

    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteError),
}

/// Convenience alias used across the provisioning crates.
pub type ProvisionResult<T> = Result<T, ProvisionError>;

impl ProvisionError {
    /// Shorthand for [`ProvisionError::TemplateParse`].
    pub fn template(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::TemplateParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code for this error.
    ///
    /// | Code | Category                         |
    /// |------|----------------------------------|
    /// | 2    | configuration                    |
    /// | 3    | template missing or malformed    |
    /// | 4    | rule chain import order / mapping|
    /// | 5    | remote platform call             |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 2,
            Self::TemplateParse { .. } => 3,
            Self::OutOfOrderImport { .. } | Self::UnmappedConnection { .. } => 4,
            Self::Remote(_) => 5,
        }
    }
}
