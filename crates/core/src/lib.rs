//! Domain logic for tenant provisioning: identifiers, the error
//! taxonomy, tenant reference rewriting, the template store and the
//! platform API seam.
//!
//! Nothing here talks to the network; see `tbprov-client` for the HTTP
//! implementation of [`platform::PlatformApi`].

pub mod error;
pub mod platform;
pub mod registry;
pub mod rewrite;
pub mod template;
pub mod types;
