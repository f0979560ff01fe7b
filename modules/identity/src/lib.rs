//! Identity: the authentication state machines for both portals, the
//! session/context layer, and the platform's REST surface.
//!
//! Org flows live on the regional plane and carry region-prefixed tokens;
//! admin flows live entirely on the global plane with bare tokens. Flows
//! that must touch both planes go through the saga runner so partial
//! failures compensate with plain deletes.

pub mod api;
pub mod config;
pub mod domain;

pub use config::IdentityConfig;
pub use domain::admin::AdminAuthService;
pub use domain::context::{AdminContext, OrgContext};
pub use domain::error::DomainError;
pub use domain::org::OrgAuthService;
