//! Federation layer: one global control plane, N regional data planes.
//!
//! - [`regions`]: immutable boot-time map from region codes to regional
//!   database pools and peer base URLs.
//! - [`token`]: opaque token generation, the region-prefix wire grammar and
//!   email hashing.
//! - [`proxy`]: cross-region HTTP forwarding for operations whose owning
//!   region is only knowable after reading the token.
//! - [`saga`]: ordered multi-store steps with reverse best-effort
//!   compensation.

pub mod proxy;
pub mod regions;
pub mod saga;
pub mod token;

pub use proxy::{ProxyError, RegionProxy};
pub use regions::{RegionCode, RegionError, RegionHandle, RegionRegistry};
pub use saga::Saga;
pub use token::TokenError;
