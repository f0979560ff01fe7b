pub mod admin_handlers;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod org_handlers;
pub mod routes;

pub use routes::{router, ApiState};
