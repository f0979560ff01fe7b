//! Global store: employers, routing domains, global org-user projections,
//! admin users and all global-side tokens.
//!
//! Every function takes `c: &impl ConnectionTrait`; run them inside
//! `Db::with_tx` on the global pool when they belong to one atomic unit.

pub mod admin_users;
pub mod employers;
pub mod entity;
pub mod migrations;
pub mod org_users;
pub mod tokens;
