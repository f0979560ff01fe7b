//! Regional store: credentials, sessions, role membership, per-region
//! domain verification state and the email outbox.
//!
//! Callers pick the pool through the region registry; functions here are
//! pool-agnostic and run against whichever region owns the data.

pub mod employer_domains;
pub mod entity;
pub mod migrations;
pub mod org_users;
pub mod outbox;
pub mod tokens;
