//! Persistence ports.
//!
//! Two logical schemas: one [`global`] store (identity + routing) and N
//! structurally identical [`regional`] stores (credentials + sessions +
//! domain verification + email outbox). Query functions are generic over
//! `C: ConnectionTrait`, so every operation runs equally against a pool or
//! inside a transaction opened with `Db::with_tx`.
//!
//! Every cross-entity reference carries `ON DELETE CASCADE` from its parent;
//! saga compensators rely on this to undo a whole aggregate with one delete.

pub mod global;
pub mod regional;
pub mod types;
