//! Admin-plane authentication service.
//!
//! Structurally the org flows with one difference: the global store owns
//! both identity and tokens, so the flows are single-plane and their tokens
//! carry no region prefix. Emails still go through an outbox, which is a
//! regional table; the current node's own region hosts them.

mod admins;
mod invite;
mod login;
mod password_reset;


use std::sync::Arc;

use vetchium_db::Db;
use vetchium_federation::RegionRegistry;

use crate::config::IdentityConfig;

pub struct AdminAuthService {
    pub(crate) global: Db,
    pub(crate) registry: Arc<RegionRegistry>,
    pub(crate) cfg: Arc<IdentityConfig>,
}

impl AdminAuthService {
    pub fn new(global: Db, registry: Arc<RegionRegistry>, cfg: Arc<IdentityConfig>) -> Self {
        Self {
            global,
            registry,
            cfg,
        }
    }
}
