//! Route table and shared API state.

use std::sync::Arc;

use axum::routing::post;
use axum::{middleware as axum_middleware, Router};
use vetchium_db::Db;
use vetchium_domain_verification::DomainVerificationService;
use vetchium_federation::{RegionProxy, RegionRegistry};

use super::middleware::{admin_auth, org_auth};
use super::{admin_handlers, org_handlers};
use crate::domain::admin::AdminAuthService;
use crate::domain::org::OrgAuthService;

#[derive(Clone)]
pub struct ApiState {
    pub org: Arc<OrgAuthService>,
    pub admin: Arc<AdminAuthService>,
    pub verification: Arc<DomainVerificationService>,
    pub registry: Arc<RegionRegistry>,
    pub proxy: Arc<RegionProxy>,
    pub global: Db,
    /// Cap applied when buffering bodies for cross-region forwarding.
    pub body_limit: usize,
}

/// Build the full route table. Every operation is a POST with a JSON body,
/// including the read-style ones.
pub fn router(state: ApiState) -> Router {
    let org_public = Router::new()
        .route("/org/init-signup", post(org_handlers::init_signup))
        .route("/org/complete-signup", post(org_handlers::complete_signup))
        .route("/org/login", post(org_handlers::login))
        .route("/org/tfa", post(org_handlers::tfa))
        .route("/org/complete-invite", post(org_handlers::complete_invite))
        .route(
            "/org/request-password-reset",
            post(org_handlers::request_password_reset),
        )
        .route(
            "/org/complete-password-reset",
            post(org_handlers::complete_password_reset),
        );

    let org_secured = Router::new()
        .route("/org/my-info", post(org_handlers::my_info))
        .route("/org/logout", post(org_handlers::logout))
        .route("/org/invite-user", post(org_handlers::invite_user))
        .route("/org/disable-user", post(org_handlers::disable_user))
        .route("/org/enable-user", post(org_handlers::enable_user))
        .route("/org/add-user-role", post(org_handlers::add_user_role))
        .route("/org/remove-user-role", post(org_handlers::remove_user_role))
        .route("/org/claim-domain", post(org_handlers::claim_domain))
        .route("/org/verify-domain", post(org_handlers::verify_domain))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            org_auth,
        ));

    let admin_public = Router::new()
        .route("/admin/login", post(admin_handlers::login))
        .route("/admin/tfa", post(admin_handlers::tfa))
        .route("/admin/complete-setup", post(admin_handlers::complete_setup))
        .route(
            "/admin/request-password-reset",
            post(admin_handlers::request_password_reset),
        )
        .route(
            "/admin/complete-password-reset",
            post(admin_handlers::complete_password_reset),
        );

    let admin_secured = Router::new()
        .route("/admin/my-info", post(admin_handlers::my_info))
        .route("/admin/logout", post(admin_handlers::logout))
        .route("/admin/invite-admin", post(admin_handlers::invite_admin))
        .route("/admin/disable-admin", post(admin_handlers::disable_admin))
        .route("/admin/enable-admin", post(admin_handlers::enable_admin))
        .route("/admin/add-admin-role", post(admin_handlers::add_admin_role))
        .route(
            "/admin/remove-admin-role",
            post(admin_handlers::remove_admin_role),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            admin_auth,
        ));

    Router::new()
        .merge(org_public)
        .merge(org_secured)
        .merge(admin_public)
        .merge(admin_secured)
        .with_state(state)
}
