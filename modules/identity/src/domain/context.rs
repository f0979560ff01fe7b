//! Session validation and the per-request caller context.
//!
//! The middleware resolves a bearer token into one of these contexts and
//! attaches it to the request. Handlers read it to learn who is calling and
//! apply `is_admin OR has_role` authorisation.

use uuid::Uuid;
use vetchium_db::Db;
use vetchium_federation::{RegionCode, RegionRegistry};
use vetchium_store::types::{roles, UserStatus};
use vetchium_store::{global, regional};

use super::error::DomainError;

#[derive(Clone, Debug)]
pub struct OrgContext {
    pub user_id: Uuid,
    pub employer_id: Uuid,
    pub employer_name: String,
    pub region: RegionCode,
    pub email: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    pub roles: Vec<String>,
    pub status: UserStatus,
    pub preferred_language: String,
    /// Bare session token; logout deletes exactly this session.
    pub session_token: String,
}

impl OrgContext {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.is_admin || self.roles.iter().any(|r| r == role)
    }

    /// `is_admin OR member_of(role)`.
    ///
    /// # Errors
    /// `Forbidden` when neither holds.
    pub fn require_role(&self, role: &str) -> Result<(), DomainError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(DomainError::Forbidden)
        }
    }
}

#[derive(Clone, Debug)]
pub struct AdminContext {
    pub admin_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub preferred_language: String,
    pub status: UserStatus,
    pub roles: Vec<String>,
    pub session_token: String,
}

impl AdminContext {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles
            .iter()
            .any(|r| r == role || r == roles::ADMIN_SUPERADMIN)
    }

    /// `admin:superadmin OR member_of(role)`.
    ///
    /// # Errors
    /// `Forbidden` when neither holds.
    pub fn require_role(&self, role: &str) -> Result<(), DomainError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(DomainError::Forbidden)
        }
    }
}

/// Resolve a bare org session token into a full caller context: regional
/// session + regional projection + global projection + employer. A disabled
/// user is indistinguishable from an invalid token.
pub async fn load_org_context(
    global_db: &Db,
    registry: &RegionRegistry,
    region: &RegionCode,
    bare_token: &str,
) -> Result<OrgContext, DomainError> {
    let regional_db = registry.db(region).map_err(|_| DomainError::Unauthorized)?;

    let session = regional::tokens::find_session(regional_db.conn(), bare_token)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    let regional_user = regional::org_users::find(regional_db.conn(), session.org_user_id)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    let global_user = global::org_users::find(global_db.conn(), session.org_user_id)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    if global_user.status == UserStatus::Disabled || regional_user.status == UserStatus::Disabled {
        return Err(DomainError::Unauthorized);
    }

    let employer = global::employers::find(global_db.conn(), global_user.employer_id)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    let user_roles = regional::org_users::roles_of(regional_db.conn(), session.org_user_id).await?;

    Ok(OrgContext {
        user_id: session.org_user_id,
        employer_id: employer.id,
        employer_name: employer.display_name,
        region: region.clone(),
        email: regional_user.email,
        full_name: global_user.full_name,
        is_admin: regional_user.is_admin,
        roles: user_roles,
        status: global_user.status,
        preferred_language: global_user.preferred_language,
        session_token: bare_token.to_owned(),
    })
}

/// Resolve a bare admin session token against the global plane.
pub async fn load_admin_context(
    global_db: &Db,
    token: &str,
) -> Result<AdminContext, DomainError> {
    let session = global::tokens::find_admin_session(global_db.conn(), token)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    let admin = global::admin_users::find(global_db.conn(), session.admin_user_id)
        .await?
        .ok_or(DomainError::Unauthorized)?;

    if admin.status != UserStatus::Active {
        return Err(DomainError::Unauthorized);
    }

    let admin_roles = global::admin_users::roles_of(global_db.conn(), admin.id).await?;

    Ok(AdminContext {
        admin_id: admin.id,
        email: admin.email,
        full_name: admin.full_name,
        preferred_language: admin.preferred_language,
        status: admin.status,
        roles: admin_roles,
        session_token: token.to_owned(),
    })
}
