//! REST DTOs for both portals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use vetchium_store::types::DomainStatus;

use crate::domain::context::{AdminContext, OrgContext};
use crate::domain::org::TokenGrant;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// --- org flows ---

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InitSignupRequest {
    pub email: String,
    pub home_region: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CompleteSignupRequest {
    pub signup_token: String,
    pub password: String,
    #[serde(default)]
    pub preferred_language: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<TokenGrant> for SessionResponse {
    fn from(grant: TokenGrant) -> Self {
        Self {
            session_token: grant.token,
            expires_at: grant.expires_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub domain: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TfaResponse {
    pub tfa_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<TokenGrant> for TfaResponse {
    fn from(grant: TokenGrant) -> Self {
        Self {
            tfa_token: grant.token,
            expires_at: grant.expires_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TfaVerifyRequest {
    pub tfa_token: String,
    pub tfa_code: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrgMyInfoResponse {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub employer_id: Uuid,
    pub employer_name: String,
    pub home_region: String,
    pub is_admin: bool,
    pub roles: Vec<String>,
    pub preferred_language: String,
}

impl From<&OrgContext> for OrgMyInfoResponse {
    fn from(ctx: &OrgContext) -> Self {
        Self {
            user_id: ctx.user_id,
            email: ctx.email.clone(),
            full_name: ctx.full_name.clone(),
            employer_id: ctx.employer_id,
            employer_name: ctx.employer_name.clone(),
            home_region: ctx.region.as_str().to_owned(),
            is_admin: ctx.is_admin,
            roles: ctx.roles.clone(),
            preferred_language: ctx.preferred_language.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InviteUserRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CompleteInviteRequest {
    pub invitation_token: String,
    pub full_name: String,
    pub password: String,
    #[serde(default)]
    pub preferred_language: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
    pub domain: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CompletePasswordResetRequest {
    pub reset_token: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserTargetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserRoleRequest {
    pub email: String,
    pub role: String,
}

// --- domain verification ---

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClaimDomainRequest {
    pub domain: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimDomainResponse {
    pub domain: String,
    /// The TXT value to publish at `_vetchium-verify.<domain>`.
    pub verification_token: String,
    pub token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyDomainRequest {
    pub domain: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyDomainResponse {
    pub domain: String,
    pub status: String,
}

#[must_use]
pub fn domain_status_str(status: DomainStatus) -> &'static str {
    match status {
        DomainStatus::Pending => "PENDING",
        DomainStatus::Verified => "VERIFIED",
        DomainStatus::Failing => "FAILING",
    }
}

// --- admin flows ---

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminTfaVerifyRequest {
    pub tfa_token: String,
    pub tfa_code: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminMyInfoResponse {
    pub admin_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub roles: Vec<String>,
    pub preferred_language: String,
}

impl From<&AdminContext> for AdminMyInfoResponse {
    fn from(ctx: &AdminContext) -> Self {
        Self {
            admin_id: ctx.admin_id,
            email: ctx.email.clone(),
            full_name: ctx.full_name.clone(),
            roles: ctx.roles.clone(),
            preferred_language: ctx.preferred_language.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminInviteRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminCompleteSetupRequest {
    pub invitation_token: String,
    pub full_name: String,
    pub password: String,
    #[serde(default)]
    pub preferred_language: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminPasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminCompletePasswordResetRequest {
    pub reset_token: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminTargetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminRoleRequest {
    pub email: String,
    pub role: String,
}

/// The body returned by password-reset requests regardless of whether the
/// account exists.
pub const PASSWORD_RESET_GENERIC_MESSAGE: &str =
    "If the account exists, a password reset email has been sent";
