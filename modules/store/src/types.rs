//! Shared column enums and role catalogues.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status shared by org users (global projection) and admin users.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[sea_orm(string_value = "INVITED")]
    Invited,
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "DISABLED")]
    Disabled,
}

/// Verification status of a claimed domain. The global routing record only
/// ever holds `Pending` or `Verified`; `Failing` is a regional concern driven
/// by consecutive lookup failures.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "VERIFIED")]
    Verified,
    #[sea_orm(string_value = "FAILING")]
    Failing,
}

/// Kind discriminator for the polymorphic token tables. Sessions and signup
/// tokens live in tables of their own; these are the short-lived rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TokenKind {
    #[sea_orm(string_value = "tfa")]
    Tfa,
    #[sea_orm(string_value = "invitation")]
    Invitation,
    #[sea_orm(string_value = "password_reset")]
    PasswordReset,
}

/// Email outbox row type. A separate mailer drains rows in insertion order;
/// the type tag is its only routing hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum EmailKind {
    #[sea_orm(string_value = "org_signup_verification")]
    OrgSignupVerification,
    #[sea_orm(string_value = "org_tfa")]
    OrgTfa,
    #[sea_orm(string_value = "org_invitation")]
    OrgInvitation,
    #[sea_orm(string_value = "org_password_reset")]
    OrgPasswordReset,
    #[sea_orm(string_value = "admin_tfa")]
    AdminTfa,
    #[sea_orm(string_value = "admin_invitation")]
    AdminInvitation,
    #[sea_orm(string_value = "admin_password_reset")]
    AdminPasswordReset,
}

/// Role catalogues. Admin roles live in the global store, employer roles in
/// each regional store. Effective permission is `is_admin OR member_of(role)`
/// on the org plane and `admin:superadmin OR member_of(role)` on the admin
/// plane.
pub mod roles {
    pub const ADMIN_SUPERADMIN: &str = "admin:superadmin";
    pub const ADMIN_MANAGE_ADMINS: &str = "admin:manage_admins";
    pub const ADMIN_MANAGE_TAGS: &str = "admin:manage_tags";

    pub const EMPLOYER_SUPERADMIN: &str = "employer:superadmin";
    pub const EMPLOYER_INVITE_USERS: &str = "employer:invite_users";
    pub const EMPLOYER_MANAGE_USERS: &str = "employer:manage_users";

    pub const ADMIN_CATALOGUE: &[&str] = &[ADMIN_SUPERADMIN, ADMIN_MANAGE_ADMINS, ADMIN_MANAGE_TAGS];
    pub const EMPLOYER_CATALOGUE: &[&str] =
        &[EMPLOYER_SUPERADMIN, EMPLOYER_INVITE_USERS, EMPLOYER_MANAGE_USERS];
}
