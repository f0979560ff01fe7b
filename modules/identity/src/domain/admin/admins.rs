//! Admin administration: disable/enable and role membership.
//!
//! The disable path must never leave the platform without an ACTIVE admin.
//! The guard counts inside the disabling transaction while holding row
//! locks on every ACTIVE admin, so concurrent disables serialise instead of
//! racing an unlocked count.

use uuid::Uuid;
use vetchium_db::DbError;
use vetchium_store::global::{admin_users, tokens};
use vetchium_store::types::{roles, UserStatus};

use super::AdminAuthService;
use crate::domain::error::DomainError;

impl AdminAuthService {
    async fn target_admin(&self, email: &str) -> Result<(Uuid, UserStatus), DomainError> {
        let admin = admin_users::find_by_email(self.global.conn(), &email.to_ascii_lowercase())
            .await?
            .ok_or(DomainError::NotFound)?;
        Ok((admin.id, admin.status))
    }

    /// Disable an admin unless they are the last ACTIVE one.
    ///
    /// # Errors
    /// `NotFound` for unknown admins, `InvalidState` when already disabled
    /// or when the target is the last ACTIVE admin.
    pub async fn disable_admin(&self, email: &str) -> Result<(), DomainError> {
        let (target_id, status) = self.target_admin(email).await?;
        if status == UserStatus::Disabled {
            return Err(DomainError::invalid_state("admin is already disabled"));
        }

        self.global
            .with_tx(move |tx| {
                Box::pin(async move {
                    let active = admin_users::lock_active(tx).await?;
                    let target_is_active = active.iter().any(|a| a.id == target_id);
                    if target_is_active && active.len() <= 1 {
                        return Err(DomainError::invalid_state("Cannot disable last admin user"));
                    }
                    admin_users::set_status(tx, target_id, UserStatus::Disabled).await?;
                    tokens::delete_admin_sessions_for(tx, target_id)
                        .await
                        .map_err(DomainError::from)
                })
            })
            .await?;

        tracing::info!(admin_id = %target_id, "admin disabled");
        Ok(())
    }

    /// # Errors
    /// `NotFound` for unknown admins, `InvalidState` unless currently
    /// disabled.
    pub async fn enable_admin(&self, email: &str) -> Result<(), DomainError> {
        let (target_id, status) = self.target_admin(email).await?;
        if status != UserStatus::Disabled {
            return Err(DomainError::invalid_state("admin is not disabled"));
        }
        admin_users::set_status(self.global.conn(), target_id, UserStatus::Active).await?;
        Ok(())
    }

    /// # Errors
    /// `Validation` for roles outside the admin catalogue, `NotFound` for
    /// unknown admins, `Conflict` when already assigned.
    pub async fn add_admin_role(&self, email: &str, role: &str) -> Result<(), DomainError> {
        if !roles::ADMIN_CATALOGUE.contains(&role) {
            return Err(DomainError::validation("role", "unknown admin role"));
        }
        let (target_id, _) = self.target_admin(email).await?;
        admin_users::add_role(self.global.conn(), target_id, role)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation => DomainError::conflict("role already assigned"),
                other => other.into(),
            })
    }

    /// # Errors
    /// `NotFound` when the admin or the membership does not exist.
    pub async fn remove_admin_role(&self, email: &str, role: &str) -> Result<(), DomainError> {
        let (target_id, _) = self.target_admin(email).await?;
        admin_users::remove_role(self.global.conn(), target_id, role)
            .await
            .map_err(DomainError::from)
    }
}
