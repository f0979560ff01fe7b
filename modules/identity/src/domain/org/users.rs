//! Org user administration: disable/enable and role membership.
//!
//! The last-superadmin guard locks the employer's ACTIVE superadmin rows
//! inside the same regional transaction that performs the mutation, so two
//! concurrent disables cannot both observe "there is another one left".

use uuid::Uuid;
use vetchium_db::DbError;
use vetchium_store::global::org_users;
use vetchium_store::regional::{org_users as regional_users, tokens};
use vetchium_store::types::{roles, UserStatus};

use super::{email_domain, OrgAuthService};
use crate::domain::context::OrgContext;
use crate::domain::error::DomainError;
use vetchium_federation::token;

impl OrgAuthService {
    async fn target_user_id(
        &self,
        ctx: &OrgContext,
        email: &str,
    ) -> Result<(Uuid, UserStatus), DomainError> {
        email_domain(email)?;
        let email_hash = token::hash_email(email);
        let user = org_users::find_by_email_hash(self.global.conn(), &email_hash, ctx.employer_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        Ok((user.id, user.status))
    }

    /// Disable a teammate. The regional transaction owns the guard and the
    /// authoritative mutation; the global projection follows afterwards so
    /// routing and middleware observe the change.
    ///
    /// # Errors
    /// `NotFound` for unknown users, `InvalidState` when already disabled
    /// or when the target is the last active superadmin.
    pub async fn disable_user(&self, ctx: &OrgContext, email: &str) -> Result<(), DomainError> {
        let (target_id, status) = self.target_user_id(ctx, email).await?;
        if status == UserStatus::Disabled {
            return Err(DomainError::invalid_state("user is already disabled"));
        }

        let regional_db = self.regional(&ctx.region)?;
        let employer_id = ctx.employer_id;
        regional_db
            .with_tx(move |tx| {
                Box::pin(async move {
                    let superadmins = regional_users::lock_active_role_members(
                        tx,
                        employer_id,
                        roles::EMPLOYER_SUPERADMIN,
                    )
                    .await?;
                    let target_is_superadmin = superadmins.iter().any(|m| m.id == target_id);
                    if target_is_superadmin && superadmins.len() <= 1 {
                        return Err(DomainError::invalid_state(
                            "Cannot disable last admin user",
                        ));
                    }
                    regional_users::set_status(tx, target_id, UserStatus::Disabled).await?;
                    tokens::delete_sessions_for(tx, target_id)
                        .await
                        .map_err(DomainError::from)
                })
            })
            .await?;

        org_users::set_status(self.global.conn(), target_id, UserStatus::Disabled).await?;
        tracing::info!(user_id = %target_id, "org user disabled");
        Ok(())
    }

    /// # Errors
    /// `NotFound` for unknown users, `InvalidState` unless currently
    /// disabled.
    pub async fn enable_user(&self, ctx: &OrgContext, email: &str) -> Result<(), DomainError> {
        let (target_id, status) = self.target_user_id(ctx, email).await?;
        if status != UserStatus::Disabled {
            return Err(DomainError::invalid_state("user is not disabled"));
        }

        let regional_db = self.regional(&ctx.region)?;
        regional_users::set_status(regional_db.conn(), target_id, UserStatus::Active).await?;
        org_users::set_status(self.global.conn(), target_id, UserStatus::Active).await?;
        Ok(())
    }

    /// # Errors
    /// `Validation` for roles outside the employer catalogue, `NotFound`
    /// for unknown users, `Conflict` when already assigned.
    pub async fn add_user_role(
        &self,
        ctx: &OrgContext,
        email: &str,
        role: &str,
    ) -> Result<(), DomainError> {
        if !roles::EMPLOYER_CATALOGUE.contains(&role) {
            return Err(DomainError::validation("role", "unknown employer role"));
        }
        let (target_id, _) = self.target_user_id(ctx, email).await?;
        let regional_db = self.regional(&ctx.region)?;
        regional_users::add_role(regional_db.conn(), target_id, role)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation => DomainError::conflict("role already assigned"),
                other => other.into(),
            })
    }

    /// Removing `employer:superadmin` honours the same locked guard as
    /// disable: the employer must keep at least one active superadmin.
    ///
    /// # Errors
    /// `NotFound` when the user or membership does not exist,
    /// `InvalidState` for the last superadmin.
    pub async fn remove_user_role(
        &self,
        ctx: &OrgContext,
        email: &str,
        role: &str,
    ) -> Result<(), DomainError> {
        let (target_id, _) = self.target_user_id(ctx, email).await?;
        let regional_db = self.regional(&ctx.region)?;

        if role == roles::EMPLOYER_SUPERADMIN {
            let employer_id = ctx.employer_id;
            let role = role.to_owned();
            return regional_db
                .with_tx(move |tx| {
                    Box::pin(async move {
                        let superadmins = regional_users::lock_active_role_members(
                            tx,
                            employer_id,
                            roles::EMPLOYER_SUPERADMIN,
                        )
                        .await?;
                        let target_is_superadmin = superadmins.iter().any(|m| m.id == target_id);
                        if target_is_superadmin && superadmins.len() <= 1 {
                            return Err(DomainError::invalid_state(
                                "Cannot remove the last superadmin role",
                            ));
                        }
                        regional_users::remove_role(tx, target_id, &role)
                            .await
                            .map_err(DomainError::from)
                    })
                })
                .await;
        }

        regional_users::remove_role(regional_db.conn(), target_id, role)
            .await
            .map_err(DomainError::from)
    }
}
