use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::client::Db;
use crate::entities::admin_user_entity::{
    AdminCredential, AdminRole, AdminUser, AdminUserDbService,
};
use crate::entities::participation_entity::{
    ParticipationDbService, ParticipationStatus,
};
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxResult};
use crate::middleware::utils::string_utils::get_str_thing;
use crate::utils::hash::{hash_password, verify_password};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@concours.local";

#[derive(Debug, Deserialize, Validate)]
pub struct ProvisionAdminInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 12, message = "Password must be at least 12 characters"))]
    pub password: String,
    pub role: AdminRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ReconcileReport {
    pub backfilled: Vec<String>,
}

pub struct AdminService<'a> {
    admins_repository: AdminUserDbService<'a>,
    participations_repository: ParticipationDbService<'a>,
    ctx: &'a Ctx,
}

impl<'a> AdminService<'a> {
    pub fn new(db: &'a Db, ctx: &'a Ctx) -> Self {
        Self {
            admins_repository: AdminUserDbService { db, ctx },
            participations_repository: ParticipationDbService { db, ctx },
            ctx,
        }
    }

    /// Credential first, directory row second. A credential failure
    /// aborts the whole operation. A directory row failure is reported
    /// so reconciliation can backfill it later.
    pub async fn provision(&self, input: ProvisionAdminInput) -> CtxResult<AdminUser> {
        input.validate().map_err(|e| self.ctx.to_ctx_error(e.into()))?;
        let email = input.email.trim().to_lowercase();

        if self
            .admins_repository
            .get_credential_by_email(&email)
            .await?
            .is_some()
        {
            return Err(self.ctx.to_ctx_error(AppError::AdminEmailTaken));
        }

        let password_hash = hash_password(&input.password)
            .map_err(|source| self.ctx.to_ctx_error(AppError::Generic {
                description: source,
            }))?;
        let credential = self
            .admins_repository
            .create_credential(AdminCredential {
                id: None,
                email: email.clone(),
                password_hash,
                created_at: Utc::now(),
            })
            .await?;

        self.admins_repository
            .create_user(AdminUser {
                id: None,
                email,
                role: input.role,
                active: true,
                credential: credential.id,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                tracing::error!(
                    "admin credential created but directory row failed, reconcile later: {err:?}"
                );
                err
            })
    }

    pub async fn login(&self, input: AdminLoginInput) -> CtxResult<AdminUser> {
        input.validate().map_err(|e| self.ctx.to_ctx_error(e.into()))?;
        let email = input.email.trim().to_lowercase();

        let credential = self
            .admins_repository
            .get_credential_by_email(&email)
            .await?
            .ok_or(self.ctx.to_ctx_error(AppError::AuthenticationFail))?;

        if !verify_password(&credential.password_hash, &input.password) {
            return Err(self.ctx.to_ctx_error(AppError::AuthenticationFail));
        }

        let user = self
            .admins_repository
            .get_user_by_email(&email)
            .await?
            .ok_or(self.ctx.to_ctx_error(AppError::AuthenticationFail))?;
        if !user.active {
            return Err(self.ctx.to_ctx_error(AppError::Forbidden));
        }
        Ok(user)
    }

    /// Creates directory rows for credentials that lost theirs, the
    /// repair path for a half-finished provisioning.
    pub async fn reconcile(&self) -> CtxResult<ReconcileReport> {
        let orphans = self.admins_repository.credentials_without_user().await?;
        let mut backfilled = Vec::with_capacity(orphans.len());
        for credential in orphans {
            let email = credential.email.clone();
            self.admins_repository
                .create_user(AdminUser {
                    id: None,
                    email: email.clone(),
                    role: AdminRole::Admin,
                    active: true,
                    credential: credential.id,
                    created_at: Utc::now(),
                })
                .await?;
            backfilled.push(email);
        }
        Ok(ReconcileReport { backfilled })
    }

    pub async fn list(&self) -> CtxResult<Vec<AdminUser>> {
        self.admins_repository.list_users().await
    }

    pub async fn set_active(&self, id: &str, active: bool) -> CtxResult<AdminUser> {
        let thing = get_str_thing(id)?;
        self.admins_repository.set_active(thing, active).await
    }

    /// The logged in admin behind the current request, rejected when the
    /// account was deactivated after the cookie was issued.
    pub async fn require_admin(&self) -> CtxResult<AdminUser> {
        let admin_id = self.ctx.user_id()?;
        let user = self.admins_repository.get_user_by_id(&admin_id).await?;
        if !user.active {
            return Err(self.ctx.to_ctx_error(AppError::Forbidden));
        }
        Ok(user)
    }

    pub async fn require_super_admin(&self) -> CtxResult<AdminUser> {
        let user = self.require_admin().await?;
        if user.role != AdminRole::SuperAdmin {
            return Err(self.ctx.to_ctx_error(AppError::Forbidden));
        }
        Ok(user)
    }

    /// First-run super admin from the configured start password. A noop
    /// once the account exists.
    pub async fn create_default_admin(&self, start_password: &str) -> CtxResult<()> {
        if self
            .admins_repository
            .get_credential_by_email(DEFAULT_ADMIN_EMAIL)
            .await?
            .is_some()
        {
            return Ok(());
        }
        self.provision(ProvisionAdminInput {
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password: start_password.to_string(),
            role: AdminRole::SuperAdmin,
        })
        .await?;
        tracing::info!("created default super admin {DEFAULT_ADMIN_EMAIL}");
        Ok(())
    }

    pub async fn set_participation_status(
        &self,
        participation_id: &str,
        status: ParticipationStatus,
    ) -> CtxResult<crate::entities::participation_entity::Participation> {
        let thing = get_str_thing(participation_id)?;
        self.participations_repository.set_status(thing, status).await
    }
}
