//! Admin-portal handlers. Single-plane: no proxying, bare tokens.

use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::Json;
use vetchium_store::types::roles;

use super::dto::{
    AdminCompletePasswordResetRequest, AdminCompleteSetupRequest, AdminInviteRequest,
    AdminLoginRequest, AdminMyInfoResponse, AdminPasswordResetRequest, AdminRoleRequest,
    AdminTargetRequest, AdminTfaVerifyRequest, MessageResponse, SessionResponse, TfaResponse,
    PASSWORD_RESET_GENERIC_MESSAGE,
};
use super::error::ApiResult;
use super::routes::ApiState;
use crate::domain::context::AdminContext;

pub async fn login(
    State(state): State<ApiState>,
    Json(req): Json<AdminLoginRequest>,
) -> ApiResult<Json<TfaResponse>> {
    let grant = state.admin.login(&req.email, &req.password).await?;
    Ok(Json(TfaResponse::from(grant)))
}

pub async fn tfa(
    State(state): State<ApiState>,
    Json(req): Json<AdminTfaVerifyRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let grant = state.admin.verify_tfa(&req.tfa_token, &req.tfa_code).await?;
    Ok(Json(SessionResponse::from(grant)))
}

pub async fn my_info(Extension(ctx): Extension<AdminContext>) -> Json<AdminMyInfoResponse> {
    Json(AdminMyInfoResponse::from(&ctx))
}

pub async fn logout(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AdminContext>,
) -> ApiResult<StatusCode> {
    state.admin.logout(&ctx).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn invite_admin(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AdminContext>,
    Json(req): Json<AdminInviteRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    ctx.require_role(roles::ADMIN_MANAGE_ADMINS)?;
    state.admin.invite_admin(&req.email).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("invitation sent")),
    ))
}

pub async fn complete_setup(
    State(state): State<ApiState>,
    Json(req): Json<AdminCompleteSetupRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .admin
        .complete_setup(
            &req.invitation_token,
            &req.full_name,
            &req.password,
            req.preferred_language.as_deref(),
        )
        .await?;
    Ok(Json(MessageResponse::new("account ready; log in to continue")))
}

pub async fn request_password_reset(
    State(state): State<ApiState>,
    Json(req): Json<AdminPasswordResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.admin.request_password_reset(&req.email).await?;
    Ok(Json(MessageResponse::new(PASSWORD_RESET_GENERIC_MESSAGE)))
}

pub async fn complete_password_reset(
    State(state): State<ApiState>,
    Json(req): Json<AdminCompletePasswordResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .admin
        .complete_password_reset(&req.reset_token, &req.password)
        .await?;
    Ok(Json(MessageResponse::new("password updated")))
}

pub async fn disable_admin(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AdminContext>,
    Json(req): Json<AdminTargetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ctx.require_role(roles::ADMIN_MANAGE_ADMINS)?;
    state.admin.disable_admin(&req.email).await?;
    Ok(Json(MessageResponse::new("admin disabled")))
}

pub async fn enable_admin(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AdminContext>,
    Json(req): Json<AdminTargetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ctx.require_role(roles::ADMIN_MANAGE_ADMINS)?;
    state.admin.enable_admin(&req.email).await?;
    Ok(Json(MessageResponse::new("admin enabled")))
}

pub async fn add_admin_role(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AdminContext>,
    Json(req): Json<AdminRoleRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    ctx.require_role(roles::ADMIN_MANAGE_ADMINS)?;
    state.admin.add_admin_role(&req.email, &req.role).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("role assigned")),
    ))
}

pub async fn remove_admin_role(
    State(state): State<ApiState>,
    Extension(ctx): Extension<AdminContext>,
    Json(req): Json<AdminRoleRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ctx.require_role(roles::ADMIN_MANAGE_ADMINS)?;
    state.admin.remove_admin_role(&req.email, &req.role).await?;
    Ok(Json(MessageResponse::new("role removed")))
}
