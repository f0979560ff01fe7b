//! Org-portal handlers.
//!
//! Handlers whose region is only knowable from a token in the body buffer
//! the raw bytes, decide locality, and either forward the bytes verbatim to
//! the owning region or run locally.

use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::Method;
use serde::de::DeserializeOwned;
use vetchium_federation::token;
use vetchium_store::types::roles;

use super::dto::{
    domain_status_str, ClaimDomainRequest, ClaimDomainResponse, CompleteInviteRequest,
    CompletePasswordResetRequest, CompleteSignupRequest, InitSignupRequest, InviteUserRequest,
    LoginRequest, MessageResponse, OrgMyInfoResponse, PasswordResetRequest, SessionResponse,
    TfaResponse, TfaVerifyRequest, UserRoleRequest, UserTargetRequest, VerifyDomainRequest,
    VerifyDomainResponse, PASSWORD_RESET_GENERIC_MESSAGE,
};
use super::error::{ApiError, ApiResult};
use super::middleware::forward_to_region;
use super::routes::ApiState;
use crate::domain::context::OrgContext;

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::malformed_body())
}

pub async fn init_signup(
    State(state): State<ApiState>,
    Json(req): Json<InitSignupRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.org.init_signup(&req.email, &req.home_region).await?;
    Ok(Json(MessageResponse::new(
        "verification email sent; publish the TXT record to continue",
    )))
}

pub async fn complete_signup(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let req: CompleteSignupRequest = parse_body(&body)?;
    let region = state.org.signup_token_region(&req.signup_token).await?;
    if !state.registry.is_local(&region) {
        return forward_to_region(
            &state,
            &region,
            Method::POST,
            "/org/complete-signup",
            &headers,
            body,
        )
        .await;
    }

    let grant = state
        .org
        .complete_signup(
            &req.signup_token,
            &req.password,
            req.preferred_language.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(grant))).into_response())
}

pub async fn login(
    State(state): State<ApiState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TfaResponse>> {
    let grant = state.org.login(&req.email, &req.domain, &req.password).await?;
    Ok(Json(TfaResponse::from(grant)))
}

pub async fn tfa(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let req: TfaVerifyRequest = parse_body(&body)?;
    let (region, bare) = token::parse_prefixed(&req.tfa_token, &state.registry)
        .map_err(|_| ApiError::unauthorized())?;
    if !state.registry.is_local(&region) {
        return forward_to_region(&state, &region, Method::POST, "/org/tfa", &headers, body).await;
    }

    let grant = state
        .org
        .verify_tfa(&region, &bare, &req.tfa_code, req.remember_me)
        .await?;
    Ok(Json(SessionResponse::from(grant)).into_response())
}

pub async fn my_info(Extension(ctx): Extension<OrgContext>) -> Json<OrgMyInfoResponse> {
    Json(OrgMyInfoResponse::from(&ctx))
}

pub async fn logout(
    State(state): State<ApiState>,
    Extension(ctx): Extension<OrgContext>,
) -> ApiResult<StatusCode> {
    state.org.logout(&ctx).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn invite_user(
    State(state): State<ApiState>,
    Extension(ctx): Extension<OrgContext>,
    Json(req): Json<InviteUserRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    ctx.require_role(roles::EMPLOYER_INVITE_USERS)?;
    state.org.invite_user(&ctx, &req.email).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("invitation sent")),
    ))
}

pub async fn complete_invite(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let req: CompleteInviteRequest = parse_body(&body)?;
    let (region, bare) = token::parse_prefixed(&req.invitation_token, &state.registry)
        .map_err(|_| ApiError::unauthorized())?;
    if !state.registry.is_local(&region) {
        return forward_to_region(
            &state,
            &region,
            Method::POST,
            "/org/complete-invite",
            &headers,
            body,
        )
        .await;
    }

    state
        .org
        .complete_invite(
            &region,
            &bare,
            &req.full_name,
            &req.password,
            req.preferred_language.as_deref(),
        )
        .await?;
    Ok(Json(MessageResponse::new("account ready; log in to continue")).into_response())
}

pub async fn request_password_reset(
    State(state): State<ApiState>,
    Json(req): Json<PasswordResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .org
        .request_password_reset(&req.email, &req.domain)
        .await?;
    Ok(Json(MessageResponse::new(PASSWORD_RESET_GENERIC_MESSAGE)))
}

pub async fn complete_password_reset(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let req: CompletePasswordResetRequest = parse_body(&body)?;
    let (region, bare) = token::parse_prefixed(&req.reset_token, &state.registry)
        .map_err(|_| ApiError::unauthorized())?;
    if !state.registry.is_local(&region) {
        return forward_to_region(
            &state,
            &region,
            Method::POST,
            "/org/complete-password-reset",
            &headers,
            body,
        )
        .await;
    }

    state
        .org
        .complete_password_reset(&region, &bare, &req.password)
        .await?;
    Ok(Json(MessageResponse::new("password updated")).into_response())
}

pub async fn disable_user(
    State(state): State<ApiState>,
    Extension(ctx): Extension<OrgContext>,
    Json(req): Json<UserTargetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ctx.require_role(roles::EMPLOYER_MANAGE_USERS)?;
    state.org.disable_user(&ctx, &req.email).await?;
    Ok(Json(MessageResponse::new("user disabled")))
}

pub async fn enable_user(
    State(state): State<ApiState>,
    Extension(ctx): Extension<OrgContext>,
    Json(req): Json<UserTargetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ctx.require_role(roles::EMPLOYER_MANAGE_USERS)?;
    state.org.enable_user(&ctx, &req.email).await?;
    Ok(Json(MessageResponse::new("user enabled")))
}

pub async fn add_user_role(
    State(state): State<ApiState>,
    Extension(ctx): Extension<OrgContext>,
    Json(req): Json<UserRoleRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    ctx.require_role(roles::EMPLOYER_MANAGE_USERS)?;
    state.org.add_user_role(&ctx, &req.email, &req.role).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("role assigned")),
    ))
}

pub async fn remove_user_role(
    State(state): State<ApiState>,
    Extension(ctx): Extension<OrgContext>,
    Json(req): Json<UserRoleRequest>,
) -> ApiResult<Json<MessageResponse>> {
    ctx.require_role(roles::EMPLOYER_MANAGE_USERS)?;
    state
        .org
        .remove_user_role(&ctx, &req.email, &req.role)
        .await?;
    Ok(Json(MessageResponse::new("role removed")))
}

pub async fn claim_domain(
    State(state): State<ApiState>,
    Extension(ctx): Extension<OrgContext>,
    Json(req): Json<ClaimDomainRequest>,
) -> ApiResult<(StatusCode, Json<ClaimDomainResponse>)> {
    ctx.require_role(roles::EMPLOYER_MANAGE_USERS)?;
    let domain = req.domain.trim().to_ascii_lowercase();
    if domain.is_empty() || !domain.contains('.') {
        return Err(crate::domain::error::DomainError::validation(
            "domain",
            "not a valid domain name",
        )
        .into());
    }

    let outcome = state
        .verification
        .claim(&ctx.region, ctx.employer_id, &domain)
        .await
        .map_err(crate::domain::error::DomainError::from)?;
    Ok((
        StatusCode::CREATED,
        Json(ClaimDomainResponse {
            domain,
            verification_token: outcome.verification_token,
            token_expires_at: outcome.token_expires_at,
        }),
    ))
}

pub async fn verify_domain(
    State(state): State<ApiState>,
    Extension(ctx): Extension<OrgContext>,
    Json(req): Json<VerifyDomainRequest>,
) -> ApiResult<Json<VerifyDomainResponse>> {
    ctx.require_role(roles::EMPLOYER_MANAGE_USERS)?;
    let domain = req.domain.trim().to_ascii_lowercase();
    let status = state
        .verification
        .verify(&ctx.region, ctx.employer_id, &domain)
        .await
        .map_err(crate::domain::error::DomainError::from)?;
    Ok(Json(VerifyDomainResponse {
        domain,
        status: domain_status_str(status).to_owned(),
    }))
}
