//! Session middleware and cross-region request forwarding.
//!
//! Org routes carry region-prefixed session tokens: the middleware parses
//! the prefix, forwards the whole request to the owning region when it is
//! not local, and otherwise resolves the caller context. Admin routes carry
//! bare tokens and always resolve locally against the global plane.

use axum::body::{to_bytes, Bytes};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::Method;
use vetchium_federation::{token, RegionCode};

use super::error::ApiError;
use super::routes::ApiState;
use crate::domain::context::{load_admin_context, load_org_context};

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_owned())
    }
}

/// Forward a fully buffered request to the peer node owning `region`.
pub(crate) async fn forward_to_region(
    state: &ApiState,
    region: &RegionCode,
    method: Method,
    path_and_query: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let base_url = state
        .registry
        .base_url(region)
        .map_err(|_| ApiError::unauthorized())?;
    state
        .proxy
        .forward(base_url, method, path_and_query, headers, body)
        .await
        .map_err(|e| {
            tracing::warn!(region = %region, error = %e, "cross-region proxy failed");
            ApiError::bad_gateway()
        })
}

async fn proxy_whole_request(
    state: &ApiState,
    region: &RegionCode,
    req: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, state.body_limit)
        .await
        .map_err(|_| ApiError::payload_too_large())?;
    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());
    forward_to_region(state, region, parts.method, &path_and_query, &parts.headers, bytes).await
}

pub async fn org_auth(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    match org_auth_inner(&state, req, next).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn org_auth_inner(
    state: &ApiState,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let wire = bearer_token(req.headers()).ok_or_else(ApiError::unauthorized)?;
    let (region, bare) =
        token::parse_prefixed(&wire, &state.registry).map_err(|_| ApiError::unauthorized())?;

    if !state.registry.is_local(&region) {
        return proxy_whole_request(state, &region, req).await;
    }

    let ctx = load_org_context(&state.global, &state.registry, &region, &bare).await?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

pub async fn admin_auth(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    match admin_auth_inner(&state, req, next).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn admin_auth_inner(
    state: &ApiState,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let wire = bearer_token(req.headers()).ok_or_else(ApiError::unauthorized)?;
    if !token::is_bare(&wire) {
        return Err(ApiError::unauthorized());
    }
    let ctx = load_admin_context(&state.global, &wire).await?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::AUTHORIZATION;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, "Bearer IND1-abc".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("IND1-abc"));

        headers.insert(AUTHORIZATION, "Basic xyz".parse().unwrap());
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(bearer_token(&headers).is_none());
    }
}
