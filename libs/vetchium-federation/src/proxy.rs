//! Cross-region request forwarding.
//!
//! Operations that consume single-use tokens are not globally idempotent, so
//! the proxy never retries; failures surface to the caller as 502. Bodies
//! are buffered and size-capped by the router's body-limit layer before they
//! reach this code.

use axum::body::{Body, Bytes};
use axum::response::Response;
use http::header::{HeaderMap, HeaderName};
use http::{Method, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to build proxy client: {0}")]
    Client(reqwest::Error),

    #[error("invalid peer URL: {0}")]
    BadUrl(String),

    #[error("peer request failed: {0}")]
    Request(reqwest::Error),
}

/// Headers that must not cross the proxy boundary: hop-by-hop headers plus
/// host and content-length, which the client recomputes.
const STRIPPED_HEADERS: &[HeaderName] = &[
    http::header::CONNECTION,
    http::header::HOST,
    http::header::CONTENT_LENGTH,
    http::header::PROXY_AUTHENTICATE,
    http::header::PROXY_AUTHORIZATION,
    http::header::TE,
    http::header::TRAILER,
    http::header::TRANSFER_ENCODING,
    http::header::UPGRADE,
];

fn sanitize_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        if STRIPPED_HEADERS.contains(name) || name.as_str() == "keep-alive" {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Forwards buffered requests to peer region nodes and relays the response
/// verbatim.
#[derive(Clone)]
pub struct RegionProxy {
    client: reqwest::Client,
}

impl RegionProxy {
    /// Build a proxy with the configured per-call deadline.
    ///
    /// # Errors
    /// Returns `ProxyError::Client` if the TLS backend fails to initialise.
    pub fn new(timeout: Duration) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProxyError::Client)?;
        Ok(Self { client })
    }

    /// Forward a buffered request to the peer at `base_url` and relay the
    /// response status, headers and body unchanged.
    ///
    /// # Errors
    /// Returns `ProxyError` on connection failure, timeout or a malformed
    /// peer URL. Callers map every variant to 502.
    pub async fn forward(
        &self,
        base_url: &Url,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Response, ProxyError> {
        let target = base_url
            .join(path_and_query)
            .map_err(|e| ProxyError::BadUrl(e.to_string()))?;

        tracing::debug!(method = %method, target = %target, "proxying request to peer region");

        let peer_response = self
            .client
            .request(method, target)
            .headers(sanitize_headers(headers))
            .body(body)
            .send()
            .await
            .map_err(ProxyError::Request)?;

        let status =
            StatusCode::from_u16(peer_response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let response_headers = sanitize_headers(peer_response.headers());
        let bytes = peer_response.bytes().await.map_err(ProxyError::Request)?;

        let mut builder = Response::builder().status(status);
        if let Some(headers_mut) = builder.headers_mut() {
            headers_mut.extend(response_headers);
        }
        builder
            .body(Body::from(bytes))
            .map_err(|e| ProxyError::BadUrl(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};

    #[test]
    fn sanitize_keeps_safe_headers_and_strips_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer IND1-abc"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(http::header::HOST, HeaderValue::from_static("local.node"));
        headers.insert(http::header::CONNECTION, HeaderValue::from_static("close"));
        headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(
            http::header::TRANSFER_ENCODING,
            HeaderValue::from_static("chunked"),
        );

        let out = sanitize_headers(&headers);
        assert_eq!(out.len(), 2);
        assert!(out.contains_key(AUTHORIZATION));
        assert!(out.contains_key(CONTENT_TYPE));
    }

    #[tokio::test]
    async fn forward_to_unreachable_peer_is_an_error() {
        let proxy = RegionProxy::new(Duration::from_millis(200)).unwrap();
        let base = Url::parse("http://127.0.0.1:1/").unwrap();
        let err = proxy
            .forward(
                &base,
                Method::POST,
                "/org/tfa",
                &HeaderMap::new(),
                Bytes::from_static(b"{}"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Request(_)));
    }
}
