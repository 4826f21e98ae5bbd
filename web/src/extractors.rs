//! Custom Axum extractors.
//!
//! - `CorrelationId`: request correlation id (header or fresh UUID)
//! - `ClientIp`: caller address from proxy headers, for audit logs
//! - `BearerToken`: the `Authorization: Bearer <token>` session token
//! - `AdminGuard`: a validated admin session; add it to a handler's
//!   arguments to make the route admin-only

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use kiosk_core::providers::KioskStore;
use kiosk_core::{AdminSession, SessionToken};
use std::net::{IpAddr, Ipv4Addr};
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Reuses the id stored by the correlation middleware when present, then the
/// `X-Correlation-ID` header, and generates a UUID v4 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .or_else(|| {
                parts
                    .headers
                    .get(CORRELATION_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| Uuid::parse_str(s).ok())
            })
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Client IP address.
///
/// First address of `X-Forwarded-For`, then `X-Real-IP`, then loopback.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(&parts.headers)))
    }
}

fn client_ip(headers: &HeaderMap) -> IpAddr {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header("X-Forwarded-For")
        .and_then(|forwarded| forwarded.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| header("X-Real-IP").and_then(|ip| ip.trim().parse().ok()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Session token from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct BearerToken(pub SessionToken);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("Invalid authorization format. Expected 'Bearer <token>'"))?;

        // Malformed tokens are indistinguishable from unknown ones.
        let token = token.parse::<SessionToken>().map_err(AppError::from)?;
        Ok(Self(token))
    }
}

/// A live admin session.
#[derive(Debug, Clone, Copy)]
pub struct AdminGuard(pub AdminSession);

#[async_trait]
impl<S: KioskStore> FromRequestParts<AppState<S>> for AdminGuard {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let session = state.kiosk.admin.validate(token).await?;
        Ok(Self(session))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut req = Request::builder();
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        req.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let header = uuid.to_string();
        let mut parts = parts(&[(CORRELATION_ID_HEADER, header.as_str())]);

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &()).await.unwrap();

        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn test_correlation_id_generates_new() {
        let mut parts = parts(&[(CORRELATION_ID_HEADER, "not-a-uuid")]);

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &()).await.unwrap();

        assert_ne!(correlation_id.0, Uuid::nil());
    }

    #[tokio::test]
    async fn test_client_ip_sources() {
        let mut forwarded = parts(&[("X-Forwarded-For", "203.0.113.1, 198.51.100.1")]);
        let mut real = parts(&[("X-Real-IP", "198.51.100.42")]);
        let mut neither = parts(&[]);

        assert_eq!(ClientIp::from_request_parts(&mut forwarded, &()).await.unwrap().0.to_string(), "203.0.113.1");
        assert_eq!(ClientIp::from_request_parts(&mut real, &()).await.unwrap().0.to_string(), "198.51.100.42");
        assert_eq!(ClientIp::from_request_parts(&mut neither, &()).await.unwrap().0.to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_bearer_token() {
        let token = SessionToken::generate();
        let bearer = format!("Bearer {token}");
        let mut valid = parts(&[("Authorization", bearer.as_str())]);
        let mut basic = parts(&[("Authorization", "Basic YWRtaW46YWRtaW4=")]);
        let mut garbage = parts(&[("Authorization", "Bearer not-a-token")]);
        let mut missing = parts(&[]);

        assert_eq!(BearerToken::from_request_parts(&mut valid, &()).await.unwrap().0, token);
        for parts in [&mut basic, &mut garbage, &mut missing] {
            let err = BearerToken::from_request_parts(parts, &()).await.unwrap_err();
            assert_eq!(err.status(), http::StatusCode::UNAUTHORIZED);
        }
    }
}
