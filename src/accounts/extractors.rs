use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{config::OperatorConfig, error::AccountError, state::AppState};

type OperatorRejection = (StatusCode, [(header::HeaderName, &'static str); 1], &'static str);

fn unauthorized(message: &'static str) -> OperatorRejection {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, r#"Basic realm="usuarios""#)],
        message,
    )
}

/// Reads `Authorization: Basic <base64(user:password)>`.
pub(crate) fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value
        .strip_prefix("Basic ")
        .or_else(|| value.strip_prefix("basic "))?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Guard for the operator-only user routes.
#[derive(Debug)]
pub struct OperatorAuth(pub String);

impl OperatorAuth {
    fn check(headers: &HeaderMap, operator: &OperatorConfig) -> Result<Self, OperatorRejection> {
        let (user, password) = basic_credentials(headers)
            .ok_or_else(|| unauthorized("missing or malformed Basic credentials"))?;
        let user_ok = constant_time_eq(&user, &operator.username);
        let password_ok = constant_time_eq(&password, &operator.password);
        if !(user_ok & password_ok) {
            warn!(user = %user, "operator credential rejected");
            return Err(unauthorized("invalid operator credentials"));
        }
        Ok(OperatorAuth(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OperatorAuth {
    type Rejection = OperatorRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Self::check(&parts.headers, &state.config.operator)
    }
}

/// JSON body whose decoding failures surface as [`AccountError::InvalidInput`]
/// instead of axum's plain-text rejection.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AccountError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                warn!(status = %rejection.status(), "request body rejected");
                Err(AccountError::invalid("malformed request body"))
            }
        }
    }
}
