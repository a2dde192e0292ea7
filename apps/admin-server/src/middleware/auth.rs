//! Authentication extractors.

use actix_web::http::{Uri, header};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use serde::Serialize;
use std::future::{Ready, ready};
use std::sync::Arc;

use quire_core::ports::{AuthError, TokenClaims, TokenService};

use super::error::AppError;

/// Cookie holding the session token for browser clients.
pub const TOKEN_COOKIE: &str = "quire_token";

/// Authenticated user identity extractor.
///
/// The token is read from `Authorization: Bearer <token>` first and from the
/// `quire_token` cookie otherwise. Cookie-authenticated requests that change
/// state must carry an `Origin` (or `Referer`) on this host, else they get 403:
/// ```ignore
/// async fn mine(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.name)
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub user_id: i64,
    pub name: String,
    pub roles: Vec<String>,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            name: claims.name,
            roles: claims.roles,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => {
                AppError::Unauthorized("Your session has expired. Please sign in again.".to_string())
            }
            AuthError::InvalidToken(msg) => AppError::Unauthorized(msg),
            AuthError::MissingAuth => AppError::Unauthorized(
                "Please sign in, or provide a Bearer token in the Authorization header."
                    .to_string(),
            ),
        }
    }
}

fn bearer_token(req: &HttpRequest) -> Result<Option<String>, AuthError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(|t| Some(t.trim().to_string()))
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credential {
    Bearer,
    Cookie,
}

fn authenticate(req: &HttpRequest) -> Result<(Identity, Credential), AuthError> {
    // Get token service from app data
    let Some(token_service) = req.app_data::<web::Data<Arc<dyn TokenService>>>() else {
        tracing::error!("TokenService not found in app data");
        return Err(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        ));
    };

    let (token, credential) = match bearer_token(req)? {
        Some(token) => (token, Credential::Bearer),
        None => req
            .cookie(TOKEN_COOKIE)
            .map(|c| (c.value().to_string(), Credential::Cookie))
            .ok_or(AuthError::MissingAuth)?,
    };

    let identity = token_service.validate_token(&token).map(Identity::from)?;
    Ok((identity, credential))
}

/// Whether the page that issued the request is served by this host.
/// `Origin` is preferred, `Referer` is the fallback for older browsers.
fn same_origin(req: &HttpRequest) -> bool {
    let headers = req.headers();
    let source = headers
        .get(header::ORIGIN)
        .or_else(|| headers.get(header::REFERER))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<Uri>().ok());

    match source.as_ref().and_then(Uri::authority) {
        Some(authority) => authority
            .as_str()
            .eq_ignore_ascii_case(req.connection_info().host()),
        None => false,
    }
}

fn identify(req: &HttpRequest) -> Result<Identity, AppError> {
    let (identity, credential) = authenticate(req).map_err(|e| {
        tracing::debug!(error = %e, path = %req.path(), "Authentication failed");
        AppError::from(e)
    })?;

    if credential == Credential::Cookie && !req.method().is_safe() && !same_origin(req) {
        tracing::warn!(
            user_id = identity.user_id,
            method = %req.method(),
            path = %req.path(),
            "Refused cross-origin request authenticated by cookie"
        );
        return Err(AppError::Forbidden);
    }

    Ok(identity)
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identify(req))
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalIdentity(
            authenticate(req).ok().map(|(identity, _)| identity),
        )))
    }
}
