//! Session tokens: HS256-signed JWTs carrying the user id, display name and roles.

use std::env;

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use quire_core::ports::{AuthError, TokenClaims, TokenService};

const DEVELOPMENT_SECRET: &str = "change-me-in-production";

/// Signing secret, token lifetime and issuer.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEVELOPMENT_SECRET.to_string(),
            expiration_hours: 24,
            issuer: "quire-admin".to_string(),
        }
    }
}

impl JwtConfig {
    /// Read `JWT_SECRET`, `JWT_EXPIRATION_HOURS` and `JWT_ISSUER`, keeping
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            secret: env::var("JWT_SECRET").unwrap_or(defaults.secret),
            expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|hours| hours.parse().ok())
                .unwrap_or(defaults.expiration_hours),
            issuer: env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        };
        config.report_weak_secret();
        config
    }

    fn has_weak_secret(&self) -> bool {
        self.secret.is_empty() || self.secret == DEVELOPMENT_SECRET
    }

    fn report_weak_secret(&self) {
        if !self.has_weak_secret() {
            return;
        }

        let production = matches!(env::var("RUST_ENV").as_deref(), Ok("production" | "prod"));
        if production {
            tracing::error!(
                issuer = %self.issuer,
                "JWT_SECRET is not set in production: session tokens can be forged"
            );
        } else {
            tracing::warn!(issuer = %self.issuer, "JWT_SECRET is not set, signing with the development secret");
        }
    }
}

/// Registered claims plus the session's name and roles.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    name: String,
    #[serde(default)]
    roles: Vec<String>,
    iss: String,
    iat: i64,
    exp: i64,
}

impl SessionClaims {
    fn into_token_claims(self) -> Result<TokenClaims, AuthError> {
        let user_id = self.sub.parse::<i64>().map_err(|_| {
            AuthError::InvalidToken(format!("subject `{}` is not a user id", self.sub))
        })?;

        Ok(TokenClaims {
            user_id,
            name: self.name,
            roles: self.roles,
            exp: self.exp,
        })
    }
}

fn rejection(err: JwtError) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidIssuer => {
            AuthError::InvalidToken("token was issued by another service".to_string())
        }
        _ => AuthError::InvalidToken(err.to_string()),
    }
}

/// [`TokenService`] backed by `jsonwebtoken`.
pub struct JwtTokenService {
    signing: EncodingKey,
    verifying: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            signing: EncodingKey::from_secret(config.secret.as_bytes()),
            verifying: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(
        &self,
        user_id: i64,
        name: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError> {
        let issued_at = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            name: name.to_string(),
            roles,
            iss: self.config.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + TimeDelta::hours(self.config.expiration_hours)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.signing)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<SessionClaims>(token, &self.verifying, &self.validation)
            .map_err(rejection)?
            .claims
            .into_token_claims()
    }
}
