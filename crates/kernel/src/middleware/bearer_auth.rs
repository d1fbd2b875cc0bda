//! Bearer token authentication middleware.
//!
//! Tokens are issued elsewhere. This layer only checks the HS256 signature,
//! expiry and (optionally) issuer, then turns the claims into a [`Subject`]
//! stored in request extensions.

use std::convert::Infallible;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::permissions::{Role, Subject};
use crate::state::AppState;

/// Claims carried by a subject token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectClaims {
    /// Subject ID (UUID string).
    pub sub: String,
    /// `USER` or `ADMIN`.
    pub role: String,
    /// Expiry (seconds since the epoch).
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Verifies subject tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for HMAC-SHA256 tokens.
    pub fn new(jwt_secret: &[u8], issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret),
            validation,
        }
    }

    /// Verify a token and return the subject it names.
    pub fn verify(&self, token: &str) -> Result<Subject> {
        let data = jsonwebtoken::decode::<SubjectClaims>(token, &self.decoding_key, &self.validation)
            .context("invalid token")?;
        let claims = data.claims;

        let id = claims
            .sub
            .parse::<Uuid>()
            .with_context(|| format!("invalid subject id {:?}", claims.sub))?;
        let role = claims.role.parse::<Role>()?;
        Ok(Subject { id, role })
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.validation.iss)
            .finish()
    }
}

/// Middleware to authenticate Bearer JWT tokens.
///
/// If a valid Bearer token is present, stores its [`Subject`] in request
/// extensions. If no token is present, passes through without modification.
/// If an invalid token is present, returns 401.
pub async fn authenticate_bearer_token(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    let Some(auth_header) = auth_header else {
        return next.run(request).await;
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return next.run(request).await;
    };

    let subject = match state.tokens().verify(token.trim()) {
        Ok(subject) => subject,
        Err(e) => {
            debug!(error = %format!("{e:#}"), "invalid bearer token");
            return (
                StatusCode::UNAUTHORIZED,
                [("WWW-Authenticate", "Bearer error=\"invalid_token\"")],
                axum::Json(serde_json::json!({ "error": "invalid token" })),
            )
                .into_response();
        }
    };

    request.extensions_mut().insert(subject);
    next.run(request).await
}

/// Handlers take the caller as a `Subject`; requests without a verified
/// token act as the anonymous subject.
impl<S> FromRequestParts<S> for Subject
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Subject>()
            .copied()
            .unwrap_or_else(Subject::anonymous))
    }
}
