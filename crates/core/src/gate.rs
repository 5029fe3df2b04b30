//! Authenticated request gate.
//!
//! Every mutating request passes through [`AuthGate::authorize`] before any
//! side effect. There is no session: each call re-verifies the bearer token.

use quill_shared::{Claims, JwtError, JwtService};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::media::MediaError;

/// Gate rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// No `Authorization` header.
    #[error("authorization header with bearer token is required")]
    MissingToken,

    /// Header present but not a bearer credential.
    #[error("authorization header is not a bearer token")]
    Malformed,

    /// Token past its expiry.
    #[error("token has expired")]
    Expired,

    /// Signature, audience or claims invalid.
    #[error("invalid token: {0}")]
    Invalid(String),
}

impl GateError {
    /// Stable code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::Malformed => "malformed_token",
            Self::Expired => "token_expired",
            Self::Invalid(_) => "invalid_token",
        }
    }
}

impl From<GateError> for MediaError {
    fn from(err: GateError) -> Self {
        Self::Unauthorized(err.to_string())
    }
}

/// The verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Identity provider user id.
    pub user_id: Uuid,
    /// Email, when the token carries one.
    pub email: Option<String>,
    /// Role claim.
    pub role: String,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Result of evaluating a request's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// No credentials presented.
    Anonymous,
    /// Credentials verified.
    Authenticated(Principal),
}

/// Verifies bearer tokens issued by the identity provider.
pub trait TokenVerifier: Send + Sync {
    /// Verify a token and return the caller it identifies.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Expired` or `GateError::Invalid`.
    fn verify(&self, token: &str) -> Result<Principal, GateError>;
}

impl From<JwtError> for GateError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::Expired,
            other => Self::Invalid(other.to_string()),
        }
    }
}

impl TokenVerifier for JwtService {
    fn verify(&self, token: &str) -> Result<Principal, GateError> {
        Ok(self.validate_token(token)?.into())
    }
}

/// Bearer-token gate in front of mutating operations.
#[derive(Debug, Clone)]
pub struct AuthGate<V: TokenVerifier> {
    verifier: V,
}

impl<V: TokenVerifier> AuthGate<V> {
    /// Create a gate around a verifier.
    #[must_use]
    pub const fn new(verifier: V) -> Self {
        Self { verifier }
    }

    /// Classify a request by its `Authorization` header value.
    ///
    /// A missing header is [`GateState::Anonymous`]; a present one must verify.
    ///
    /// # Errors
    ///
    /// Returns a `GateError` if a header is present but unusable.
    pub fn evaluate(&self, header: Option<&str>) -> Result<GateState, GateError> {
        let Some(header) = header else {
            return Ok(GateState::Anonymous);
        };
        let token = bearer_token(header).ok_or(GateError::Malformed)?;
        let principal = self.verifier.verify(token)?;
        debug!(user_id = %principal.user_id, "Request authenticated");
        Ok(GateState::Authenticated(principal))
    }

    /// Require an authenticated caller.
    ///
    /// # Errors
    ///
    /// Returns `GateError::MissingToken` for anonymous requests, or the
    /// verification failure.
    pub fn authorize(&self, header: Option<&str>) -> Result<Principal, GateError> {
        match self.evaluate(header)? {
            GateState::Authenticated(principal) => Ok(principal),
            GateState::Anonymous => Err(GateError::MissingToken),
        }
    }
}

/// Extract the token from a `Bearer` credential.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
