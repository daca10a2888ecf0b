use common_crypto::CryptoError;
use jsonwebtoken::errors::ErrorKind;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, TokenError>;

/// Reasons a presented token is rejected. The first failing check wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token issuer does not match")]
    IssuerMismatch,
    #[error("token audience does not match")]
    AudienceMismatch,
    #[error("token has expired")]
    Expired,
    #[error("token missing required claim '{0}'")]
    MissingClaim(&'static str),
}

impl TokenError {
    /// Stable machine-readable code for structured error reports.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed => "AUTH_TOKEN_MALFORMED",
            TokenError::InvalidSignature => "AUTH_TOKEN_SIGNATURE",
            TokenError::IssuerMismatch => "AUTH_TOKEN_ISSUER",
            TokenError::AudienceMismatch => "AUTH_TOKEN_AUDIENCE",
            TokenError::Expired => "AUTH_TOKEN_EXPIRED",
            TokenError::MissingClaim(_) => "AUTH_TOKEN_CLAIMS",
        }
    }

    /// Low-cardinality label used for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::IssuerMismatch => "issuer_mismatch",
            TokenError::AudienceMismatch => "audience_mismatch",
            TokenError::Expired => "expired",
            TokenError::MissingClaim(_) => "missing_claim",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        match value.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => Self::InvalidSignature,
            _ => Self::Malformed,
        }
    }
}

/// Configuration rejected at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid signing secret: {0}")]
    Secret(#[from] CryptoError),
    #[error("issuer must not be empty")]
    EmptyIssuer,
    #[error("audience must not be empty")]
    EmptyAudience,
    #[error("token lifetime must be a positive whole number of seconds")]
    InvalidTtl,
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("environment variable {key} has invalid value '{value}'")]
    InvalidVar { key: &'static str, value: String },
}

/// Identity rejected at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("'{0}' collides with a reserved claim name")]
    ReservedName(String),
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign access token: {0}")]
    Signing(String),
    #[error("issue time out of range")]
    InvalidTimestamp,
}

impl From<jsonwebtoken::errors::Error> for IssueError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::Signing(value.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl From<&TokenError> for ErrorBody {
    fn from(value: &TokenError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}
