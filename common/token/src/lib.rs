//! Signed access-token issuance and validation, plus opaque refresh tokens.
//!
//! Time and randomness are supplied by the caller: [`AccessTokenEncoder::encode`]
//! and [`TokenValidator::validate`] take `now` explicitly, and the encoder and
//! [`RefreshTokenGenerator`] draw from an injected CSPRNG. [`TokenService`] wires
//! them to a [`Clock`] and the OS RNG for everyday use.

pub mod claims;
pub mod clock;
pub mod config;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod refresh;
pub mod service;
pub mod validator;

pub use claims::{IdentityClaims, IdentityClaimsBuilder, RESERVED_CLAIMS};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{JwtSettings, SigningConfig};
pub use encoder::{AccessToken, AccessTokenEncoder, TokenStatus};
pub use error::{AuthResult, ClaimsError, ConfigError, ErrorBody, IssueError, TokenError};
pub use metrics::TokenMetrics;
pub use refresh::{RefreshToken, RefreshTokenGenerator};
pub use service::{IssuedTokens, TokenProvider, TokenService, TOKEN_TYPE_BEARER};
pub use validator::TokenValidator;
