use common_crypto::{decode_credential, encode_credential, fill_entropy, fingerprint, CryptoError, ENTROPY_LENGTH};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// Opaque refresh credential. Carries no identity; binding it to a subject is up to the caller.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RefreshToken(String);

impl RefreshToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The raw random bytes behind the token.
    pub fn entropy(&self) -> Result<[u8; ENTROPY_LENGTH], CryptoError> {
        decode_credential(&self.0)
    }

    /// SHA-256 hex digest, suitable as a lookup key in a caller-owned store.
    pub fn fingerprint(&self) -> String {
        fingerprint(self.0.as_bytes())
    }
}

impl From<String> for RefreshToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for RefreshToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RefreshToken").field(&"***redacted***").finish()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshTokenGenerator;

impl RefreshTokenGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate<R>(&self, rng: &mut R) -> RefreshToken
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        RefreshToken(encode_credential(&fill_entropy(rng)))
    }

    /// Generate from the operating system's CSPRNG.
    pub fn generate_default(&self) -> RefreshToken {
        self.generate(&mut OsRng)
    }
}
