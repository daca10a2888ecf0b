use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

/// Smallest HMAC key accepted for token signing (128-bit security).
pub const MIN_SECRET_LENGTH: usize = 16;
/// Number of random bytes behind every opaque credential.
pub const ENTROPY_LENGTH: usize = 32;

/// Errors produced by the common-crypto helpers.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("secret too short: expected at least {expected} bytes, got {actual}")]
    SecretTooShort { expected: usize, actual: usize },
    #[error("invalid entropy length: expected {expected} bytes, got {actual}")]
    InvalidEntropyLength { expected: usize, actual: usize },
    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}

/// Symmetric signing secret. Wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    /// Construct a secret from raw bytes, enforcing [`MIN_SECRET_LENGTH`].
    pub fn from_bytes<B>(bytes: B) -> Result<Self, CryptoError>
    where
        B: AsRef<[u8]>,
    {
        let slice = bytes.as_ref();
        if slice.len() < MIN_SECRET_LENGTH {
            return Err(CryptoError::SecretTooShort {
                expected: MIN_SECRET_LENGTH,
                actual: slice.len(),
            });
        }
        Ok(Self(Zeroizing::new(slice.to_vec())))
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecret")
            .field("bytes", &"***redacted***")
            .finish()
    }
}

/// Draw [`ENTROPY_LENGTH`] bytes from the supplied CSPRNG.
pub fn fill_entropy<R>(rng: &mut R) -> [u8; ENTROPY_LENGTH]
where
    R: RngCore + CryptoRng + ?Sized,
{
    let mut bytes = [0u8; ENTROPY_LENGTH];
    rng.fill_bytes(&mut bytes);
    bytes
}

/// Draw [`ENTROPY_LENGTH`] bytes from the operating system.
pub fn os_entropy() -> [u8; ENTROPY_LENGTH] {
    fill_entropy(&mut OsRng)
}

/// Printable, URL-safe text form of raw credential bytes.
pub fn encode_credential(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Recover the raw bytes behind an opaque credential produced by [`encode_credential`].
pub fn decode_credential(value: &str) -> Result<[u8; ENTROPY_LENGTH], CryptoError> {
    let decoded = URL_SAFE_NO_PAD.decode(value.trim())?;
    if decoded.len() != ENTROPY_LENGTH {
        return Err(CryptoError::InvalidEntropyLength {
            expected: ENTROPY_LENGTH,
            actual: decoded.len(),
        });
    }
    let mut array = [0u8; ENTROPY_LENGTH];
    array.copy_from_slice(&decoded);
    Ok(array)
}

/// SHA-256 hex digest of a credential, for callers that index stored credentials
/// without keeping the plaintext.
pub fn fingerprint(value: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn short_secret_rejected() {
        let err = SigningSecret::from_bytes(b"too-short").expect_err("short secret");
        match err {
            CryptoError::SecretTooShort { expected, actual } => {
                assert_eq!(expected, MIN_SECRET_LENGTH);
                assert_eq!(actual, 9);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = SigningSecret::from_bytes(b"s3cr3t-key-32-bytes-min").expect("secret");
        let rendered = format!("{secret:?}");
        assert!(rendered.contains("redacted"));
        assert!(!rendered.contains("s3cr3t"));
        assert_eq!(secret.len(), 23);
    }

    #[test]
    fn credential_encoding_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        let bytes = fill_entropy(&mut rng);
        let encoded = encode_credential(&bytes);
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
        assert_eq!(decode_credential(&encoded).expect("decode"), bytes);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let encoded = encode_credential(&[1u8; 8]);
        let err = decode_credential(&encoded).expect_err("wrong length");
        assert!(matches!(
            err,
            CryptoError::InvalidEntropyLength {
                expected: ENTROPY_LENGTH,
                actual: 8
            }
        ));
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = fingerprint(b"refresh-a");
        let b = fingerprint(b"refresh-a");
        let c = fingerprint(b"refresh-b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn os_entropy_differs() {
        assert_ne!(os_entropy(), os_entropy());
    }
}
