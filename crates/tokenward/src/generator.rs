//! Secure random token generation.
//!
//! Stateful tokens are opaque random strings used directly as store keys.
//! Bytes come from the operating system CSPRNG; if it fails, the error is
//! returned and no weaker source is tried.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::TokenError;

/// Number of random bytes in a stateful token key.
pub const TOKEN_BYTE_LENGTH: usize = 32;

/// Number of random bytes in a generated signing secret.
pub const SIGNING_SECRET_BYTE_LENGTH: usize = 64;

/// Generates `byte_length` random bytes, encoded as unpadded base64url.
///
/// # Errors
///
/// Returns `TokenError::InvalidRequest` for a zero length and
/// `TokenError::Entropy` if the random source is unavailable.
pub fn generate_random_string(byte_length: usize) -> Result<String, TokenError> {
    if byte_length == 0 {
        return Err(TokenError::invalid_request(
            "random token length must be greater than zero",
        ));
    }

    let mut bytes = vec![0u8; byte_length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError::entropy(e.to_string()))?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generates a stateful token key of [`TOKEN_BYTE_LENGTH`] bytes.
///
/// # Errors
///
/// Returns `TokenError::Entropy` if the random source is unavailable.
pub fn generate_token_key() -> Result<String, TokenError> {
    generate_random_string(TOKEN_BYTE_LENGTH)
}

/// Generates a fresh HS512 signing secret.
///
/// # Errors
///
/// Returns `TokenError::Entropy` if the random source is unavailable.
pub fn generate_signing_secret() -> Result<String, TokenError> {
    generate_random_string(SIGNING_SECRET_BYTE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_key_length() {
        let key = generate_token_key().unwrap();

        // 32 bytes base64url encoded = 43 characters
        assert_eq!(key.len(), 43);
        assert!(
            key.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_token_key_uniqueness() {
        let keys: Vec<String> = (0..100).map(|_| generate_token_key().unwrap()).collect();

        let mut unique = keys.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(keys.len(), unique.len());
    }

    #[test]
    fn test_decodes_to_requested_length() {
        for len in [1, 16, 32, 64] {
            let encoded = generate_random_string(len).unwrap();
            let decoded = URL_SAFE_NO_PAD.decode(encoded).unwrap();
            assert_eq!(decoded.len(), len);
        }
    }

    #[test]
    fn test_zero_length_rejected() {
        let err = generate_random_string(0).unwrap_err();
        assert!(matches!(err, TokenError::InvalidRequest { .. }));
    }

    #[test]
    fn test_signing_secret_length() {
        // 64 bytes base64url encoded = 86 characters
        assert_eq!(generate_signing_secret().unwrap().len(), 86);
    }
}
