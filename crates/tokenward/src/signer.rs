//! JWT signing and verification.
//!
//! Tokens are compact JWS strings signed with HS512 and a single pre-shared
//! secret. The header algorithm is checked before any cryptographic work so
//! that `none` and algorithm-substitution tokens are refused outright and
//! reported as [`TokenError::UnexpectedSigningMethod`].
//!
//! ## Example
//!
//! ```ignore
//! use tokenward::signer::{ClaimsSigner, HmacSigner, SigningKey};
//!
//! let signer = HmacSigner::new(&SigningKey::new("secret"))?;
//! let token = signer.sign(&claims, Duration::from_secs(3600))?;
//! let claims = signer.verify_as(&token, TokenType::AccessToken)?;
//! ```

use std::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::TokenResult;
use crate::claims::{TokenClaims, TokenType};
use crate::error::TokenError;

/// The only algorithm tokens may be signed with.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS512;

/// Name of [`SIGNING_ALGORITHM`] as it appears in the JOSE header.
pub const SIGNING_ALGORITHM_NAME: &str = "HS512";

// ============================================================================
// Signing Key
// ============================================================================

/// The pre-shared HMAC secret.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(String);

impl SigningKey {
    /// Wraps a secret string.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Secret bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns `true` if the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

// ============================================================================
// Signer Capability
// ============================================================================

/// Sign/verify capability for token claims.
///
/// This is the seam between the token lifecycle and the signing primitive;
/// tests can substitute their own implementation.
pub trait ClaimsSigner: Send + Sync {
    /// Signs a copy of `claims` that expires `expiry` from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if the claims cannot be encoded.
    fn sign(&self, claims: &TokenClaims, expiry: Duration) -> TokenResult<String>;

    /// Verifies `token` and returns its claims.
    ///
    /// # Errors
    ///
    /// - `TokenError::UnexpectedSigningMethod` if the header names another algorithm
    /// - `TokenError::InvalidToken` for any structural, signature, or expiry failure
    fn verify(&self, token: &str) -> TokenResult<TokenClaims>;

    /// Verifies `token` and checks that it carries `expected` as its type.
    ///
    /// # Errors
    ///
    /// Everything [`ClaimsSigner::verify`] returns, plus
    /// `TokenError::InvalidTokenType` on a type mismatch.
    fn verify_as(&self, token: &str, expected: TokenType) -> TokenResult<TokenClaims> {
        let claims = self.verify(token)?;
        if claims.token_type() != expected {
            return Err(TokenError::InvalidTokenType);
        }
        Ok(claims)
    }
}

// ============================================================================
// HMAC Signer
// ============================================================================

/// Only the field needed to vet the algorithm before verification.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// HS512 [`ClaimsSigner`] built on `jsonwebtoken`.
///
/// This signer is thread-safe (`Send + Sync`) and can be shared across
/// async tasks.
pub struct HmacSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl HmacSigner {
    /// Creates a signer for `key`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidRequest` if the key is empty.
    pub fn new(key: &SigningKey) -> TokenResult<Self> {
        if key.is_empty() {
            return Err(TokenError::invalid_request("signing key must not be empty"));
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = true;
        validation.validate_aud = false;
        // Store TTLs are exact; the signed expiry must be too.
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
        })
    }

    /// Signs `claims` exactly as given, without touching `exp`/`iat`.
    pub(crate) fn encode_claims(&self, claims: &TokenClaims) -> TokenResult<String> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::encoding(e.to_string()))
    }
}

/// Reads the `alg` header field without trusting anything else in the token.
fn header_algorithm(token: &str) -> TokenResult<String> {
    let header = token.split('.').next().ok_or(TokenError::InvalidToken)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::InvalidToken)?;
    let header: RawHeader = serde_json::from_slice(&bytes).map_err(|_| TokenError::InvalidToken)?;
    Ok(header.alg)
}

impl ClaimsSigner for HmacSigner {
    fn sign(&self, claims: &TokenClaims, expiry: Duration) -> TokenResult<String> {
        let signed = claims.with_validity(OffsetDateTime::now_utc(), expiry);
        self.encode_claims(&signed)
    }

    fn verify(&self, token: &str) -> TokenResult<TokenClaims> {
        let algorithm = header_algorithm(token)?;
        if algorithm != SIGNING_ALGORITHM_NAME {
            return Err(TokenError::unexpected_signing_method(algorithm));
        }

        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => {
                    TokenError::unexpected_signing_method(algorithm)
                }
                _ => TokenError::InvalidToken,
            })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(secret: &str) -> HmacSigner {
        HmacSigner::new(&SigningKey::new(secret)).unwrap()
    }

    fn forge(header: &str, claims: &TokenClaims, signature: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap()),
            signature
        )
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let signer = signer("test-secret");
        let claims = TokenClaims::new("user123", TokenType::AccessToken);

        let token = signer.sign(&claims, Duration::from_secs(3600)).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = signer.verify(&token).unwrap();
        assert_eq!(decoded.subject(), "user123");
        assert_eq!(decoded.token_type(), TokenType::AccessToken);
        assert!(decoded.expires_at().unwrap() > decoded.issued_at().unwrap());
    }

    #[test]
    fn test_header_uses_hs512() {
        let signer = signer("test-secret");
        let token = signer
            .sign(
                &TokenClaims::new("u", TokenType::AccessToken),
                Duration::from_secs(60),
            )
            .unwrap();
        assert_eq!(header_algorithm(&token).unwrap(), "HS512");
    }

    #[test]
    fn test_verify_as_type_mismatch() {
        let signer = signer("test-secret");
        let token = signer
            .sign(
                &TokenClaims::new("u", TokenType::RefreshToken),
                Duration::from_secs(60),
            )
            .unwrap();

        assert!(signer.verify_as(&token, TokenType::RefreshToken).is_ok());
        assert!(matches!(
            signer.verify_as(&token, TokenType::AccessToken),
            Err(TokenError::InvalidTokenType)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer("test-secret");
        let now = OffsetDateTime::now_utc();
        let claims = TokenClaims::new("user123", TokenType::AccessToken)
            .with_validity(now - time::Duration::hours(2), Duration::from_secs(3600));

        let token = signer.encode_claims(&claims).unwrap();
        assert!(matches!(signer.verify(&token), Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_missing_exp_rejected() {
        let signer = signer("test-secret");
        let token = signer
            .encode_claims(&TokenClaims::new("u", TokenType::AccessToken))
            .unwrap();
        assert!(matches!(signer.verify(&token), Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let signer1 = signer("secret-one");
        let signer2 = signer("secret-two");
        let claims = TokenClaims::new("user123", TokenType::AccessToken);

        let token = signer1.sign(&claims, Duration::from_secs(60)).unwrap();
        assert!(matches!(
            signer2.verify(&token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let signer = signer("test-secret");
        let token = signer
            .sign(
                &TokenClaims::new("u", TokenType::AccessToken),
                Duration::from_secs(60),
            )
            .unwrap();

        let mut bytes = token.into_bytes();
        let idx = bytes.len() - 10;
        bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(matches!(
            signer.verify(&tampered),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_hs256_rejected_as_unexpected_method() {
        let signer = signer("test-secret");
        let claims = TokenClaims::new("u", TokenType::AccessToken)
            .with_validity(OffsetDateTime::now_utc(), Duration::from_secs(60));

        // Same secret, weaker algorithm
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        match signer.verify(&token) {
            Err(TokenError::UnexpectedSigningMethod { algorithm }) => {
                assert_eq!(algorithm, "HS256")
            }
            other => panic!("expected UnexpectedSigningMethod, got {other:?}"),
        }
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let signer = signer("test-secret");
        let claims = TokenClaims::new("u", TokenType::AccessToken)
            .with_validity(OffsetDateTime::now_utc(), Duration::from_secs(60));

        let token = forge(r#"{"alg":"none","typ":"JWT"}"#, &claims, "");
        assert!(matches!(
            signer.verify(&token),
            Err(TokenError::UnexpectedSigningMethod { .. })
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let signer = signer("test-secret");
        for token in ["", "not-a-token", "a.b.c", "%%%.e30.sig"] {
            assert!(
                matches!(signer.verify(token), Err(TokenError::InvalidToken)),
                "token {token:?} should be invalid"
            );
        }
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            HmacSigner::new(&SigningKey::new("")),
            Err(TokenError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_signing_key_debug_is_redacted() {
        let key = SigningKey::new("super-secret");
        assert!(!format!("{key:?}").contains("super-secret"));
    }
}
