//! Token lifecycle error types.
//!
//! Validation failures are coarse: every reason a token can be
//! rejected (bad signature, malformed input, expiry, unknown store key)
//! collapses into [`TokenError::InvalidToken`]. Only a type mismatch and an
//! unexpected signing algorithm are reported distinctly.

use std::fmt;

use crate::store::StoreError;

/// Errors that can occur while issuing, decoding, or revoking tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token is malformed, its signature does not verify, it has expired,
    /// or its store key does not exist.
    #[error("invalid token")]
    InvalidToken,

    /// The token is valid but carries a different type than requested.
    #[error("invalid token type")]
    InvalidTokenType,

    /// The token header names an algorithm other than the configured one.
    #[error("unexpected token signing method: {algorithm}")]
    UnexpectedSigningMethod {
        /// The algorithm found in the token header.
        algorithm: String,
    },

    /// The store holds no value for the requested key.
    #[error("not found")]
    NotFound,

    /// The key-value store failed. Propagated unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Claims or a stored record could not be encoded or signed.
    #[error("Failed to encode token: {message}")]
    Encoding {
        /// Description of the encoding failure.
        message: String,
    },

    /// The operating system random source failed.
    #[error("Random source unavailable: {message}")]
    Entropy {
        /// Description of the random source failure.
        message: String,
    },

    /// The caller passed arguments the operation cannot honor.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },
}

impl TokenError {
    /// Creates a new `UnexpectedSigningMethod` error.
    #[must_use]
    pub fn unexpected_signing_method(algorithm: impl Into<String>) -> Self {
        Self::UnexpectedSigningMethod {
            algorithm: algorithm.into(),
        }
    }

    /// Creates a new `Encoding` error.
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a new `Entropy` error.
    #[must_use]
    pub fn entropy(message: impl Into<String>) -> Self {
        Self::Entropy {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Returns `true` if the token itself was rejected.
    ///
    /// Callers typically answer these with a 401 and nothing more.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken | Self::InvalidTokenType | Self::UnexpectedSigningMethod { .. }
        )
    }

    /// Returns `true` if this error should be raised to operators as a
    /// possible forgery attempt.
    #[must_use]
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Self::UnexpectedSigningMethod { .. })
    }

    /// Returns `true` if the failure came from the key-value store.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidToken | Self::InvalidTokenType | Self::NotFound => ErrorCategory::Token,
            Self::UnexpectedSigningMethod { .. } => ErrorCategory::Security,
            Self::Store(_) => ErrorCategory::Infrastructure,
            Self::Encoding { .. } | Self::Entropy { .. } => ErrorCategory::Internal,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
        }
    }
}

/// Categories of token errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Token rejected during validation.
    Token,
    /// Possible forgery (algorithm substitution).
    Security,
    /// Caller misuse.
    Validation,
    /// Store or transport failures.
    Infrastructure,
    /// Local failures (encoding, randomness).
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => write!(f, "token"),
            Self::Security => write!(f, "security"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
