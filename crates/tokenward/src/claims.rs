//! Token types and the claims bound to every token.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The kind of token, which also selects its lifecycle path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Single-use password reset link.
    ResetPassword,
    /// Single-use email verification link.
    VerifyEmail,
    /// Short-lived stateless bearer token.
    AccessToken,
    /// Long-lived revocable token used to obtain new access tokens.
    RefreshToken,
}

impl TokenType {
    /// All token types.
    pub const ALL: [TokenType; 4] = [
        Self::ResetPassword,
        Self::VerifyEmail,
        Self::AccessToken,
        Self::RefreshToken,
    ];

    /// Returns the serialized name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResetPassword => "reset_password",
            Self::VerifyEmail => "verify_email",
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }

    /// Returns `true` if tokens of this type live in the key-value store.
    ///
    /// Access tokens are the only stateless type.
    #[must_use]
    pub fn is_stateful(&self) -> bool {
        !matches!(self, Self::AccessToken)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown token type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown token type: '{0}'")]
pub struct ParseTokenTypeError(String);

impl FromStr for TokenType {
    type Err = ParseTokenTypeError;

    /// Accepts both `snake_case` and `kebab-case` names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "reset_password" => Ok(Self::ResetPassword),
            "verify_email" => Ok(Self::VerifyEmail),
            "access_token" => Ok(Self::AccessToken),
            "refresh_token" => Ok(Self::RefreshToken),
            _ => Err(ParseTokenTypeError(s.to_string())),
        }
    }
}

/// Claims carried by a token.
///
/// Subject, creation time and type are fixed at construction. The standard
/// `exp`/`iat` fields are only filled in on a signed copy, see
/// [`TokenClaims::with_validity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user identifier).
    sub: String,

    /// When the claims were created.
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// What the token may be used for.
    #[serde(rename = "tokenType")]
    token_type: TokenType,

    /// Expiration time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,

    /// Issued at (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
}

impl TokenClaims {
    /// Creates claims for `subject`, stamped with the current time.
    ///
    /// The subject is taken as-is; validating its format is the caller's job.
    #[must_use]
    pub fn new(subject: impl Into<String>, token_type: TokenType) -> Self {
        Self {
            sub: subject.into(),
            created_at: OffsetDateTime::now_utc(),
            token_type,
            exp: None,
            iat: None,
        }
    }

    /// Subject identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Token type.
    #[must_use]
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Expiration time as a Unix timestamp, if the claims were signed.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.exp
    }

    /// Issue time as a Unix timestamp, if the claims were signed.
    #[must_use]
    pub fn issued_at(&self) -> Option<i64> {
        self.iat
    }

    /// Returns a copy valid from `issued_at` for `lifetime`.
    ///
    /// Sub-second lifetimes round up so a token never expires before its
    /// store entry does.
    #[must_use]
    pub(crate) fn with_validity(&self, issued_at: OffsetDateTime, lifetime: Duration) -> Self {
        let iat = issued_at.unix_timestamp();
        let mut secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        if lifetime.subsec_nanos() > 0 {
            secs = secs.saturating_add(1);
        }

        Self {
            exp: Some(iat.saturating_add(secs)),
            iat: Some(iat),
            ..self.clone()
        }
    }
}
