//! Token lifecycle façade.
//!
//! [`TokenManager`] composes the two capability sets:
//!
//! - a stateless [`ClaimsSigner`] for access tokens
//! - a store-backed [`StatefulTokens`] bridge for reset, verification and
//!   refresh tokens
//!
//! # Stateful token lifecycle
//!
//! ```text
//! Issued ──decode (exists, type ok)──▶ Validated
//!   │
//!   ├── TTL lapses ──▶ Expired    ┐ both decode as
//!   └── destroy ─────▶ Destroyed  ┘ InvalidToken
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tokenward::{CallContext, TokenConfig, TokenManager, TokenType};
//!
//! let manager = TokenManager::from_config(&config)?;
//! let ctx = CallContext::background();
//!
//! let key = manager
//!     .issue_token(&ctx, "user-1", TokenType::VerifyEmail, Duration::from_secs(3600))
//!     .await?;
//! let claims = manager.decode_token(&ctx, &key, TokenType::VerifyEmail).await?;
//! manager.destroy_token(&ctx, &key).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::TokenResult;
use crate::claims::{TokenClaims, TokenType};
use crate::config::{LifetimeConfig, StoreBackend, TokenConfig};
use crate::context::CallContext;
use crate::error::TokenError;
use crate::signer::{ClaimsSigner, HmacSigner, SigningKey};
use crate::stateful::StatefulTokens;
use crate::store::{KeyValueStore, MemoryStore};

/// Issues, decodes, and revokes every token type.
///
/// The manager holds no per-token state and is `Send + Sync`; share it
/// behind an `Arc`.
#[derive(Clone)]
pub struct TokenManager {
    /// Stateless sign/verify.
    signer: Arc<dyn ClaimsSigner>,

    /// Store-backed issue/fetch/revoke.
    stateful: StatefulTokens,

    /// Default lifetimes per token type.
    lifetimes: LifetimeConfig,
}

impl TokenManager {
    /// Creates a manager signing with `key` and storing into `store`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidRequest` if the key is empty.
    pub fn new(key: &SigningKey, store: Arc<dyn KeyValueStore>) -> TokenResult<Self> {
        let signer: Arc<dyn ClaimsSigner> = Arc::new(HmacSigner::new(key)?);
        Ok(Self::with_signer(signer, store))
    }

    /// Creates a manager from explicit capabilities.
    #[must_use]
    pub fn with_signer(signer: Arc<dyn ClaimsSigner>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            stateful: StatefulTokens::new(store, Arc::clone(&signer)),
            signer,
            lifetimes: LifetimeConfig::default(),
        }
    }

    /// Creates a manager over `store` using the signing key, lifetimes and
    /// store timeout from `config`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidRequest` if the signing key is empty.
    pub fn with_store(config: &TokenConfig, store: Arc<dyn KeyValueStore>) -> TokenResult<Self> {
        let mut manager = Self::new(&config.signing.signing_key(), store)?;
        manager.stateful = manager
            .stateful
            .with_operation_timeout(config.store.operation_timeout);
        manager.lifetimes = config.lifetimes.clone();
        Ok(manager)
    }

    /// Creates a manager and the store selected by `config.store.backend`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidRequest` if the signing key is empty or
    /// the redis backend is selected without a URL (or without the `redis`
    /// feature), and `TokenError::Store` if the redis pool cannot be built.
    pub fn from_config(config: &TokenConfig) -> TokenResult<Self> {
        let store: Arc<dyn KeyValueStore> = match config.store.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Redis => redis_store(config)?,
        };
        tracing::debug!(backend = ?config.store.backend, "token manager initialized");
        Self::with_store(config, store)
    }

    /// Returns the configured default lifetime for `token_type`.
    #[must_use]
    pub fn default_lifetime(&self, token_type: TokenType) -> Duration {
        self.lifetimes.for_type(token_type)
    }

    // ------------------------------------------------------------------
    // Stateless access tokens
    // ------------------------------------------------------------------

    /// Signs a new access token for `subject`, valid for `expiry`.
    ///
    /// No store interaction.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn generate_access_token(&self, subject: &str, expiry: Duration) -> TokenResult<String> {
        let claims = TokenClaims::new(subject, TokenType::AccessToken);
        let token = self.signer.sign(&claims, expiry)?;
        tracing::debug!(expiry_secs = expiry.as_secs(), "issued access token");
        Ok(token)
    }

    /// Verifies an access token.
    ///
    /// Returns `Ok(true)` if the signature, expiry, and type all check out.
    /// Every other outcome is an `Err` carrying the specific reason.
    ///
    /// # Errors
    ///
    /// - `TokenError::InvalidToken` for malformed, tampered, or expired tokens
    /// - `TokenError::UnexpectedSigningMethod` for algorithm substitution
    /// - `TokenError::InvalidTokenType` for a valid token of another type
    pub fn decode_access_token(&self, token: &str) -> TokenResult<bool> {
        self.access_token_claims(token).map(|_| true)
    }

    /// Verifies an access token and returns its claims.
    ///
    /// # Errors
    ///
    /// Same as [`TokenManager::decode_access_token`].
    pub fn access_token_claims(&self, token: &str) -> TokenResult<TokenClaims> {
        self.signer.verify_as(token, TokenType::AccessToken)
    }

    // ------------------------------------------------------------------
    // Stateful tokens
    // ------------------------------------------------------------------

    /// Stores `claims` and returns the random key that now stands for them.
    ///
    /// Only for [`TokenType::ResetPassword`], [`TokenType::VerifyEmail`] and
    /// [`TokenType::RefreshToken`]. Access tokens have their own stateless
    /// path and are refused here.
    ///
    /// # Errors
    ///
    /// - `TokenError::InvalidTokenType` if `token_type` is an access token or
    ///   differs from the type embedded in `claims`
    /// - `TokenError::InvalidRequest` if `expiry` is zero
    /// - `TokenError::Store` if the write fails or the context aborts it
    pub async fn generate_token(
        &self,
        ctx: &CallContext,
        token_type: TokenType,
        claims: &TokenClaims,
        expiry: Duration,
    ) -> TokenResult<String> {
        if !token_type.is_stateful() || claims.token_type() != token_type {
            return Err(TokenError::InvalidTokenType);
        }
        self.stateful.put(ctx, claims, expiry).await
    }

    /// Builds claims for `subject` and stores them, see
    /// [`TokenManager::generate_token`].
    ///
    /// # Errors
    ///
    /// Same as [`TokenManager::generate_token`].
    pub async fn issue_token(
        &self,
        ctx: &CallContext,
        subject: &str,
        token_type: TokenType,
        expiry: Duration,
    ) -> TokenResult<String> {
        let claims = TokenClaims::new(subject, token_type);
        self.generate_token(ctx, token_type, &claims, expiry).await
    }

    /// Looks up `key` and returns its claims if they carry `expected` as type.
    ///
    /// # Errors
    ///
    /// - `TokenError::InvalidToken` if the key is unknown, expired, destroyed,
    ///   or its record does not verify
    /// - `TokenError::InvalidTokenType` if the stored type differs from `expected`
    /// - `TokenError::UnexpectedSigningMethod` if the record was signed with
    ///   another algorithm
    /// - `TokenError::Store` if the read fails or the context aborts it
    pub async fn decode_token(
        &self,
        ctx: &CallContext,
        key: &str,
        expected: TokenType,
    ) -> TokenResult<TokenClaims> {
        let claims = self.stateful.fetch(ctx, key).await.map_err(|e| match e {
            TokenError::NotFound => TokenError::InvalidToken,
            other => other,
        })?;

        if claims.token_type() != expected {
            return Err(TokenError::InvalidTokenType);
        }
        Ok(claims)
    }

    /// Revokes `key` immediately. Revoking an unknown key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Store` if the delete fails or the context aborts it.
    pub async fn destroy_token(&self, ctx: &CallContext, key: &str) -> TokenResult<()> {
        self.stateful.delete(ctx, key).await
    }

    /// Removes `key` and returns its claims, for single-use redemption.
    ///
    /// The key is removed with one store command (`GETDEL` on Redis), so of
    /// two concurrent consumers exactly one succeeds. The key is spent even
    /// when the stored type differs from `expected`.
    ///
    /// # Errors
    ///
    /// Same as [`TokenManager::decode_token`].
    pub async fn consume_token(
        &self,
        ctx: &CallContext,
        key: &str,
        expected: TokenType,
    ) -> TokenResult<TokenClaims> {
        let claims = self
            .stateful
            .take(ctx, key)
            .await
            .map_err(|e| match e {
                TokenError::NotFound => TokenError::InvalidToken,
                other => other,
            })?;

        if claims.token_type() != expected {
            return Err(TokenError::InvalidTokenType);
        }
        Ok(claims)
    }

    /// Checks whether `key` is still present in the store.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Store` if the read fails or the context aborts it.
    pub async fn exists(&self, ctx: &CallContext, key: &str) -> TokenResult<bool> {
        self.stateful.exists(ctx, key).await
    }
}

#[cfg(feature = "redis")]
fn redis_store(config: &TokenConfig) -> TokenResult<Arc<dyn KeyValueStore>> {
    let url = config
        .store
        .url
        .as_deref()
        .ok_or_else(|| TokenError::invalid_request("store.url is required for the redis backend"))?;
    let store = crate::store::RedisStore::connect(
        url,
        config.store.pool_size,
        config.store.key_prefix.clone(),
    )?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "redis"))]
fn redis_store(_config: &TokenConfig) -> TokenResult<Arc<dyn KeyValueStore>> {
    Err(TokenError::invalid_request(
        "the redis store backend requires the `redis` feature",
    ))
}
