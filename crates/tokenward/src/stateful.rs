//! Store-backed tokens: issue, look up, and revoke.
//!
//! A stateful token is a random key. The claims it stands for are kept in
//! the key-value store under that key, with a TTL, as a versioned record:
//!
//! ```json
//! {"v":1,"token":"<HS512 JWS of the claims>"}
//! ```
//!
//! The JWS expires together with the store entry. Signing the stored claims
//! means a party with write access to the store still cannot mint records
//! this service will accept.
//!
//! # Security Considerations
//!
//! - Keys are 32 bytes from the OS CSPRNG, so guessing one is infeasible
//! - Deleting the key revokes the token immediately
//! - Keys and claims are never logged

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::TokenResult;
use crate::claims::TokenClaims;
use crate::context::CallContext;
use crate::error::TokenError;
use crate::generator::generate_token_key;
use crate::signer::ClaimsSigner;
use crate::store::KeyValueStore;

/// Current stored record format.
pub const RECORD_VERSION: u8 = 1;

/// The value written under a stateful token key.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    v: u8,
    token: String,
}

impl StoredRecord {
    fn encode(signed: String) -> TokenResult<Vec<u8>> {
        serde_json::to_vec(&StoredRecord {
            v: RECORD_VERSION,
            token: signed,
        })
        .map_err(|e| TokenError::encoding(e.to_string()))
    }

    /// Anything that is not a well-formed current-version record is an
    /// invalid token.
    fn decode(bytes: &[u8]) -> TokenResult<String> {
        let record: StoredRecord =
            serde_json::from_slice(bytes).map_err(|_| TokenError::InvalidToken)?;
        if record.v != RECORD_VERSION {
            return Err(TokenError::InvalidToken);
        }
        Ok(record.token)
    }
}

/// Bridge between token claims and the key-value store.
#[derive(Clone)]
pub struct StatefulTokens {
    store: Arc<dyn KeyValueStore>,
    signer: Arc<dyn ClaimsSigner>,
    /// Deadline applied when the caller's context has none.
    operation_timeout: Option<Duration>,
}

impl StatefulTokens {
    /// Creates a bridge over `store`, signing records with `signer`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, signer: Arc<dyn ClaimsSigner>) -> Self {
        Self {
            store,
            signer,
            operation_timeout: None,
        }
    }

    /// Sets the deadline used for calls whose context carries none.
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Stores `claims` under a fresh random key that expires after `ttl`.
    ///
    /// # Returns
    ///
    /// The key, which is the token handed to the user.
    ///
    /// # Errors
    ///
    /// - `TokenError::InvalidRequest` if `ttl` is zero
    /// - `TokenError::Entropy` if no key could be generated
    /// - `TokenError::Store` if the write fails or the context aborts it
    pub async fn put(
        &self,
        ctx: &CallContext,
        claims: &TokenClaims,
        ttl: Duration,
    ) -> TokenResult<String> {
        if ttl.is_zero() {
            return Err(TokenError::invalid_request("token TTL must be greater than zero"));
        }

        let key = generate_token_key()?;
        let record = StoredRecord::encode(self.signer.sign(claims, ttl)?)?;

        let ctx = ctx.or_timeout(self.operation_timeout);
        ctx.run(self.store.set(&key, &record, ttl)).await?;

        tracing::debug!(
            token_type = %claims.token_type(),
            ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            "stored stateful token"
        );
        Ok(key)
    }

    /// Checks whether `key` is present in the store.
    ///
    /// An expired or deleted key is `false`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Store` if the read fails or the context aborts it.
    pub async fn exists(&self, ctx: &CallContext, key: &str) -> TokenResult<bool> {
        let ctx = ctx.or_timeout(self.operation_timeout);
        let value = ctx.run(self.store.get(key)).await?;
        Ok(value.is_some())
    }

    /// Loads and verifies the claims stored under `key`.
    ///
    /// # Errors
    ///
    /// - `TokenError::NotFound` if the key is absent
    /// - `TokenError::InvalidToken` if the record is malformed, of an unknown
    ///   version, or fails verification
    /// - `TokenError::UnexpectedSigningMethod` if the record was signed with
    ///   another algorithm
    /// - `TokenError::Store` if the read fails or the context aborts it
    pub async fn fetch(&self, ctx: &CallContext, key: &str) -> TokenResult<TokenClaims> {
        let ctx = ctx.or_timeout(self.operation_timeout);
        let bytes = ctx
            .run(self.store.get(key))
            .await?
            .ok_or(TokenError::NotFound)?;

        self.open_record(&bytes)
    }

    /// Removes `key` and returns the claims it held, in one store command
    /// where the backend supports it.
    ///
    /// The key is gone afterwards even if its record fails verification.
    ///
    /// # Errors
    ///
    /// Same as [`StatefulTokens::fetch`].
    pub async fn take(&self, ctx: &CallContext, key: &str) -> TokenResult<TokenClaims> {
        let ctx = ctx.or_timeout(self.operation_timeout);
        let bytes = ctx
            .run(self.store.take(key))
            .await?
            .ok_or(TokenError::NotFound)?;

        tracing::debug!("took stateful token");
        self.open_record(&bytes)
    }

    fn open_record(&self, bytes: &[u8]) -> TokenResult<TokenClaims> {
        let signed = StoredRecord::decode(bytes)?;
        self.signer.verify(&signed)
    }

    /// Deletes `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Store` if the delete fails or the context aborts it.
    pub async fn delete(&self, ctx: &CallContext, key: &str) -> TokenResult<()> {
        let ctx = ctx.or_timeout(self.operation_timeout);
        ctx.run(self.store.delete(key)).await?;
        tracing::debug!("deleted stateful token");
        Ok(())
    }
}
