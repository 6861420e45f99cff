//! # tokenward
//!
//! Security token issuance, validation, and revocation.
//!
//! This crate provides:
//! - Stateless HS512 access tokens, verified by signature and expiry alone
//! - Store-backed reset-password, verify-email, and refresh tokens, which are
//!   opaque random keys revocable at any time
//! - A pluggable key-value store with in-memory and Redis implementations
//! - Cancellation and deadlines for every store round-trip
//!
//! ## Modules
//!
//! - [`manager`] - The [`TokenManager`] façade
//! - [`signer`] - JWT signing and verification
//! - [`stateful`] - Store-backed token bridge
//! - [`store`] - Key-value store trait and backends
//! - [`claims`] - Token types and claims
//! - [`context`] - Per-call cancellation and deadlines
//! - [`config`] - Service configuration
//! - [`generator`] - Random key generation

pub mod claims;
pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod manager;
pub mod signer;
pub mod stateful;
pub mod store;

pub use claims::{ParseTokenTypeError, TokenClaims, TokenType};
pub use config::{
    ConfigError, LifetimeConfig, SigningConfig, StoreBackend, StoreConfig, TokenConfig,
};
pub use context::CallContext;
pub use error::{ErrorCategory, TokenError};
pub use manager::TokenManager;
pub use signer::{ClaimsSigner, HmacSigner, SigningKey};
pub use stateful::StatefulTokens;
pub use store::{KeyValueStore, MemoryStore, StoreError, StoreResult};

#[cfg(feature = "redis")]
pub use store::RedisStore;

/// Type alias for token operation results.
pub type TokenResult<T> = Result<T, TokenError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tokenward::prelude::*;
/// ```
pub mod prelude {
    pub use crate::TokenResult;
    pub use crate::claims::{TokenClaims, TokenType};
    pub use crate::config::{ConfigError, TokenConfig};
    pub use crate::context::CallContext;
    pub use crate::error::{ErrorCategory, TokenError};
    pub use crate::manager::TokenManager;
    pub use crate::signer::{ClaimsSigner, HmacSigner, SigningKey};
    pub use crate::store::{KeyValueStore, MemoryStore, StoreError};
}
