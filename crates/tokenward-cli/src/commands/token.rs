use std::time::Duration;

use anyhow::{Result, bail};
use serde_json::json;
use tokenward::{CallContext, StoreBackend, TokenConfig, TokenManager, TokenType};

use crate::output::print_value;

/// Refuses store-backed commands when the store does not outlive the process.
///
/// Each CLI run would get its own empty memory store, so a key issued by one
/// run could never be found by the next.
pub fn require_shared_store(config: &TokenConfig) -> Result<()> {
    if config.store.backend == StoreBackend::Memory {
        bail!(
            "token commands need a shared store; set store.backend = \"redis\" and store.url \
             in the config file (or TOKENWARD__STORE__BACKEND=redis and TOKENWARD__STORE__URL)"
        );
    }
    Ok(())
}

pub async fn issue(
    manager: &TokenManager,
    ctx: &CallContext,
    token_type: TokenType,
    subject: &str,
    ttl: Option<Duration>,
) -> Result<()> {
    if !token_type.is_stateful() {
        bail!("{token_type} is not store-backed; use `tokenward access issue`");
    }
    let ttl = ttl.unwrap_or_else(|| manager.default_lifetime(token_type));
    let key = manager.issue_token(ctx, subject, token_type, ttl).await?;

    print_value(&json!({
        "key": key,
        "token_type": token_type,
        "expires_in": ttl.as_secs(),
    }))
}

pub async fn decode(
    manager: &TokenManager,
    ctx: &CallContext,
    token_type: TokenType,
    key: &str,
) -> Result<()> {
    let claims = manager.decode_token(ctx, key, token_type).await?;
    print_value(&json!({ "valid": true, "claims": claims }))
}

pub async fn destroy(manager: &TokenManager, ctx: &CallContext, key: &str) -> Result<()> {
    manager.destroy_token(ctx, key).await?;
    print_value(&json!({ "destroyed": true }))
}

pub async fn exists(manager: &TokenManager, ctx: &CallContext, key: &str) -> Result<()> {
    let exists = manager.exists(ctx, key).await?;
    print_value(&json!({ "exists": exists }))
}
