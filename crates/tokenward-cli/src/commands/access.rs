use std::time::Duration;

use anyhow::Result;
use serde_json::json;
use tokenward::{TokenManager, TokenType};

use crate::output::print_value;

pub fn issue(manager: &TokenManager, subject: &str, ttl: Option<Duration>) -> Result<()> {
    let ttl = ttl.unwrap_or_else(|| manager.default_lifetime(TokenType::AccessToken));
    let token = manager.generate_access_token(subject, ttl)?;

    print_value(&json!({
        "token": token,
        "token_type": TokenType::AccessToken,
        "expires_in": ttl.as_secs(),
    }))
}

pub fn verify(manager: &TokenManager, token: &str) -> Result<()> {
    let claims = manager.access_token_claims(token)?;
    print_value(&json!({ "valid": true, "claims": claims }))
}
