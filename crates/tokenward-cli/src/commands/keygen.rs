use anyhow::Result;
use serde_json::json;

use crate::output::print_value;

pub fn keygen() -> Result<()> {
    let secret = tokenward::generator::generate_signing_secret()?;
    print_value(&json!({ "private_key": secret }))
}
