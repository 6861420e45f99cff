use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokenward::TokenType;

#[derive(Parser)]
#[command(name = "tokenward")]
#[command(about = "Issue, verify, and revoke security tokens")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file (defaults to ./tokenward.toml if present)
    #[arg(short, long, global = true, env = "TOKENWARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level filter; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Deadline for each store call (e.g. 500ms, 2s)
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a random signing secret
    Keygen,
    /// Stateless access tokens
    Access(AccessArgs),
    /// Store-backed tokens (reset-password, verify-email, refresh-token)
    Token(TokenArgs),
}

#[derive(clap::Args)]
pub struct AccessArgs {
    #[command(subcommand)]
    pub command: AccessCommands,
}

#[derive(Subcommand)]
pub enum AccessCommands {
    /// Sign a new access token
    Issue {
        /// Subject the token is issued for
        #[arg(short, long)]
        subject: String,
        /// Lifetime (defaults to lifetimes.access_token)
        #[arg(long, value_parser = humantime::parse_duration)]
        ttl: Option<Duration>,
    },
    /// Verify an access token and print its claims
    Verify {
        /// The signed token
        token: String,
    },
}

#[derive(clap::Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommands,
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Store claims and print the key standing for them
    Issue {
        /// Token type (reset-password, verify-email, refresh-token)
        #[arg(short = 't', long = "type")]
        token_type: TokenType,
        /// Subject the token is issued for
        #[arg(short, long)]
        subject: String,
        /// Lifetime (defaults to the configured lifetime for the type)
        #[arg(long, value_parser = humantime::parse_duration)]
        ttl: Option<Duration>,
    },
    /// Look up a key and print its claims
    Decode {
        /// Expected token type
        #[arg(short = 't', long = "type")]
        token_type: TokenType,
        /// The token key
        key: String,
    },
    /// Revoke a key
    Destroy {
        /// The token key
        key: String,
    },
    /// Check whether a key is still live
    Exists {
        /// The token key
        key: String,
    },
}
