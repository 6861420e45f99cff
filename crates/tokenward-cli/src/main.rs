mod cli;
mod commands;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tokenward::{CallContext, TokenConfig, TokenManager};

use cli::{AccessCommands, Cli, Commands, TokenCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);

    match &cli.command {
        Commands::Keygen => commands::keygen::keygen()?,
        Commands::Access(args) => {
            let manager = build_manager(&load_config(&cli)?)?;
            match &args.command {
                AccessCommands::Issue { subject, ttl } => {
                    commands::access::issue(&manager, subject, *ttl)?;
                }
                AccessCommands::Verify { token } => {
                    commands::access::verify(&manager, token)?;
                }
            }
        }
        Commands::Token(args) => {
            let config = load_config(&cli)?;
            commands::token::require_shared_store(&config)?;
            let manager = build_manager(&config)?;
            let ctx = call_context(&cli);
            match &args.command {
                TokenCommands::Issue {
                    token_type,
                    subject,
                    ttl,
                } => {
                    commands::token::issue(&manager, &ctx, *token_type, subject, *ttl).await?;
                }
                TokenCommands::Decode { token_type, key } => {
                    commands::token::decode(&manager, &ctx, *token_type, key).await?;
                }
                TokenCommands::Destroy { key } => {
                    commands::token::destroy(&manager, &ctx, key).await?;
                }
                TokenCommands::Exists { key } => {
                    commands::token::exists(&manager, &ctx, key).await?;
                }
            }
        }
    }

    Ok(())
}

fn call_context(cli: &Cli) -> CallContext {
    match cli.timeout {
        Some(timeout) => CallContext::background().with_timeout(timeout),
        None => CallContext::background(),
    }
}

fn load_config(cli: &Cli) -> Result<TokenConfig> {
    let config = TokenConfig::load(cli.config.as_deref()).context("loading configuration")?;
    tracing::debug!(backend = ?config.store.backend, "configuration loaded");
    Ok(config)
}

fn build_manager(config: &TokenConfig) -> Result<TokenManager> {
    TokenManager::from_config(config).context("initializing token manager")
}
