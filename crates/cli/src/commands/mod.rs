//! CLI commands module.

use crate::console::{ConsoleNotifier, Prompt};
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use solflow_client::{ClientConfig, Session};
use std::path::Path;
use std::sync::Arc;

mod keypair;
mod wallet;

pub use wallet::WalletArgs;

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a keypair, fund it, send SOL and sign messages
    Keypair,
    /// Connect a keypair-file wallet and send SOL through it
    Wallet(WalletArgs),
}

/// Load the config file if given, then apply the URL override.
pub fn load_config(path: Option<&Path>, url: Option<String>) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(url) = url {
        config.rpc_url = url;
        config.validate().context("Invalid --url")?;
    }
    Ok(config)
}

pub async fn run(cmd: Option<Commands>, config: ClientConfig) -> Result<()> {
    tracing::info!(rpc_url = %config.rpc_url, commitment = %config.commitment, "starting");
    let rpc = Arc::new(config.http_client());
    let session = Session::new(rpc, config, Arc::new(ConsoleNotifier));
    let mut prompt = Prompt::new();

    match cmd {
        Some(Commands::Keypair) => keypair::run(&session, &mut prompt).await,
        Some(Commands::Wallet(args)) => wallet::run(&session, &mut prompt, args).await,
        None => landing(&session, &mut prompt).await,
    }
}

/// Choose between the two panels.
async fn landing(session: &Session, prompt: &mut Prompt) -> Result<()> {
    println!("{}", "solflow".bold().cyan());
    println!("  RPC: {}", session.config().rpc_url.bright_black());
    println!();
    println!("  {}  Generate a keypair", "1".bright_yellow());
    println!("  {}  Connect a wallet", "2".bright_yellow());
    println!();

    loop {
        let Some(line) = prompt.read("choose [1/2]>").await? else {
            return Ok(());
        };
        match line.trim() {
            "1" | "keypair" => return keypair::run(session, prompt).await,
            "2" | "wallet" => {
                let Some(path) = prompt.read("keypair file>").await? else {
                    return Ok(());
                };
                let args = WalletArgs {
                    keypair: path.trim().into(),
                };
                return wallet::run(session, prompt, args).await;
            }
            "q" | "quit" | "exit" => return Ok(()),
            _ => println!("Enter 1 or 2."),
        }
    }
}

/// Print the current identity and balance.
fn print_account(session: &Session) {
    match session.identity_address() {
        Some(address) => {
            println!("  Address: {}", address.to_string().bright_yellow());
            match session.balance() {
                Some(balance) => println!("  Balance: {}", balance.to_string().bold()),
                None => println!("  Balance: {}", "unknown".bright_black()),
            }
        }
        None => println!("  {}", "No identity yet.".bright_black()),
    }
}

fn print_last_transaction(session: &Session) {
    match (session.last_transaction(), session.explorer_link()) {
        (Some(signature), Some(link)) => {
            println!("  Transaction: {}", signature.to_string().bright_yellow());
            println!("  Explorer:    {}", link.underline());
        }
        _ => println!("  {}", "No transaction yet.".bright_black()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_url_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "rpc_url": "http://127.0.0.1:8899", "poll_interval_ms": 50 }}"#).unwrap();

        let config = load_config(Some(file.path()), Some("http://localhost:9000".into())).unwrap();
        assert_eq!(config.rpc_url, "http://localhost:9000");
        assert_eq!(config.poll_interval_ms, 50);
    }

    #[test]
    fn test_bad_url_rejected() {
        assert!(load_config(None, Some("localhost:8899".into())).is_err());
    }
}
