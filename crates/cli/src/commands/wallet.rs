//! Wallet panel.

use super::{print_account, print_last_transaction};
use crate::console::{Input, Prompt};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use solflow_client::{KeypairWallet, Session, TransferRequest, WalletAdapter};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct WalletArgs {
    /// Keypair file for the wallet (JSON array of 64 bytes)
    #[arg(short, long, env = "SOLFLOW_KEYPAIR")]
    pub keypair: PathBuf,
}

const HELP: &str = "\
  connect                  connect the wallet
  balance                  refresh the balance
  send <to> <amount>       send SOL through the wallet
  tx                       show the last transaction
  disconnect               disconnect the wallet
  quit";

pub async fn run(session: &Session, prompt: &mut Prompt, args: WalletArgs) -> Result<()> {
    let wallet = Arc::new(KeypairWallet::from_file(&args.keypair));
    println!("{}", "Wallet".bold().cyan());
    println!("  Source: {}", wallet.name().bright_black());
    println!("{HELP}");
    println!();

    while let Some(line) = prompt.read("wallet>").await? {
        match Input::parse(&line) {
            Input::Connect => {
                if session.connect_wallet(wallet.clone()).await.is_ok() {
                    print_account(session);
                }
            }
            Input::Disconnect => {
                let _ = session.disconnect_wallet().await;
            }
            Input::Balance => {
                if session.refresh_balance().await.is_ok() {
                    print_account(session);
                }
            }
            Input::Send { recipient, amount } => {
                let request = TransferRequest::new(recipient, amount);
                if session.send(&request).await.is_ok() {
                    print_last_transaction(session);
                }
            }
            Input::Tx => print_last_transaction(session),
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
            Input::Empty => {}
            Input::Generate | Input::Sign(_) => {
                println!("Keypair commands are available in `solflow keypair`.")
            }
            Input::Unknown(word) => println!("Unknown command: {word}. Type `help`."),
        }
    }

    if wallet.connected() {
        wallet.disconnect().await?;
    }
    Ok(())
}
