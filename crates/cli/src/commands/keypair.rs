//! Keypair panel.

use super::{print_account, print_last_transaction};
use crate::console::{Input, Prompt};
use anyhow::Result;
use colored::Colorize;
use solflow_client::{Session, TransferRequest};

const HELP: &str = "\
  generate                 create and fund a new keypair
  send <to> <amount>       send SOL from the keypair
  sign <message>           sign a message with the keypair
  balance                  refresh the balance
  tx                       show the last transaction
  quit";

pub async fn run(session: &Session, prompt: &mut Prompt) -> Result<()> {
    println!("{}", "Keypair".bold().cyan());
    println!("{HELP}");
    println!();

    while let Some(line) = prompt.read("keypair>").await? {
        match Input::parse(&line) {
            Input::Generate => {
                // A failure leaves the new identity in place.
                let _ = session.create_funded_identity().await;
                print_account(session);
            }
            Input::Send { recipient, amount } => {
                let request = TransferRequest::new(recipient, amount);
                if session.send(&request).await.is_ok() {
                    print_last_transaction(session);
                    print_account(session);
                }
            }
            Input::Sign(message) => {
                if let Ok(signature) = session.sign_message(&message).await {
                    println!("  Signature: {}", signature.to_string().bright_yellow());
                }
            }
            Input::Balance => {
                if session.refresh_balance().await.is_ok() {
                    print_account(session);
                }
            }
            Input::Tx => print_last_transaction(session),
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
            Input::Empty => {}
            Input::Connect | Input::Disconnect => {
                println!("Wallet commands are available in `solflow wallet`.")
            }
            Input::Unknown(word) => println!("Unknown command: {word}. Type `help`."),
        }
    }
    Ok(())
}
