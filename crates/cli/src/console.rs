//! Terminal input and notification output.

use anyhow::Result;
use colored::Colorize;
use solflow_client::{Level, Notification, Notifier};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Prints notifications as toast-style lines.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Success => println!("{}  {}", "✓".green().bold(), notification.message.green()),
            Level::Error => println!("{}  {}", "✗".red().bold(), notification.message.red()),
        }
    }
}

/// Line-oriented prompt over stdin.
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `prompt` and read one line. `None` at end of input.
    pub async fn read(&mut self, prompt: &str) -> Result<Option<String>> {
        print!("{} ", prompt.bold());
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }
}

/// One line typed at a panel prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Generate,
    Connect,
    Disconnect,
    Balance,
    /// Missing arguments are left empty for the session to reject.
    Send { recipient: String, amount: String },
    Sign(String),
    Tx,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word.to_ascii_lowercase().as_str() {
            "" => Input::Empty,
            "generate" | "new" => Input::Generate,
            "connect" => Input::Connect,
            "disconnect" => Input::Disconnect,
            "balance" => Input::Balance,
            "send" => {
                let mut args = rest.split_whitespace();
                Input::Send {
                    recipient: args.next().unwrap_or_default().to_string(),
                    amount: args.next().unwrap_or_default().to_string(),
                }
            }
            "sign" => Input::Sign(rest.to_string()),
            "tx" => Input::Tx,
            "help" | "?" => Input::Help,
            "quit" | "exit" | "q" => Input::Quit,
            other => Input::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send() {
        assert_eq!(
            Input::parse("send 9xQe 0.5"),
            Input::Send {
                recipient: "9xQe".into(),
                amount: "0.5".into()
            }
        );
        assert_eq!(
            Input::parse("  SEND   9xQe  "),
            Input::Send {
                recipient: "9xQe".into(),
                amount: String::new()
            }
        );
        assert_eq!(
            Input::parse("send"),
            Input::Send {
                recipient: String::new(),
                amount: String::new()
            }
        );
    }

    #[test]
    fn test_parse_sign_keeps_spacing() {
        assert_eq!(
            Input::parse("sign hello   world"),
            Input::Sign("hello   world".into())
        );
    }

    #[test]
    fn test_parse_words() {
        assert_eq!(Input::parse(""), Input::Empty);
        assert_eq!(Input::parse("generate"), Input::Generate);
        assert_eq!(Input::parse("exit"), Input::Quit);
        assert_eq!(Input::parse("tx"), Input::Tx);
        assert_eq!(Input::parse("mint 5"), Input::Unknown("mint".into()));
    }
}
