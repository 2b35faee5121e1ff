//! solflow-test-validator: a local JSON-RPC network.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use solflow_rpc::{LocalCluster, LocalConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "solflow-test-validator")]
#[command(about = "Run a local JSON-RPC network for solflow", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8899")]
    bind: SocketAddr,

    /// Fee charged per signature, in lamports
    #[arg(long, default_value_t = 5_000)]
    fee: u64,

    /// Blocks a blockhash stays usable
    #[arg(long, default_value_t = 150)]
    blockhash_validity: u64,

    /// Artificial delay added to every RPC call, in milliseconds
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let cluster = Arc::new(LocalCluster::with_config(LocalConfig {
        fee_per_signature: args.fee,
        blockhash_validity: args.blockhash_validity,
        ..LocalConfig::default()
    }));
    cluster.set_latency(Duration::from_millis(args.latency_ms));

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    let addr = listener.local_addr()?;

    println!("{}", "solflow test validator".bold().cyan());
    println!();
    println!("  RPC URL:  {}", format!("http://{addr}").bright_yellow());
    println!("  Faucet:   {}", cluster.faucet_address().to_string().bright_black());
    println!();
    println!("Press Ctrl-C to stop.");

    solflow_server::serve(listener, cluster)
        .await
        .context("Server error")?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
