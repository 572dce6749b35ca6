//! Oryxen - entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use oryxen_app::{AppConfig, Application, OrderArgs};
use oryxen_core::{OrderSide, Protocol};
use rust_decimal::Decimal;
use tracing::info;

/// Oryxen perp trading toolkit
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "ORYXEN_CONFIG", default_value = "config/default.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream live prices until Ctrl-C
    Stream {
        /// Comma-separated symbols (defaults to ws.symbols)
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
    },
    /// Generate a new agent keypair
    Keygen,
    /// Authorize the configured agent key for the master account
    BindAgent,
    /// Submit a market order on Pacifica
    Order {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        amount: Decimal,
        /// bid/ask (buy/sell and long/short are accepted)
        #[arg(long)]
        side: OrderSide,
        /// Slippage tolerance in percent
        #[arg(long)]
        slippage: Option<Decimal>,
        #[arg(long)]
        reduce_only: bool,
    },
    /// Print funding rates as JSON
    Funding {
        /// Single venue (hyperliquid, drift); all venues when omitted
        #[arg(long)]
        protocol: Option<Protocol>,
    },
    /// Print perp listings on the supported venues as JSON
    Perps,
    /// Decode a base58 transaction returned by a wallet
    InspectTx {
        /// Base58-encoded wire transaction
        transaction: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    oryxen_ws::init_crypto();

    let args = Args::parse();

    oryxen_telemetry::init_logging()?;

    info!("Starting Oryxen v{}", env!("CARGO_PKG_VERSION"));

    // keygen and inspect-tx need no configuration
    if let Command::Keygen = args.command {
        let keypair = Application::keygen();
        println!("public_key: {}", keypair.public_key_base58());
        println!("secret_key: {}", keypair.secret_base58().as_str());
        return Ok(());
    }
    if let Command::InspectTx { transaction } = &args.command {
        let tx = Application::inspect_transaction(transaction)?;
        match tx.version() {
            Some(version) => println!("versioned (v{version}), {} bytes", tx.as_bytes().len()),
            None => println!("legacy, {} bytes", tx.as_bytes().len()),
        }
        return Ok(());
    }

    info!(config_path = %args.config, "Loading configuration");
    let config = AppConfig::from_file(&args.config)?;
    let app = Application::new(config);

    match args.command {
        Command::Stream { symbols } => app.run_stream(symbols).await?,
        Command::BindAgent => {
            let response = app.bind_agent().await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Order {
            symbol,
            amount,
            side,
            slippage,
            reduce_only,
        } => {
            let order = OrderArgs {
                symbol,
                amount,
                side,
                slippage_percent: slippage,
                reduce_only,
            };
            let response = app.place_order(&order).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Funding { protocol } => {
            let markets = app.fetch_funding(protocol).await?;
            println!("{}", serde_json::to_string_pretty(&markets)?);
        }
        Command::Perps => {
            let listings = app.fetch_perps().await?;
            println!("{}", serde_json::to_string_pretty(&listings)?);
        }
        Command::Keygen | Command::InspectTx { .. } => {}
    }

    Ok(())
}
