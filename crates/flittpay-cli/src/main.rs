// flittpay CLI - offline Flitt signatures and ledger operations

mod api;
pub mod params;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;

use flittpay_signature::{sign, signing_string, verify, SignatureError, SIGNATURE_FIELD};

/// flittpay - Flitt signing tool and balance ledger client
#[derive(Parser)]
#[command(name = "flittpay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base URL of the flittpay server
    #[arg(
        long,
        global = true,
        env = "FLITTPAY_SERVER",
        default_value = "http://localhost:5000"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the signature of a parameter set
    Sign {
        /// Add parameter key=value pairs (can be specified multiple times)
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// JSON payload to sign (flat or wrapped in "request")
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Merchant secret key
        #[arg(long, env = "FLITT_SECRET_KEY", hide_env_values = true)]
        secret: String,

        /// Also print the signing string, secret masked
        #[arg(long)]
        show_string: bool,
    },
    /// Verify a signed payload such as a provider callback
    Verify {
        /// Path to the JSON payload carrying a "signature" field
        path: PathBuf,

        /// Merchant secret key
        #[arg(long, env = "FLITT_SECRET_KEY", hide_env_values = true)]
        secret: String,
    },
    /// Query or adjust balances on a running server
    Balance {
        #[command(subcommand)]
        action: BalanceAction,
    },
    /// Query the provider status of an order through the server
    Status {
        /// Order id
        order_id: String,
    },
}

#[derive(Subcommand)]
enum BalanceAction {
    /// Show a user's balance
    Show { user_id: String },
    /// Add funds to a user's balance
    Topup { user_id: String, amount: String },
    /// Withdraw funds from a user's balance
    Withdraw { user_id: String, amount: String },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sign {
            params,
            file,
            secret,
            show_string,
        } => handle_sign(params, file, &secret, show_string),
        Commands::Verify { path, secret } => handle_verify(&path, &secret),
        Commands::Balance { action } => handle_balance(&cli.server, action),
        Commands::Status { order_id } => handle_status(&cli.server, &order_id),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn handle_sign(
    args: Vec<String>,
    file: Option<PathBuf>,
    secret: &str,
    show_string: bool,
) -> anyhow::Result<()> {
    let base = match file {
        Some(path) => params::load_payload(&path)?,
        None => flittpay_signature::Params::new(),
    };
    let mut payload = params::merge(base, params::parse_params(args)?);
    payload.remove(SIGNATURE_FIELD);

    if show_string {
        let string = signing_string(&payload, secret);
        println!("{} {}", "Signing string:".dimmed(), params::mask_secret(&string, secret));
    }

    println!("{}", sign(&payload, secret));
    Ok(())
}

fn handle_verify(path: &std::path::Path, secret: &str) -> anyhow::Result<()> {
    let payload = params::load_payload(path)?;
    let order_id = payload
        .get("order_id")
        .and_then(flittpay_signature::stringify_value)
        .unwrap_or_else(|| "-".to_string());

    match verify(&payload, secret) {
        Ok(()) => {
            println!("{} {}", "✓".green().bold(), "Signature verified".green());
            println!();
            println!("  Order:  {}", order_id);
            if let Some(status) = payload.get("order_status").and_then(Value::as_str) {
                println!("  Status: {}", status);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), "Signature verification failed".red());
            eprintln!();
            eprintln!("  Order: {}", order_id);
            if let SignatureError::Mismatch { .. } = e {
                let mut unsigned = payload.clone();
                unsigned.remove(SIGNATURE_FIELD);
                eprintln!("  Expected: {}", sign(&unsigned, secret));
            }
            Err(e.into())
        }
    }
}

fn handle_balance(server: &str, action: BalanceAction) -> anyhow::Result<()> {
    let client = api::ApiClient::new(server);

    let record = match action {
        BalanceAction::Show { user_id } => client.balance(&user_id)?,
        BalanceAction::Topup { user_id, amount } => client.topup(&user_id, &amount)?,
        BalanceAction::Withdraw { user_id, amount } => client.withdraw(&user_id, &amount)?,
    };

    let user = record.get("userId").and_then(Value::as_str).unwrap_or("?");
    let amount = record
        .get("amount")
        .and_then(flittpay_signature::stringify_value)
        .unwrap_or_else(|| "?".to_string());

    println!("{} {}", "✓".green().bold(), user);
    println!("  Balance: {}", amount.bold());
    if let Some(updated) = record.get("updatedAt").and_then(Value::as_str) {
        println!("  Updated: {}", updated);
    }
    Ok(())
}

fn handle_status(server: &str, order_id: &str) -> anyhow::Result<()> {
    let client = api::ApiClient::new(server);
    let body = client.order_status(order_id)?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
