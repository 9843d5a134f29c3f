use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{AccountService, ApiClient, SessionStore, TransferWorkflow};
use shared::{
    domain::{HistoryFilter, Money},
    protocol::RegisterRequest,
};
use tracing::warn;

mod config;

#[derive(Parser, Debug)]
#[command(name = "teller", about = "AcuPay terminal console")]
struct Args {
    /// Backend base URL; overrides teller.toml and environment settings.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current available balance.
    Balance,
    /// Send money to another account.
    Transfer {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        pin: String,
        /// Also write a receipt document to the configured receipt directory.
        #[arg(long)]
        export_receipt: bool,
    },
    /// Browse transaction history.
    History {
        #[arg(long, default_value = "all")]
        filter: HistoryFilter,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Create a new account.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone_no: String,
    },
    /// Update the transaction PIN.
    SetPin {
        #[arg(long)]
        pin: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(server_url) = &args.server_url {
        settings.server_url = config::normalize_server_url(server_url);
    }
    config::validate_server_url(&settings.server_url)?;

    let session = Arc::new(SessionStore::new());
    let client = Arc::new(ApiClient::new(&settings.server_url, session.clone())?);

    if let Command::Register { name, phone_no } = &args.command {
        let profile = client
            .register(&RegisterRequest {
                name: name.clone(),
                email: args.email.clone(),
                password: args.password.clone(),
                phone_no: phone_no.clone(),
            })
            .await?;
        println!(
            "Registered {} — account number {}",
            profile.name, profile.account_number
        );
        return Ok(());
    }

    let profile = client.login(&args.email, &args.password).await?;
    println!("Logged in as {} ({})", profile.name, profile.account_number);

    match args.command {
        Command::Register { .. } => unreachable!("handled before login"),
        Command::Balance => {
            let user = client.dashboard().await?;
            println!("Available balance: {}", Money::from_major_f64(user.balance));
        }
        Command::Transfer {
            to,
            amount,
            description,
            pin,
            export_receipt,
        } => {
            let workflow =
                TransferWorkflow::new(client.clone() as Arc<dyn AccountService>, session.clone());
            if let Ok(balance) = workflow.refresh_balance().await {
                println!("Available balance: {balance}");
            }
            workflow.update_recipient(&to).await;
            workflow.update_amount(&amount).await;
            workflow.update_description(&description).await;
            session.set_pin(&pin).await;

            let outcome = workflow.submit().await?;
            println!(
                "Transfer successful: {} sent to {} (ref {})",
                Money::from_major_f64(outcome.transaction.amount),
                outcome.transaction.recipient_display(),
                outcome.transaction.transaction_ref
            );
            println!("New balance: {}", outcome.new_balance);

            if export_receipt {
                // the transfer already settled; a failed export is cosmetic
                match workflow.export_receipt(&settings.receipt_dir).await {
                    Ok(path) => println!("Receipt saved to {}", path.display()),
                    Err(err) => warn!("receipt export failed: {err}"),
                }
            }
            workflow.dismiss_receipt().await;
        }
        Command::History { filter, limit } => {
            let page = client.transaction_history(filter, limit).await?;
            println!(
                "Showing {} of {} transactions",
                page.transactions.len(),
                page.total_count
            );
            for entry in page.transactions {
                let counterparty = entry
                    .receiver
                    .as_ref()
                    .or(entry.sender.as_ref())
                    .map(|party| party.name.clone())
                    .unwrap_or_else(|| "unknown".to_owned());
                println!(
                    "  {}  {}  {}  {}  [{}]",
                    entry.created_at.format("%Y-%m-%d"),
                    entry.transaction_ref,
                    Money::from_major_f64(entry.amount),
                    counterparty,
                    entry.status
                );
            }
        }
        Command::SetPin { pin } => {
            client.set_pin(&pin).await?;
            println!("Transaction PIN updated.");
        }
    }

    Ok(())
}
