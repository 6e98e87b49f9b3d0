//! BitLoan CLI - Main entry point

use bitloan_core::{Asset, LoanId, OwnerId};
use bitloan_rpc::{commands, AppConfig, AppContext};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bitloan")]
#[command(about = "BitLoan - Collateralized loans with personalized terms", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Price override, e.g. --price ckBTC=34500 (repeatable)
    #[arg(long = "price", value_parser = parse_price)]
    prices: Vec<(Asset, Decimal)>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deposit collateral
    Deposit {
        /// Owner ID
        owner: OwnerId,
        /// Amount of collateral
        amount: Decimal,
    },

    /// Withdraw available collateral
    Withdraw {
        /// Owner ID
        owner: OwnerId,
        /// Amount of collateral
        amount: Decimal,
    },

    /// Show the terms for a borrow request
    Assess {
        /// Owner ID
        owner: OwnerId,
        /// Collateral to lock
        collateral: Decimal,
        /// Amount to borrow
        borrow: Decimal,
        /// Asset to borrow
        #[arg(long, default_value = "ckUSDT")]
        asset: Asset,
    },

    /// Open a loan
    Borrow {
        /// Owner ID
        owner: OwnerId,
        /// Collateral to lock
        collateral: Decimal,
        /// Amount to borrow
        borrow: Decimal,
        /// Asset to borrow
        #[arg(long, default_value = "ckUSDT")]
        asset: Asset,
    },

    /// Repay a loan in full
    Repay {
        /// Loan ID
        loan_id: LoanId,
        /// Repayment amount (at least the principal)
        amount: Decimal,
    },

    /// Show a loan
    Loan {
        /// Loan ID
        loan_id: LoanId,
    },

    /// List an owner's loans
    Loans {
        /// Owner ID
        owner: OwnerId,
    },

    /// Show an owner's collateral account
    Account {
        /// Owner ID
        owner: OwnerId,
    },

    /// Check all active loans against current prices
    Liquidations,
}

fn parse_price(s: &str) -> Result<(Asset, Decimal), String> {
    let (asset, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ASSET=VALUE, got '{}'", s))?;
    let asset: Asset = asset.parse().map_err(|e| format!("{}", e))?;
    let value: Decimal = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid price '{}': {}", value, e))?;
    if value <= Decimal::ZERO {
        return Err(format!("price for {} must be positive", asset));
    }
    Ok((asset, value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.prices.extend(cli.prices);

    // Create application context
    let mut ctx = AppContext::with_config(&cli.data, config).await?;

    match cli.command {
        Commands::Deposit { owner, amount } => {
            commands::deposit(&mut ctx, &owner, amount).await?;
        }

        Commands::Withdraw { owner, amount } => {
            commands::withdraw(&mut ctx, &owner, amount).await?;
        }

        Commands::Assess {
            owner,
            collateral,
            borrow,
            asset,
        } => {
            commands::assess(&ctx, &owner, collateral, borrow, &asset).await?;
        }

        Commands::Borrow {
            owner,
            collateral,
            borrow,
            asset,
        } => {
            commands::borrow(&mut ctx, &owner, collateral, borrow, asset).await?;
        }

        Commands::Repay { loan_id, amount } => {
            commands::repay(&mut ctx, loan_id, amount).await?;
        }

        Commands::Loan { loan_id } => {
            commands::loan(&ctx, loan_id).await?;
        }

        Commands::Loans { owner } => {
            commands::loans(&ctx, &owner).await?;
        }

        Commands::Account { owner } => {
            commands::account(&ctx, &owner).await?;
        }

        Commands::Liquidations => {
            commands::liquidations(&mut ctx).await?;
        }
    }

    Ok(())
}
