//! CLI commands

use bitloan_core::{Asset, LoanId, OwnerId};
use bitloan_lending::{LiquidationKind, Loan};
use chrono::Utc;
use rust_decimal::Decimal;

use crate::context::AppContext;

/// Deposit collateral for an owner
pub async fn deposit(ctx: &mut AppContext, owner: &OwnerId, amount: Decimal) -> Result<(), anyhow::Error> {
    let account = ctx.deposit_collateral(owner, amount).await?;
    let asset = &ctx.config().lending.collateral_asset;

    println!(
        "✅ Deposited {} {} for {} (available: {}, seq: {})",
        amount,
        asset,
        owner,
        account.available,
        ctx.last_sequence()
    );
    Ok(())
}

/// Withdraw available collateral
pub async fn withdraw(ctx: &mut AppContext, owner: &OwnerId, amount: Decimal) -> Result<(), anyhow::Error> {
    let account = ctx.withdraw_collateral(owner, amount).await?;
    let asset = &ctx.config().lending.collateral_asset;

    println!(
        "✅ Withdrew {} {} for {} (available: {}, seq: {})",
        amount,
        asset,
        owner,
        account.available,
        ctx.last_sequence()
    );
    Ok(())
}

/// Show the terms a borrow request would get, without opening a loan
pub async fn assess(
    ctx: &AppContext,
    owner: &OwnerId,
    collateral: Decimal,
    borrow: Decimal,
    asset: &Asset,
) -> Result<(), anyhow::Error> {
    let quote = ctx.quote(owner, collateral, borrow, asset).await?;
    let a = &quote.assessment;

    println!("Risk assessment for {}", owner);
    println!("  Collateral value:   {}", quote.collateral_value.round_dp(2));
    println!("  Requested value:    {}", quote.borrowed_value.round_dp(2));
    println!("  Risk level:         {} (score {})", a.risk_level, a.risk_score);
    println!("  Collateral ratio:   {}%", a.personalized_collateral_ratio.round_dp(2));
    println!("  Liquidation at:     {}%", a.liquidation_threshold);
    println!("  Interest rate:      {}%", a.interest_rate.round_dp(2));
    println!("  Max loan amount:    {}", a.max_loan_amount.round_dp(2));
    println!("  Factors:");
    for factor in &a.factors {
        println!(
            "    {:<18} {:>3} ({}) - {}",
            factor.name,
            factor.score.round_dp(0),
            factor.impact,
            factor.description
        );
    }
    println!("  Recommendations:");
    for recommendation in &a.recommendations {
        println!("    - {}", recommendation);
    }
    Ok(())
}

/// Open a loan
pub async fn borrow(
    ctx: &mut AppContext,
    owner: &OwnerId,
    collateral: Decimal,
    borrow: Decimal,
    asset: Asset,
) -> Result<(), anyhow::Error> {
    let loan = ctx.originate_loan(owner, collateral, borrow, asset).await?;

    println!("✅ Loan {} originated (seq: {})", loan.id, ctx.last_sequence());
    print_loan(ctx, &loan);
    Ok(())
}

/// Repay a loan in full
pub async fn repay(ctx: &mut AppContext, loan_id: LoanId, amount: Decimal) -> Result<(), anyhow::Error> {
    let loan = ctx.repay_loan(loan_id, amount).await?;

    println!(
        "✅ Loan {} repaid, {} {} released (seq: {})",
        loan.id,
        loan.collateral_amount,
        loan.collateral_asset,
        ctx.last_sequence()
    );
    Ok(())
}

/// Show one loan
pub async fn loan(ctx: &AppContext, loan_id: LoanId) -> Result<(), anyhow::Error> {
    let loan = ctx
        .get_loan(loan_id)
        .ok_or_else(|| anyhow::anyhow!("Loan not found: {}", loan_id))?;
    print_loan(ctx, &loan);
    Ok(())
}

/// List an owner's loans
pub async fn loans(ctx: &AppContext, owner: &OwnerId) -> Result<(), anyhow::Error> {
    let loans = ctx.list_loans(owner);
    if loans.is_empty() {
        println!("No loans for {}", owner);
        return Ok(());
    }

    println!("Loans for {}:", owner);
    for loan in &loans {
        println!(
            "  {} {:<10} {} {} against {} {} @ {}%",
            loan.id,
            loan.status.to_string(),
            loan.borrowed_amount,
            loan.borrowed_asset,
            loan.collateral_amount,
            loan.collateral_asset,
            loan.interest_rate.round_dp(2)
        );
    }
    Ok(())
}

/// Show an owner's collateral account
pub async fn account(ctx: &AppContext, owner: &OwnerId) -> Result<(), anyhow::Error> {
    let asset = &ctx.config().lending.collateral_asset;
    match ctx.get_collateral_account(owner) {
        Some(account) => {
            println!("Collateral for {}:", owner);
            println!("  Available: {} {}", account.available, asset);
            println!("  Locked:    {} {}", account.locked, asset);
        }
        None => println!("No collateral account for {}", owner),
    }
    Ok(())
}

/// Price every active loan and liquidate the underwater ones
pub async fn liquidations(ctx: &mut AppContext) -> Result<(), anyhow::Error> {
    let events = ctx.run_liquidation_check().await?;
    if events.is_empty() {
        println!("✅ All active loans are healthy");
        return Ok(());
    }

    for event in &events {
        match event.kind {
            LiquidationKind::Liquidated => println!(
                "❌ Liquidated {} ({}): ratio {}% <= {}%, seized {}",
                event.loan_id,
                event.owner,
                event.live_collateral_ratio.round_dp(2),
                event.liquidation_threshold,
                event.collateral_seized
            ),
            LiquidationKind::Warning => println!(
                "⚠️  Warning {} ({}): ratio {}% near {}%",
                event.loan_id,
                event.owner,
                event.live_collateral_ratio.round_dp(2),
                event.liquidation_threshold
            ),
        }
    }
    Ok(())
}

fn print_loan(ctx: &AppContext, loan: &Loan) {
    println!("Loan {}", loan.id);
    println!("  Owner:            {}", loan.owner);
    println!("  Status:           {}", loan.status);
    println!("  Collateral:       {} {}", loan.collateral_amount, loan.collateral_asset);
    println!("  Borrowed:         {} {}", loan.borrowed_amount, loan.borrowed_asset);
    println!("  Collateral ratio: {}%", loan.collateral_ratio_at_origination.round_dp(2));
    println!("  Liquidation at:   {}%", loan.liquidation_threshold);
    println!("  Interest rate:    {}%", loan.interest_rate.round_dp(2));
    println!("  Due:              {}", loan.due_date.format("%Y-%m-%d %H:%M UTC"));
    if let Some(due) = ctx.amount_due(loan.id, Utc::now()) {
        println!("  Amount due:       {}", due.round_dp(2));
    }
}
