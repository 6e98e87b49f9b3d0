//! Loan registry - owns loan records and enforces the loan state machine
//!
//! ```text
//! Active ──repay──────▶ Repaid      (terminal)
//!    │
//!    └────liquidate───▶ Liquidated  (terminal)
//! ```
//!
//! Every transition runs inside the owner's collateral lock, so a repay and a
//! liquidation of the same loan are totally ordered: the first writer wins and
//! the second observes a closed loan.

use bitloan_core::{Amount, Asset, LoanId, OwnerId};
use bitloan_oracle::PriceSnapshot;
use bitloan_risk::RiskAssessment;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use crate::config::LendingConfig;
use crate::error::LendingError;
use crate::event::LoanEvent;
use crate::ledger::{CollateralAccount, CollateralLedger};
use crate::loan::{Loan, LoanStatus};

/// Inputs for a new loan
#[derive(Debug, Clone)]
pub struct OriginationRequest {
    pub owner: OwnerId,
    pub collateral_amount: Decimal,
    pub borrowed_amount: Decimal,
    pub borrowed_asset: Asset,
    /// `borrowed_amount` in the reference currency, compared against the
    /// assessment's maximum loan amount
    pub borrowed_value: Decimal,
}

/// Result of checking one loan against a price snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Evaluation {
    Liquidated {
        loan: Loan,
        live_ratio: Decimal,
        at: DateTime<Utc>,
    },
    Warning {
        loan: Loan,
        live_ratio: Decimal,
        at: DateTime<Utc>,
    },
    Healthy,
    /// Already closed, or no longer known
    Inactive,
    /// A price needed for the ratio is missing from the snapshot
    Unpriced(Asset),
}

/// Loan registry
pub struct LoanRegistry {
    ledger: Arc<CollateralLedger>,
    loans: RwLock<HashMap<LoanId, Loan>>,
    config: LendingConfig,
}

impl LoanRegistry {
    pub fn new(ledger: Arc<CollateralLedger>, config: LendingConfig) -> Self {
        Self {
            ledger,
            loans: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn ledger(&self) -> &Arc<CollateralLedger> {
        &self.ledger
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    /// Open a loan against the owner's available collateral
    ///
    /// Terms are copied from `assessment`. Fails without side effects if any
    /// amount is not positive, the owner lacks collateral, or the borrowed
    /// value exceeds the assessment's maximum.
    pub fn originate(
        &self,
        request: OriginationRequest,
        assessment: &RiskAssessment,
    ) -> Result<Loan, LendingError> {
        let collateral_amount = Amount::positive(request.collateral_amount)?;
        let borrowed_amount = Amount::positive(request.borrowed_amount)?;
        if request.borrowed_value <= Decimal::ZERO {
            return Err(LendingError::InvalidInput(format!(
                "borrowed value must be greater than zero, got {}",
                request.borrowed_value
            )));
        }

        let owner = request.owner.clone();
        let loan = self
            .ledger
            .with_account(&owner, |account| {
                if account.available < collateral_amount {
                    return Err(LendingError::InsufficientCollateral {
                        owner: owner.clone(),
                        required: collateral_amount.value(),
                        available: account.available.value(),
                    });
                }
                if request.borrowed_value > assessment.max_loan_amount {
                    return Err(LendingError::ExceedsMaxLoan {
                        requested: request.borrowed_value,
                        max: assessment.max_loan_amount,
                    });
                }

                account.lock(collateral_amount)?;

                let now = Utc::now();
                let loan = Loan {
                    id: LoanId::generate(),
                    owner: owner.clone(),
                    collateral_asset: self.config.collateral_asset.clone(),
                    collateral_amount,
                    borrowed_asset: request.borrowed_asset.clone(),
                    borrowed_amount,
                    borrowed_value: request.borrowed_value,
                    collateral_ratio_at_origination: assessment.personalized_collateral_ratio,
                    liquidation_threshold: assessment.liquidation_threshold,
                    interest_rate: assessment.interest_rate,
                    risk_score_at_origination: Some(assessment.risk_score),
                    originated_at: now,
                    due_date: now + Duration::days(i64::from(self.config.loan_term_days)),
                    status: LoanStatus::Active,
                    closed_at: None,
                };
                self.write_loans().insert(loan.id, loan.clone());
                Ok(loan)
            })
            .unwrap_or_else(|| {
                Err(LendingError::InsufficientCollateral {
                    owner: owner.clone(),
                    required: collateral_amount.value(),
                    available: Decimal::ZERO,
                })
            })?;

        info!(
            loan_id = %loan.id,
            owner = %loan.owner,
            collateral = %loan.collateral_amount,
            borrowed = %loan.borrowed_amount,
            asset = %loan.borrowed_asset,
            rate = %loan.interest_rate,
            "loan originated"
        );
        Ok(loan)
    }

    /// Repay an active loan in full and release its collateral
    ///
    /// Only full repayment is accepted: `amount` must cover the principal.
    pub fn repay(&self, loan_id: LoanId, amount: Decimal) -> Result<Loan, LendingError> {
        let amount = Amount::positive(amount)?;
        let owner = self.owner_of(loan_id)?;

        let loan = self
            .ledger
            .with_account(&owner, |account| {
                let mut loan = self.active_loan(loan_id)?;
                if amount < loan.borrowed_amount {
                    return Err(LendingError::InsufficientRepayment {
                        loan_id,
                        required: loan.borrowed_amount.value(),
                        offered: amount.value(),
                    });
                }

                account.release(loan.collateral_amount)?;
                loan.close(LoanStatus::Repaid, Utc::now());
                self.write_loans().insert(loan_id, loan.clone());
                Ok(loan)
            })
            .ok_or_else(|| LendingError::AccountNotFound(owner.clone()))??;

        info!(
            loan_id = %loan.id,
            owner = %loan.owner,
            released = %loan.collateral_amount,
            "loan repaid"
        );
        Ok(loan)
    }

    /// Check one loan against a snapshot, liquidating it when the live ratio
    /// is at or below its threshold
    pub(crate) fn evaluate(
        &self,
        loan_id: LoanId,
        snapshot: &PriceSnapshot,
    ) -> Result<Evaluation, LendingError> {
        let owner = match self.owner_of(loan_id) {
            Ok(owner) => owner,
            Err(_) => return Ok(Evaluation::Inactive),
        };

        self.ledger
            .with_account(&owner, |account| {
                let loan = match self.get_loan(loan_id) {
                    Some(loan) if loan.is_active() => loan,
                    _ => return Ok(Evaluation::Inactive),
                };

                let collateral_price = match snapshot.price_of(&loan.collateral_asset) {
                    Some(price) => price,
                    None => return Ok(Evaluation::Unpriced(loan.collateral_asset.clone())),
                };
                let borrowed_price = match snapshot.price_of(&loan.borrowed_asset) {
                    Some(price) => price,
                    None => return Ok(Evaluation::Unpriced(loan.borrowed_asset.clone())),
                };
                let live_ratio = loan
                    .live_collateral_ratio(collateral_price, borrowed_price)
                    .ok_or_else(|| {
                        LendingError::InvalidInput(format!(
                            "cannot compute collateral ratio for loan {}",
                            loan_id
                        ))
                    })?;

                let at = Utc::now();
                if live_ratio <= loan.liquidation_threshold {
                    let loan = self.liquidate_locked(account, loan, at)?;
                    Ok(Evaluation::Liquidated {
                        loan,
                        live_ratio,
                        at,
                    })
                } else if live_ratio <= loan.liquidation_threshold + self.config.warning_band {
                    Ok(Evaluation::Warning {
                        loan,
                        live_ratio,
                        at,
                    })
                } else {
                    Ok(Evaluation::Healthy)
                }
            })
            .unwrap_or(Ok(Evaluation::Inactive))
    }

    /// Seize the collateral of an active loan. Caller holds the owner lock.
    fn liquidate_locked(
        &self,
        account: &mut CollateralAccount,
        mut loan: Loan,
        at: DateTime<Utc>,
    ) -> Result<Loan, LendingError> {
        account.seize(loan.collateral_amount)?;
        loan.close(LoanStatus::Liquidated, at);
        self.write_loans().insert(loan.id, loan.clone());
        Ok(loan)
    }

    /// Re-apply a journaled event
    ///
    /// Effects match the original transition, but the assessment and price
    /// checks that admitted it are not repeated.
    pub fn apply(&self, event: &LoanEvent) -> Result<(), LendingError> {
        match event {
            LoanEvent::CollateralDeposited { owner, amount, .. } => {
                self.ledger.deposit(owner, *amount)?;
            }
            LoanEvent::CollateralWithdrawn { owner, amount, .. } => {
                self.ledger.withdraw(owner, *amount)?;
            }
            LoanEvent::LoanOriginated { loan } => {
                self.ledger.with_account_or_create(&loan.owner, |account| {
                    account.lock(loan.collateral_amount)?;
                    self.write_loans().insert(loan.id, loan.clone());
                    Ok::<_, LendingError>(())
                })?;
            }
            LoanEvent::LoanRepaid { loan_id, owner, at, .. } => {
                self.ledger
                    .with_account(owner, |account| {
                        let mut loan = self.active_loan(*loan_id)?;
                        account.release(loan.collateral_amount)?;
                        loan.close(LoanStatus::Repaid, *at);
                        self.write_loans().insert(loan.id, loan);
                        Ok::<_, LendingError>(())
                    })
                    .ok_or_else(|| LendingError::AccountNotFound(owner.clone()))??;
            }
            LoanEvent::LoanLiquidated { loan_id, owner, at, .. } => {
                self.ledger
                    .with_account(owner, |account| {
                        let loan = self.active_loan(*loan_id)?;
                        self.liquidate_locked(account, loan, *at).map(|_| ())
                    })
                    .ok_or_else(|| LendingError::AccountNotFound(owner.clone()))??;
            }
            LoanEvent::LiquidationWarning { .. } => {}
        }
        Ok(())
    }

    pub fn get_loan(&self, loan_id: LoanId) -> Option<Loan> {
        self.read_loans().get(&loan_id).cloned()
    }

    /// All loans of one owner, oldest first
    pub fn list_loans(&self, owner: &OwnerId) -> Vec<Loan> {
        let mut loans: Vec<_> = self
            .read_loans()
            .values()
            .filter(|loan| &loan.owner == owner)
            .cloned()
            .collect();
        loans.sort_by(|a, b| a.originated_at.cmp(&b.originated_at).then(a.id.cmp(&b.id)));
        loans
    }

    /// Ids of every active loan, oldest first
    pub fn active_loan_ids(&self) -> Vec<LoanId> {
        let loans = self.read_loans();
        let mut active: Vec<_> = loans.values().filter(|loan| loan.is_active()).collect();
        active.sort_by(|a, b| a.originated_at.cmp(&b.originated_at).then(a.id.cmp(&b.id)));
        active.into_iter().map(|loan| loan.id).collect()
    }

    pub fn loan_count(&self) -> usize {
        self.read_loans().len()
    }

    fn owner_of(&self, loan_id: LoanId) -> Result<OwnerId, LendingError> {
        self.read_loans()
            .get(&loan_id)
            .map(|loan| loan.owner.clone())
            .ok_or(LendingError::LoanNotFound(loan_id))
    }

    fn active_loan(&self, loan_id: LoanId) -> Result<Loan, LendingError> {
        let loan = self
            .get_loan(loan_id)
            .ok_or(LendingError::LoanNotFound(loan_id))?;
        if !loan.is_active() {
            warn!(loan_id = %loan_id, status = %loan.status, "transition on closed loan rejected");
            return Err(LendingError::LoanNotActive {
                loan_id,
                status: loan.status,
            });
        }
        Ok(loan)
    }

    fn read_loans(&self) -> std::sync::RwLockReadGuard<'_, HashMap<LoanId, Loan>> {
        self.loans.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_loans(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<LoanId, Loan>> {
        self.loans.write().unwrap_or_else(|e| e.into_inner())
    }
}
