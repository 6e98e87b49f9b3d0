//! Application context - wires everything together
//!
//! Flow for every state change: validate → mutate (under the owner lock) →
//! append to journal → publish on the bus. On startup the journal is
//! replayed through the registry to rebuild balances and loans.

use bitloan_bus::{EventBus, LoggingSubscriber};
use bitloan_core::{Amount, Asset, LoanId, OwnerId};
use bitloan_events::{EventReader, EventStore, RecordedEvent};
use bitloan_lending::{
    CollateralAccount, CollateralLedger, InterestCalculator, LendingError, LiquidationEvent,
    LiquidationMonitor, Loan, LoanEvent, LoanRegistry, OriginationRequest,
};
use bitloan_oracle::{MockOracle, PriceOracle, PriceSnapshot};
use bitloan_risk::{BorrowerSignals, RiskAssessment, RiskEngine, SignalsProvider, StaticSignals};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppError;

/// Terms quoted for a borrow request
#[derive(Debug, Clone)]
pub struct Quote {
    pub collateral_value: Decimal,
    pub borrowed_value: Decimal,
    pub assessment: RiskAssessment,
}

/// Application context - wires together all components
pub struct AppContext {
    config: AppConfig,
    risk: RiskEngine,
    registry: LoanRegistry,
    monitor: LiquidationMonitor,
    interest: InterestCalculator,
    oracle: Arc<dyn PriceOracle>,
    signals: Arc<dyn SignalsProvider>,
    event_store: EventStore,
    bus: EventBus,
    journal_path: PathBuf,
}

impl AppContext {
    /// Create a context with default configuration, the mock oracle and
    /// neutral borrower signals
    pub async fn new(data_path: impl AsRef<Path>) -> Result<Self, AppError> {
        Self::with_config(data_path, AppConfig::default()).await
    }

    /// Create a context whose oracle and signals come from `config`
    pub async fn with_config(
        data_path: impl AsRef<Path>,
        config: AppConfig,
    ) -> Result<Self, AppError> {
        let oracle = MockOracle::with_defaults();
        for (asset, price) in &config.prices {
            oracle.set_price(asset.clone(), *price);
        }
        let signals = StaticSignals::new();
        for (owner, owner_signals) in &config.signals {
            signals.set_signals(owner.clone(), owner_signals.clone());
        }
        Self::with_ports(data_path, config, Arc::new(oracle), Arc::new(signals)).await
    }

    /// Create a context with explicit oracle and signals ports
    pub async fn with_ports(
        data_path: impl AsRef<Path>,
        config: AppConfig,
        oracle: Arc<dyn PriceOracle>,
        signals: Arc<dyn SignalsProvider>,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let journal_path = data_path.as_ref().join("journal");
        std::fs::create_dir_all(&journal_path)?;

        let event_store = EventStore::new(&journal_path)?;
        let mut bus = EventBus::new(&journal_path);
        bus.register(Arc::new(LoggingSubscriber));

        let risk = RiskEngine::new(config.risk.clone())?;
        let registry = LoanRegistry::new(Arc::new(CollateralLedger::new()), config.lending.clone());
        let interest = InterestCalculator::with_days_per_year(config.lending.days_per_year);

        // Replay events to rebuild state
        let records = EventReader::from_directory(&journal_path)?.read_all()?;
        for record in &records {
            registry
                .apply(&record.event)
                .map_err(|source| AppError::Replay {
                    sequence: record.sequence,
                    source,
                })?;
        }
        if !records.is_empty() {
            info!(events = records.len(), loans = registry.loan_count(), "journal replayed");
        }

        Ok(Self {
            config,
            risk,
            registry,
            monitor: LiquidationMonitor::new(),
            interest,
            oracle,
            signals,
            event_store,
            bus,
            journal_path,
        })
    }

    // === Risk ===

    /// Assess a request given reference-currency values
    pub fn assess_risk(
        &self,
        collateral_value: Decimal,
        requested_value: Decimal,
        signals: &BorrowerSignals,
    ) -> Result<RiskAssessment, AppError> {
        Ok(self.risk.assess(collateral_value, requested_value, signals)?)
    }

    /// Price a borrow request and assess it with the owner's signals
    pub async fn quote(
        &self,
        owner: &OwnerId,
        collateral_amount: Decimal,
        borrowed_amount: Decimal,
        borrowed_asset: &Asset,
    ) -> Result<Quote, AppError> {
        let collateral_amount = Amount::positive(collateral_amount).map_err(LendingError::from)?;
        let borrowed_amount = Amount::positive(borrowed_amount).map_err(LendingError::from)?;

        let collateral_price = self.current_price(&self.config.lending.collateral_asset).await?;
        let borrowed_price = self.current_price(borrowed_asset).await?;
        let collateral_value = value_of(collateral_amount, collateral_price, "collateral_amount")?;
        let borrowed_value = value_of(borrowed_amount, borrowed_price, "borrowed_amount")?;

        let signals = self.signals.get_signals(owner).await?;
        let assessment = self.assess_risk(collateral_value, borrowed_value, &signals)?;

        Ok(Quote {
            collateral_value,
            borrowed_value,
            assessment,
        })
    }

    // === Collateral ===

    pub async fn deposit_collateral(
        &mut self,
        owner: &OwnerId,
        amount: Decimal,
    ) -> Result<CollateralAccount, AppError> {
        let amount = Amount::positive(amount).map_err(LendingError::from)?;
        let account = self.registry.ledger().deposit(owner, amount)?;
        self.commit(LoanEvent::CollateralDeposited {
            owner: owner.clone(),
            amount,
            at: Utc::now(),
        })
        .await?;
        Ok(account)
    }

    pub async fn withdraw_collateral(
        &mut self,
        owner: &OwnerId,
        amount: Decimal,
    ) -> Result<CollateralAccount, AppError> {
        let amount = Amount::positive(amount).map_err(LendingError::from)?;
        let account = self.registry.ledger().withdraw(owner, amount)?;
        self.commit(LoanEvent::CollateralWithdrawn {
            owner: owner.clone(),
            amount,
            at: Utc::now(),
        })
        .await?;
        Ok(account)
    }

    pub fn get_collateral_account(&self, owner: &OwnerId) -> Option<CollateralAccount> {
        self.registry.ledger().account(owner)
    }

    // === Loans ===

    /// Price, assess and open a loan
    pub async fn originate_loan(
        &mut self,
        owner: &OwnerId,
        collateral_amount: Decimal,
        borrowed_amount: Decimal,
        borrowed_asset: Asset,
    ) -> Result<Loan, AppError> {
        let quote = self
            .quote(owner, collateral_amount, borrowed_amount, &borrowed_asset)
            .await?;

        let loan = self.registry.originate(
            OriginationRequest {
                owner: owner.clone(),
                collateral_amount,
                borrowed_amount,
                borrowed_asset,
                borrowed_value: quote.borrowed_value,
            },
            &quote.assessment,
        )?;

        self.commit(LoanEvent::LoanOriginated { loan: loan.clone() })
            .await?;
        Ok(loan)
    }

    /// Repay a loan in full
    pub async fn repay_loan(&mut self, loan_id: LoanId, amount: Decimal) -> Result<Loan, AppError> {
        let loan = self.registry.repay(loan_id, amount)?;
        self.commit(LoanEvent::LoanRepaid {
            loan_id,
            owner: loan.owner.clone(),
            amount: Amount::new(amount).map_err(LendingError::from)?,
            at: loan.closed_at.unwrap_or_else(Utc::now),
        })
        .await?;
        Ok(loan)
    }

    pub fn get_loan(&self, loan_id: LoanId) -> Option<Loan> {
        self.registry.get_loan(loan_id)
    }

    pub fn list_loans(&self, owner: &OwnerId) -> Vec<Loan> {
        self.registry.list_loans(owner)
    }

    /// Principal plus simple interest accrued up to `at`
    pub fn amount_due(&self, loan_id: LoanId, at: DateTime<Utc>) -> Option<Decimal> {
        self.registry
            .get_loan(loan_id)
            .map(|loan| self.interest.amount_due(&loan, at))
    }

    // === Liquidation ===

    /// Check every active loan against `snapshot`, journaling liquidations
    /// and warnings
    pub async fn check_liquidations(
        &mut self,
        snapshot: &PriceSnapshot,
    ) -> Result<Vec<LiquidationEvent>, AppError> {
        let events = self.monitor.check(&self.registry, snapshot)?;
        for event in &events {
            self.commit(event.to_loan_event()).await?;
        }
        Ok(events)
    }

    /// Fresh snapshot of every asset the active loans depend on
    ///
    /// Stale or invalid quotes fail the whole snapshot.
    pub async fn refresh_prices(&self) -> Result<PriceSnapshot, AppError> {
        let mut assets = vec![self.config.lending.collateral_asset.clone()];
        for loan_id in self.registry.active_loan_ids() {
            if let Some(loan) = self.registry.get_loan(loan_id) {
                for asset in [loan.collateral_asset, loan.borrowed_asset] {
                    if !assets.contains(&asset) {
                        assets.push(asset);
                    }
                }
            }
        }
        Ok(self
            .oracle
            .snapshot(&assets, self.config.max_price_age_secs)
            .await?)
    }

    /// `refresh_prices` followed by `check_liquidations`
    pub async fn run_liquidation_check(&mut self) -> Result<Vec<LiquidationEvent>, AppError> {
        let snapshot = self.refresh_prices().await?;
        self.check_liquidations(&snapshot).await
    }

    // === Journal ===

    /// Append a committed event to the journal and publish it
    async fn commit(&mut self, event: LoanEvent) -> Result<RecordedEvent, AppError> {
        let record = RecordedEvent::new(self.event_store.next_sequence(), event);
        self.event_store.append(&record)?;

        // Subscribers are best-effort once the record is on disk
        if let Err(e) = self.bus.publish(record.clone()).await {
            warn!(sequence = record.sequence, error = %e, "event published with subscriber errors");
        }
        Ok(record)
    }

    async fn current_price(&self, asset: &Asset) -> Result<Decimal, AppError> {
        let snapshot = self
            .oracle
            .snapshot(std::slice::from_ref(asset), self.config.max_price_age_secs)
            .await?;
        snapshot
            .price_of(asset)
            .ok_or_else(|| AppError::Config(format!("no price for {}", asset)))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &LoanRegistry {
        &self.registry
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    pub fn last_sequence(&self) -> u64 {
        self.event_store.last_sequence()
    }
}

/// Reference-currency value of `amount` at `price`
fn value_of(amount: Amount, price: Decimal, field: &str) -> Result<Decimal, LendingError> {
    amount.value().checked_mul(price).ok_or_else(|| {
        LendingError::InvalidInput(format!(
            "{} {} at price {} is outside the representable range",
            field, amount, price
        ))
    })
}
