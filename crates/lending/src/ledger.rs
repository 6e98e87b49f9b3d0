//! Collateral ledger
//!
//! Tracks each borrower's available and locked collateral. Every account sits
//! behind its own mutex; the owner map is only write-locked when a first
//! deposit creates a new account.

use bitloan_core::{Amount, OwnerId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::info;

use crate::error::LendingError;

/// One borrower's collateral position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralAccount {
    pub owner: OwnerId,
    /// Collateral not locked by any loan
    pub available: Amount,
    /// Sum of collateral locked by the owner's active loans
    pub locked: Amount,
}

impl CollateralAccount {
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            available: Amount::ZERO,
            locked: Amount::ZERO,
        }
    }

    /// available + locked
    pub fn total(&self) -> Amount {
        self.available
            .checked_add(&self.locked)
            .unwrap_or(self.available)
    }

    fn credit(&mut self, amount: Amount) -> Result<(), LendingError> {
        self.available = self
            .available
            .checked_add(&amount)
            .ok_or_else(|| LendingError::InvalidInput(format!("deposit of {} overflows", amount)))?;
        Ok(())
    }

    fn debit(&mut self, amount: Amount) -> Result<(), LendingError> {
        self.available = self.available.checked_sub(&amount).ok_or_else(|| {
            LendingError::InsufficientAvailableBalance {
                owner: self.owner.clone(),
                requested: amount.value(),
                available: self.available.value(),
            }
        })?;
        Ok(())
    }

    /// Move collateral from available to locked
    pub(crate) fn lock(&mut self, amount: Amount) -> Result<(), LendingError> {
        let available = self.available.checked_sub(&amount).ok_or_else(|| {
            LendingError::InsufficientCollateral {
                owner: self.owner.clone(),
                required: amount.value(),
                available: self.available.value(),
            }
        })?;
        let locked = self
            .locked
            .checked_add(&amount)
            .ok_or_else(|| LendingError::InvalidInput(format!("lock of {} overflows", amount)))?;
        self.available = available;
        self.locked = locked;
        Ok(())
    }

    /// Move collateral from locked back to available
    pub(crate) fn release(&mut self, amount: Amount) -> Result<(), LendingError> {
        let locked = self.locked.checked_sub(&amount).ok_or_else(|| {
            LendingError::InvalidInput(format!(
                "cannot release {} from {} locked for {}",
                amount, self.locked, self.owner
            ))
        })?;
        let available = self
            .available
            .checked_add(&amount)
            .ok_or_else(|| LendingError::InvalidInput(format!("release of {} overflows", amount)))?;
        self.locked = locked;
        self.available = available;
        Ok(())
    }

    /// Remove locked collateral entirely (liquidation)
    pub(crate) fn seize(&mut self, amount: Amount) -> Result<(), LendingError> {
        self.locked = self.locked.checked_sub(&amount).ok_or_else(|| {
            LendingError::InvalidInput(format!(
                "cannot seize {} from {} locked for {}",
                amount, self.locked, self.owner
            ))
        })?;
        Ok(())
    }
}

/// Collateral accounts keyed by owner
#[derive(Debug, Default)]
pub struct CollateralLedger {
    accounts: RwLock<HashMap<OwnerId, Arc<Mutex<CollateralAccount>>>>,
}

impl CollateralLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase available collateral, creating the account on first deposit
    pub fn deposit(&self, owner: &OwnerId, amount: Amount) -> Result<CollateralAccount, LendingError> {
        if amount.is_zero() {
            return Err(LendingError::InvalidInput(
                "deposit amount must be greater than zero".to_string(),
            ));
        }

        let handle = self.handle_or_create(owner);
        let mut account = handle.lock().unwrap_or_else(|e| e.into_inner());
        account.credit(amount)?;

        info!(owner = %owner, %amount, available = %account.available, "collateral deposited");
        Ok(account.clone())
    }

    /// Decrease available collateral
    ///
    /// Locked collateral can never be withdrawn.
    pub fn withdraw(&self, owner: &OwnerId, amount: Amount) -> Result<CollateralAccount, LendingError> {
        if amount.is_zero() {
            return Err(LendingError::InvalidInput(
                "withdrawal amount must be greater than zero".to_string(),
            ));
        }

        let handle = self
            .handle(owner)
            .ok_or_else(|| LendingError::AccountNotFound(owner.clone()))?;
        let mut account = handle.lock().unwrap_or_else(|e| e.into_inner());
        account.debit(amount)?;

        info!(owner = %owner, %amount, available = %account.available, "collateral withdrawn");
        Ok(account.clone())
    }

    /// Snapshot of an owner's account
    pub fn account(&self, owner: &OwnerId) -> Option<CollateralAccount> {
        let handle = self.handle(owner)?;
        let account = handle.lock().unwrap_or_else(|e| e.into_inner());
        Some(account.clone())
    }

    /// Snapshots of all accounts, ordered by owner
    pub fn accounts(&self) -> Vec<CollateralAccount> {
        let handles: Vec<_> = {
            let map = self.accounts.read().unwrap_or_else(|e| e.into_inner());
            map.values().cloned().collect()
        };
        let mut accounts: Vec<_> = handles
            .iter()
            .map(|h| h.lock().unwrap_or_else(|e| e.into_inner()).clone())
            .collect();
        accounts.sort_by(|a, b| a.owner.cmp(&b.owner));
        accounts
    }

    /// Run `f` while holding the owner's lock
    ///
    /// This is the single-writer section for the owner: the registry performs
    /// every loan transition inside it.
    pub(crate) fn with_account<R>(
        &self,
        owner: &OwnerId,
        f: impl FnOnce(&mut CollateralAccount) -> R,
    ) -> Option<R> {
        let handle = self.handle(owner)?;
        let mut account = handle.lock().unwrap_or_else(|e| e.into_inner());
        Some(f(&mut account))
    }

    /// Like `with_account`, creating an empty account first if needed
    pub(crate) fn with_account_or_create<R>(
        &self,
        owner: &OwnerId,
        f: impl FnOnce(&mut CollateralAccount) -> R,
    ) -> R {
        let handle = self.handle_or_create(owner);
        let mut account = handle.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut account)
    }

    fn handle(&self, owner: &OwnerId) -> Option<Arc<Mutex<CollateralAccount>>> {
        let map = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        map.get(owner).cloned()
    }

    fn handle_or_create(&self, owner: &OwnerId) -> Arc<Mutex<CollateralAccount>> {
        if let Some(handle) = self.handle(owner) {
            return handle;
        }
        let mut map = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        map.entry(owner.clone())
            .or_insert_with(|| Arc::new(Mutex::new(CollateralAccount::new(owner.clone()))))
            .clone()
    }
}
