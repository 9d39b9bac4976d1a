//! Wallet balances.
//!
//! Balances are integer minor currency units (paise). A wallet is only ever changed
//! through the ledger's credit/debit helpers, each of which bumps `version`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;
use crate::UserId;

/// A user's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Owning user.
    pub user_id: UserId,

    /// Balance in minor units; never negative.
    pub balance: i64,

    /// Optimistic-concurrency token, incremented on every mutation.
    pub version: u64,

    /// When the wallet was opened.
    pub created_at: DateTime<Utc>,

    /// When the wallet was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Open an empty wallet.
    #[must_use]
    pub fn open(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the wallet can cover a debit.
    #[must_use]
    pub fn has_sufficient_funds(&self, amount: i64) -> bool {
        self.balance >= amount
    }

    /// Return a copy with `amount` added.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount` is not positive or the balance would overflow.
    pub fn credited(&self, amount: i64) -> Result<Self, PaymentError> {
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(format!(
                "amount must be positive, got {amount}"
            )));
        }
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| PaymentError::InvalidAmount("balance overflow".into()))?;
        Ok(self.bumped(balance))
    }

    /// Return a copy with `amount` removed.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount` is not positive, `InsufficientFunds` if the
    /// balance cannot cover it.
    pub fn debited(&self, amount: i64) -> Result<Self, PaymentError> {
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(format!(
                "amount must be positive, got {amount}"
            )));
        }
        if !self.has_sufficient_funds(amount) {
            return Err(PaymentError::InsufficientFunds {
                balance: self.balance,
                required: amount,
            });
        }
        Ok(self.bumped(self.balance - amount))
    }

    fn bumped(&self, balance: i64) -> Self {
        Self {
            balance,
            version: self.version + 1,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}
