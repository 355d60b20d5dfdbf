//! Account transfers between fixed balances: the condition-wait counterpart to the pipeline.
//!
//! [`Bank`] guards every balance with one mutex and parks transfers on a condition variable until
//! the source account can cover them. [`UnsyncBank`] has the same shape with no lock at all and
//! keeps its data race on purpose: under concurrent transfers its total drifts.

pub mod synced;
pub mod unsynced;

pub use synced::Bank;
pub use unsynced::UnsyncBank;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BankError {
    #[error("no such account: {index} (bank has {size})")]
    NoSuchAccount { index: usize, size: usize },
    #[error("invalid transfer amount: {0}")]
    InvalidAmount(f64),
    /// The bank was closed while (or before) the transfer waited for funds.
    #[error("bank closed")]
    Closed,
    #[error("bank lock poisoned by a panicked transfer")]
    Poisoned,
}

pub(crate) fn check_transfer(
    size: usize,
    from: usize,
    to: usize,
    amount: f64,
) -> Result<(), BankError> {
    for index in [from, to] {
        if index >= size {
            return Err(BankError::NoSuchAccount { index, size });
        }
    }
    if !amount.is_finite() || amount < 0.0 {
        return Err(BankError::InvalidAmount(amount));
    }
    Ok(())
}
