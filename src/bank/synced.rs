use log::trace;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::{BankError, check_transfer};

struct Accounts {
    balances: Vec<f64>,
    closed: bool,
}

/// Balances behind a single lock, with transfers that wait for sufficient funds.
pub struct Bank {
    accounts: Mutex<Accounts>,
    sufficient_funds: Condvar,
}

impl Bank {
    /// `n` accounts, each starting at `initial_balance`.
    pub fn new(n: usize, initial_balance: f64) -> Self {
        Self::with_balances(vec![initial_balance; n])
    }

    pub fn with_balances(balances: Vec<f64>) -> Self {
        Self {
            accounts: Mutex::new(Accounts {
                balances,
                closed: false,
            }),
            sufficient_funds: Condvar::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Accounts>, BankError> {
        self.accounts.lock().map_err(|_| BankError::Poisoned)
    }

    /// The account count never changes after construction, so a poisoned lock still holds it.
    fn lock_unpoisoned(&self) -> MutexGuard<'_, Accounts> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move `amount` from `from` to `to`, waiting while `from` cannot cover it.
    ///
    /// The balance is re-checked after every wake-up; a wake-up only means some transfer
    /// completed, not that this one can proceed. Returns [`BankError::Closed`] if the bank is
    /// closed before the funds arrive.
    pub fn transfer(&self, from: usize, to: usize, amount: f64) -> Result<(), BankError> {
        let mut accounts = self.lock()?;
        check_transfer(accounts.balances.len(), from, to, amount)?;
        while !accounts.closed && accounts.balances[from] < amount {
            accounts = self
                .sufficient_funds
                .wait(accounts)
                .map_err(|_| BankError::Poisoned)?;
        }
        if accounts.closed {
            return Err(BankError::Closed);
        }
        accounts.balances[from] -= amount;
        accounts.balances[to] += amount;
        trace!(
            "{:?}: {:10.2} from {} to {} Total Balance: {:10.2}",
            std::thread::current().id(),
            amount,
            from,
            to,
            accounts.balances.iter().sum::<f64>()
        );
        // Several waiters may now be satisfied, each by a different account.
        self.sufficient_funds.notify_all();
        Ok(())
    }

    /// Sum of all balances. Takes the lock, so never sees half of a transfer.
    pub fn total_balance(&self) -> Result<f64, BankError> {
        Ok(self.lock()?.balances.iter().sum())
    }

    pub fn balance(&self, account: usize) -> Result<f64, BankError> {
        let accounts = self.lock()?;
        accounts
            .balances
            .get(account)
            .copied()
            .ok_or(BankError::NoSuchAccount {
                index: account,
                size: accounts.balances.len(),
            })
    }

    pub fn size(&self) -> usize {
        self.lock_unpoisoned().balances.len()
    }

    /// Reject further transfers and wake every waiting one with [`BankError::Closed`].
    pub fn close(&self) {
        let mut accounts = self.lock_unpoisoned();
        accounts.closed = true;
        self.sufficient_funds.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_input() {
        let bank = Bank::new(2, 10.0);
        assert_eq!(
            bank.transfer(0, 2, 1.0),
            Err(BankError::NoSuchAccount { index: 2, size: 2 })
        );
        assert_eq!(bank.transfer(0, 1, -1.0), Err(BankError::InvalidAmount(-1.0)));
        assert!(matches!(
            bank.transfer(0, 1, f64::NAN),
            Err(BankError::InvalidAmount(_))
        ));
        assert_eq!(bank.total_balance().unwrap(), 20.0);
    }

    #[test]
    fn poisoned_lock_keeps_size_and_fails_transfers() {
        let bank = Bank::new(3, 10.0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = bank.accounts.lock().unwrap();
            panic!("transfer panicked while holding the lock");
        }));
        assert!(result.is_err());
        assert!(bank.accounts.is_poisoned());

        assert_eq!(bank.size(), 3);
        assert_eq!(bank.transfer(0, 1, 1.0), Err(BankError::Poisoned));
        assert_eq!(bank.total_balance(), Err(BankError::Poisoned));
    }

    #[test]
    fn closed_bank_refuses_transfers() {
        let bank = Bank::new(2, 10.0);
        bank.close();
        assert_eq!(bank.transfer(0, 1, 1.0), Err(BankError::Closed));
        assert_eq!(bank.balance(0).unwrap(), 10.0);
    }
}
