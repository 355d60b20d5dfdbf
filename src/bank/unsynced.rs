use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use super::{BankError, check_transfer};

/// Balances with no lock. Each balance is an atomic cell holding `f64` bits, but a transfer is a
/// separate load and store on each side, so concurrent transfers overwrite each other and a
/// concurrent [`total_balance`](Self::total_balance) can see money in neither account.
///
/// Kept racy on purpose for comparison with [`Bank`](super::Bank). Do not use for real balances.
pub struct UnsyncBank {
    balances: Vec<AtomicU64>,
}

fn read(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Relaxed))
}

fn write(cell: &AtomicU64, value: f64) {
    cell.store(value.to_bits(), Ordering::Relaxed);
}

impl UnsyncBank {
    pub fn new(n: usize, initial_balance: f64) -> Self {
        Self::with_balances(vec![initial_balance; n])
    }

    pub fn with_balances(balances: Vec<f64>) -> Self {
        Self {
            balances: balances
                .into_iter()
                .map(|b| AtomicU64::new(b.to_bits()))
                .collect(),
        }
    }

    /// Move `amount` from `from` to `to` if `from` looks like it can cover it. Never waits:
    /// returns `Ok(false)` when funds are insufficient.
    pub fn transfer(&self, from: usize, to: usize, amount: f64) -> Result<bool, BankError> {
        check_transfer(self.balances.len(), from, to, amount)?;
        let source = read(&self.balances[from]);
        if source < amount {
            return Ok(false);
        }
        write(&self.balances[from], source - amount);
        // Between debit and credit the amount is in neither account.
        thread::yield_now();
        let dest = read(&self.balances[to]);
        write(&self.balances[to], dest + amount);
        Ok(true)
    }

    /// Sum of all balances, read one by one with no lock.
    pub fn total_balance(&self) -> f64 {
        self.balances.iter().map(read).sum()
    }

    pub fn balance(&self, account: usize) -> Option<f64> {
        self.balances.get(account).map(read)
    }

    pub fn size(&self) -> usize {
        self.balances.len()
    }
}
