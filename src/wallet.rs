//! Cumulative star currency

use serde::{Deserialize, Serialize};

use crate::error::WalletError;
use crate::persistence::KeyValueStore;

/// Non-negative star balance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    balance: u64,
}

impl Wallet {
    const STORAGE_KEY: &'static str = "astro_fling_wallet";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(balance: u64) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Add earned stars; returns the new balance
    pub fn deposit(&mut self, amount: u64) -> u64 {
        self.balance = self.balance.saturating_add(amount);
        self.balance
    }

    /// Take `amount` out; the balance is untouched on failure
    pub fn spend(&mut self, amount: u64) -> Result<u64, WalletError> {
        if amount > self.balance {
            return Err(WalletError::InsufficientFunds {
                requested: amount,
                balance: self.balance,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.load_json::<Wallet>(Self::STORAGE_KEY) {
            Ok(Some(wallet)) => {
                log::info!("Loaded wallet ({} stars)", wallet.balance);
                wallet
            }
            Ok(None) => Self::new(),
            Err(e) => {
                log::warn!("Wallet unreadable ({e}), starting at zero");
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        if let Err(e) = store.save_json(Self::STORAGE_KEY, self) {
            log::warn!("Failed to save wallet: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_deposit_and_spend() {
        let mut wallet = Wallet::new();
        assert_eq!(wallet.deposit(5), 5);
        assert_eq!(wallet.deposit(3), 8);
        assert_eq!(wallet.spend(6), Ok(2));
        assert_eq!(wallet.spend(2), Ok(0));
    }

    #[test]
    fn test_overspend_leaves_balance() {
        let mut wallet = Wallet::with_balance(4);
        assert_eq!(
            wallet.spend(5),
            Err(WalletError::InsufficientFunds {
                requested: 5,
                balance: 4
            })
        );
        assert_eq!(wallet.balance(), 4);
    }

    #[test]
    fn test_store_round_trip() {
        let mut store = MemoryStore::new();
        Wallet::with_balance(21).save(&mut store);
        assert_eq!(Wallet::load(&store).balance(), 21);
        assert_eq!(Wallet::load(&MemoryStore::new()).balance(), 0);
    }
}
