//! Error types
//!
//! Nothing in the level engine is fatal. These errors are returned to the
//! caller, which logs them and degrades locally (skips a joint, keeps the old
//! balance, starts from defaults).

use thiserror::Error;

use crate::sim::BodyId;

/// Physics world failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhysicsError {
    /// The body was removed from the world before the operation ran
    #[error("body {0:?} is no longer in the simulation")]
    StaleBody(BodyId),
}

/// Currency failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("cannot spend {requested}: balance is only {balance}")]
    InsufficientFunds { requested: u64, balance: u64 },
}

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
