//! Vaultkeeper error types

use crate::vault::VaultCategory;
use thiserror::Error;

/// Vaultkeeper error type
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-correctable input problem (empty content, malformed query)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Vault has no room for another live entry
    #[error(
        "Vault \"{vault}\" has reached its maximum capacity of {capacity} entries. \
         Remove old entries or increase max_entries_per_vault."
    )]
    Capacity {
        /// Vault that is full
        vault: VaultCategory,
        /// Configured per-vault capacity
        capacity: usize,
    },

    /// Attempted removal of a ledger entry
    #[error("Cannot forget entry {0}: horizon entries are append-only and permanent")]
    ImmutableEntry(String),

    /// Attempted bulk mutation of an append-only vault
    #[error("The {0} vault is append-only: it cannot be cleared or written outside the ledger")]
    ImmutableVault(VaultCategory),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Vaultkeeper operations
pub type Result<T> = std::result::Result<T, Error>;
