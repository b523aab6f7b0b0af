//! Ledger configuration.

use hybridledger_policy::{CooldownConfig, DifficultyTable};

/// Configuration for a [`crate::LedgerBook`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainConfig {
    /// Mining difficulty per block kind.
    pub difficulty: DifficultyTable,
    /// Mint cooldown parameters.
    pub cooldown: CooldownConfig,
    /// Store the Empty placeholder as soon as a blank position is loaded.
    pub persist_placeholders: bool,
}

impl ChainConfig {
    /// Configuration mining every kind at `level`, everything else default.
    pub fn with_uniform_difficulty(level: u32) -> Self {
        Self {
            difficulty: DifficultyTable::uniform(level),
            ..Self::default()
        }
    }
}
