//! Mint cooldown arithmetic.
//!
//! The wait after a mint scales with how many blocks the account has minted
//! over its whole lifetime, divided by a tier-dependent divisor.

use hybridledger_core::Tier;

/// Default wait per lifetime mint, in milliseconds.
pub const DEFAULT_BASE_INTERVAL_MS: i64 = 500;

/// Cooldown configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownConfig {
    /// Wait per lifetime mint, in milliseconds.
    pub base_interval_ms: i64,
    /// Divisor applied to ordinary accounts; larger values model boosts.
    pub user_divisor: i64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: DEFAULT_BASE_INTERVAL_MS,
            user_divisor: 1,
        }
    }
}

/// What the cooldown needs to know about an account's minting past.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintHistory {
    /// Timestamp of the most recent block the account minted.
    pub last_timestamp: i64,
    /// Number of blocks the account has minted, ever.
    pub total_minted: u64,
}

impl MintHistory {
    /// Summarize block timestamps; `None` when there are none.
    pub fn from_timestamps<I>(timestamps: I) -> Option<Self>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut history: Option<Self> = None;
        for timestamp in timestamps {
            let entry = history.get_or_insert(Self {
                last_timestamp: timestamp,
                total_minted: 0,
            });
            entry.last_timestamp = entry.last_timestamp.max(timestamp);
            entry.total_minted += 1;
        }
        history
    }
}

impl CooldownConfig {
    pub fn new(base_interval_ms: i64, user_divisor: i64) -> Self {
        Self {
            base_interval_ms,
            user_divisor,
        }
    }

    /// Divisor for `tier`; `None` means the tier has no cooldown at all.
    pub fn divisor(&self, tier: Tier) -> Option<i64> {
        let base = self.user_divisor.max(1);
        match tier {
            Tier::Admin => None,
            Tier::Moderator => Some(base + 1),
            Tier::User | Tier::Guest => Some(base),
        }
    }

    /// Instant after which the account may mint again.
    pub fn deadline(&self, tier: Tier, history: &MintHistory) -> Option<i64> {
        let divisor = self.divisor(tier)?;
        let total = i64::try_from(history.total_minted).unwrap_or(i64::MAX);
        let wait = total.saturating_mul(self.base_interval_ms) / divisor;
        Some(history.last_timestamp.saturating_add(wait))
    }

    /// Milliseconds left before the account may mint.
    ///
    /// Zero or negative means it may mint now. Admins and accounts that have
    /// never minted always get 0.
    pub fn remaining(&self, tier: Tier, history: Option<&MintHistory>, now_ms: i64) -> i64 {
        match history.and_then(|history| self.deadline(tier, history)) {
            Some(deadline) => deadline.saturating_sub(now_ms),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(last_timestamp: i64, total_minted: u64) -> MintHistory {
        MintHistory {
            last_timestamp,
            total_minted,
        }
    }

    #[test]
    fn test_admin_has_no_cooldown() {
        let config = CooldownConfig::default();
        let h = history(10_000, 50);
        assert_eq!(config.remaining(Tier::Admin, Some(&h), 10_000), 0);
    }

    #[test]
    fn test_never_minted_is_eligible() {
        let config = CooldownConfig::default();
        assert_eq!(config.remaining(Tier::User, None, 0), 0);
    }

    #[test]
    fn test_user_wait_scales_with_lifetime_mints() {
        let config = CooldownConfig::default();
        let h = history(10_000, 4);
        // 4 * 500 / 1
        assert_eq!(config.deadline(Tier::User, &h), Some(12_000));
        assert_eq!(config.remaining(Tier::User, Some(&h), 10_500), 1_500);
        assert_eq!(config.remaining(Tier::User, Some(&h), 13_000), -1_000);
    }

    #[test]
    fn test_moderator_divisor() {
        let config = CooldownConfig::default();
        let h = history(0, 3);
        // 3 * 500 / 2 = 750
        assert_eq!(config.deadline(Tier::Moderator, &h), Some(750));
    }

    #[test]
    fn test_divisor_floors() {
        let config = CooldownConfig::new(500, 3);
        let h = history(0, 1);
        // floor(500 / 3)
        assert_eq!(config.deadline(Tier::User, &h), Some(166));
        // floor(500 / 4)
        assert_eq!(config.deadline(Tier::Moderator, &h), Some(125));
    }

    #[test]
    fn test_zero_divisor_is_treated_as_one() {
        let config = CooldownConfig::new(500, 0);
        assert_eq!(config.divisor(Tier::User), Some(1));
    }

    #[test]
    fn test_history_from_timestamps() {
        assert_eq!(MintHistory::from_timestamps(Vec::new()), None);

        let h = MintHistory::from_timestamps(vec![30, 10, 20]).unwrap();
        assert_eq!(h.last_timestamp, 30);
        assert_eq!(h.total_minted, 3);
    }
}
