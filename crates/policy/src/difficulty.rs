//! Per-kind mining difficulty.

use hybridledger_core::BlockType;

/// Leading hex zeros required when mining each block kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyTable {
    pub empty: u32,
    pub genesis: u32,
    pub minted: u32,
    pub transaction: u32,
    pub acquirement: u32,
    pub locked: u32,
    pub obfuscated: u32,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        Self {
            empty: 1,
            genesis: 2,
            minted: 4,
            transaction: 3,
            acquirement: 4,
            locked: 3,
            obfuscated: 4,
        }
    }
}

impl DifficultyTable {
    /// Every kind mined at the same difficulty (handy for tests).
    pub fn uniform(level: u32) -> Self {
        Self {
            empty: level,
            genesis: level,
            minted: level,
            transaction: level,
            acquirement: level,
            locked: level,
            obfuscated: level,
        }
    }

    /// Difficulty for `kind`.
    pub fn of(&self, kind: BlockType) -> u32 {
        match kind {
            BlockType::Empty => self.empty,
            BlockType::Genesis => self.genesis,
            BlockType::Minted => self.minted,
            BlockType::Transaction => self.transaction,
            BlockType::Acquirement => self.acquirement,
            BlockType::Locked => self.locked,
            BlockType::Obfuscated => self.obfuscated,
        }
    }

    /// Override the difficulty for `kind`.
    pub fn set(&mut self, kind: BlockType, level: u32) {
        let slot = match kind {
            BlockType::Empty => &mut self.empty,
            BlockType::Genesis => &mut self.genesis,
            BlockType::Minted => &mut self.minted,
            BlockType::Transaction => &mut self.transaction,
            BlockType::Acquirement => &mut self.acquirement,
            BlockType::Locked => &mut self.locked,
            BlockType::Obfuscated => &mut self.obfuscated,
        };
        *slot = level;
    }
}
