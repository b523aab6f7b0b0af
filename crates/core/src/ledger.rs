//! In-memory ledger snapshots.
//!
//! A [`Ledger`] is the ordered block sequence of one position. It holds no
//! store handle; loading and persisting live in the chain crate.

use crate::account::Ownership;
use crate::block::{current_timestamp, Block, BlockType};
use crate::position::Position;

/// Ordered, index-ascending blocks of one position. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    position: Position,
    blocks: Vec<Block>,
}

impl Ledger {
    /// Build a ledger from stored blocks, sorting them by index.
    ///
    /// Returns `None` when `blocks` is empty.
    pub fn from_blocks(position: Position, mut blocks: Vec<Block>) -> Option<Self> {
        if blocks.is_empty() {
            return None;
        }
        blocks.sort_by_key(|block| block.index);
        Some(Self { position, blocks })
    }

    /// A ledger holding only a placeholder block.
    pub fn unclaimed(placeholder: Block) -> Self {
        Self {
            position: placeholder.position.clone(),
            blocks: vec![placeholder],
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn realm(&self) -> &str {
        self.position.realm()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Mutable access for maintenance code that re-mines blocks in place.
    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Number of blocks; at least 1.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn last_block(&self) -> &Block {
        // from_blocks and unclaimed both guarantee one block, append never removes
        &self.blocks[self.blocks.len() - 1]
    }

    /// Owner of the last block.
    pub fn ownership(&self) -> &Ownership {
        &self.last_block().ownership
    }

    /// True for a position that only holds its unowned Empty placeholder.
    pub fn is_unclaimed(&self) -> bool {
        self.blocks.len() == 1 && self.last_block().is_empty_placeholder()
    }

    /// Whether every block's digest equals its successor's `previous_hash`.
    ///
    /// The digest is recomputed from the fields, so an edit that skipped
    /// re-mining is caught even if the cached hash was left alone.
    pub fn check_pristine(&self) -> bool {
        if self.blocks.len() < 2 {
            return true;
        }
        self.blocks
            .windows(2)
            .rev()
            .all(|pair| Some(pair[0].compute_hash()) == pair[1].previous_hash)
    }

    /// Ledger value at `now_ms`.
    ///
    /// Sums each block's contribution by kind. A ledger that fails
    /// [`Ledger::check_pristine`] is worth exactly 0.
    pub fn value_at(&self, now_ms: i64) -> f64 {
        if !self.check_pristine() {
            return 0.0;
        }
        self.blocks
            .iter()
            .map(|block| contribution(block, now_ms))
            .sum()
    }

    /// Ledger value right now.
    pub fn value(&self) -> f64 {
        self.value_at(current_timestamp())
    }

    /// Apply a committed block to the in-memory sequence.
    ///
    /// A Genesis block replaces the whole sequence; anything else is appended.
    pub fn append(&mut self, block: Block) {
        match block.block_type {
            BlockType::Genesis => self.blocks = vec![block],
            _ => self.blocks.push(block),
        }
    }
}

fn contribution(block: &Block, now_ms: i64) -> f64 {
    match block.block_type {
        BlockType::Empty => 0.0,
        BlockType::Genesis
        | BlockType::Minted
        | BlockType::Locked
        | BlockType::Obfuscated
        | BlockType::Acquirement => block.value_at(now_ms),
        // non-numeric history spends nothing
        BlockType::Transaction => block.value_at(now_ms) - block.spend().unwrap_or(0.0),
    }
}
