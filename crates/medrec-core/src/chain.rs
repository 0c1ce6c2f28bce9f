//! Chain link verification.
//!
//! Walks a sequence of blocks ordered oldest-first and checks the linking
//! invariant: the first block points at the genesis sentinel, and every
//! later block points at the `data_hash` of the block before it. Recomputing
//! record digests requires the records themselves and lives with the caller.

use serde::{Deserialize, Serialize};

use crate::hash::ChainHash;
use crate::record::LedgerBlock;
use crate::types::RecordId;

/// Outcome of a chain verification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainReport {
    /// Every link checked out.
    Intact { blocks: usize },

    /// A block does not point at its predecessor's hash.
    BrokenLink {
        block_id: i64,
        expected: ChainHash,
        found: ChainHash,
    },

    /// A block's stored digest does not match its record's canonical bytes.
    HashMismatch { block_id: i64, record_id: RecordId },

    /// A block references a record that does not exist.
    MissingRecord { block_id: i64, record_id: RecordId },
}

impl ChainReport {
    /// Whether the verified chain is intact.
    pub fn is_intact(&self) -> bool {
        matches!(self, ChainReport::Intact { .. })
    }
}

/// Verify the linking structure of `blocks`, ordered oldest-first.
///
/// Returns the first broken link found, or `Intact` with the block count.
pub fn verify_links(blocks: &[LedgerBlock]) -> ChainReport {
    let mut expected = ChainHash::GENESIS;
    for block in blocks {
        if block.previous_hash != expected {
            return ChainReport::BrokenLink {
                block_id: block.block_id,
                expected,
                found: block.previous_hash,
            };
        }
        expected = block.data_hash;
    }
    ChainReport::Intact {
        blocks: blocks.len(),
    }
}
