//! Primitive identifiers, coins and the per-block execution context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer token amount in base units
pub type Amount = u128;

/// Asset identifier
pub type AssetId = u64;

/// Application identifier
pub type AppId = u64;

/// Lending pair identifier
pub type PairId = u64;

/// Pool identifier
pub type PoolId = u64;

/// Borrow position identifier
pub type BorrowId = u64;

/// Lend position identifier
pub type LendId = u64;

/// Locked vault identifier
pub type VaultId = u64;

// ═══════════════════════════════════════════════════════════════════════════════
// COIN
// ═══════════════════════════════════════════════════════════════════════════════

/// An amount of a specific denomination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Coin {
    /// Denomination
    pub denom: String,
    /// Amount in base units
    pub amount: Amount,
}

impl Coin {
    /// Create a new coin
    pub fn new(denom: impl Into<String>, amount: Amount) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Zero amount of `denom`
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    /// Check if amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCK CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Logical clock of the evaluation cycle.
///
/// The engine never reads wall-clock time; every timestamp it records comes
/// from here so replicas agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block height
    pub height: u64,
    /// Block time
    pub time: DateTime<Utc>,
}

impl BlockContext {
    /// Create a block context
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }

    /// Block context whose time is `unix_secs` seconds after the epoch
    pub fn at_unix(height: u64, unix_secs: i64) -> Self {
        let time = DateTime::<Utc>::from_timestamp(unix_secs, 0).unwrap_or_default();
        Self { height, time }
    }

    /// Context for the following block, `block_secs` later
    pub fn next(&self, block_secs: i64) -> Self {
        Self {
            height: self.height + 1,
            time: self.time + chrono::Duration::seconds(block_secs),
        }
    }
}
