//! Engine constants.
//!
//! Defaults for the liquidation configuration and the module account names
//! the engine moves balances between.

// ═══════════════════════════════════════════════════════════════════════════════
// MODULE ACCOUNTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Name recorded as the initiator of every vault this engine locks
pub const LIQUIDATION_MODULE: &str = "liquidation";

/// Module account receiving the bidder bonus ahead of an auction
pub const AUCTION_MODULE: &str = "auction";

/// Module account holding protocol reserves
pub const RESERVE_MODULE: &str = "reserve";

// ═══════════════════════════════════════════════════════════════════════════════
// SELL-OFF SIZING
// ═══════════════════════════════════════════════════════════════════════════════

/// Smallest sell-off denominator still treated as well-conditioned, in
/// millionths (1 = 0.000001)
pub const MIN_SELL_OFF_DENOMINATOR_MICROS: i64 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// BOOKKEEPING
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum liquidation events retained by the engine
pub const MAX_EVENT_HISTORY: usize = 1000;
