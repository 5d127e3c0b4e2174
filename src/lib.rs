//! # Borrow Liquidation
//!
//! Liquidation engine of a collateralized lending protocol running inside a
//! replicated, deterministic state machine.
//!
//! ## Architecture
//!
//! - **Core**: positions, locked vaults, auctions, configuration
//! - **Ledger**: capability traits for everything the engine does not own
//! - **Liquidation**: ratio, sweep, lock, sell-off sizing, restoration
//! - **Storage**: key-value backends and the reference ledger state
//! - **Simulation**: scenario-driven block replay
//!
//! ## Determinism
//!
//! - All arithmetic is checked fixed-point (`rust_decimal`)
//! - Positions and vaults are visited in ascending id order
//! - Time comes from the block, never the wall clock
//!
//! ## Example
//!
//! ```rust,ignore
//! use borrow_liquidation::prelude::*;
//!
//! let mut state = StateManager::new(InMemoryStore::new());
//! let mut engine = LiquidationEngine::new(LiquidationConfig::default())?;
//! let report = engine.begin_block(&mut state, &BlockContext::at_unix(1, 0))?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod core;
pub mod error;
pub mod ledger;
pub mod liquidation;
pub mod simulation;
pub mod storage;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        auction::DutchAuction,
        borrow::{Asset, AssetRatesStats, BorrowPosition, LendPair, LendPosition, Pool},
        config::LiquidationConfig,
        types::{Amount, BlockContext, Coin},
        vault::{LockedVault, LockedVaultKind},
    };
    pub use crate::error::{Error, Result};
    pub use crate::ledger::LiquidationContext;
    pub use crate::liquidation::{
        engine::LiquidationEngine,
        restore::{RestorationBranch, RestorationOutcome},
        sweep::SweepReport,
    };
    pub use crate::storage::{InMemoryStore, StateManager};
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
