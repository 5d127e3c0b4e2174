//! Core types for the liquidation engine.
//!
//! - Identifiers, coins and the block context
//! - Lending-side records (borrows, lends, pairs, pools, risk parameters)
//! - Locked vaults and their history
//! - Finished auction records
//! - Engine configuration

pub mod auction;
pub mod borrow;
pub mod config;
pub mod types;
pub mod vault;

pub use auction::*;
pub use borrow::*;
pub use config::*;
pub use types::*;
pub use vault::*;
