//! Liquidation engine for borrow positions.
//!
//! Each block the sweep health-checks every open borrow, locks the ones above
//! their threshold and hands every locked vault to the sell-off sizer. When an
//! auction completes, restoration closes the vault, keeps it locked, or turns
//! it back into a borrow:
//!
//! - [`ratio`]: collateralization calculator
//! - [`threshold`]: bridge-aware threshold and collateral factor
//! - [`sweep`]: per-block health checks
//! - [`lock`]: borrow → locked vault transition
//! - [`selloff`]: sell-off sizing and penalty settlement
//! - [`restore`]: post-auction restoration
//! - [`engine`]: orchestration, statistics and events

pub mod engine;
pub mod events;
pub mod lock;
pub mod ratio;
pub mod restore;
pub mod selloff;
pub mod sweep;
pub mod threshold;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::*;
pub use events::*;
pub use lock::*;
pub use ratio::*;
pub use restore::*;
pub use selloff::*;
pub use sweep::*;
pub use threshold::*;
