//! Utility modules for the liquidation engine.
//!
//! - Constants
//! - Checked fixed-point arithmetic

pub mod constants;
pub mod math;

pub use constants::*;
pub use math::*;
