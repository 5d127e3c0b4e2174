//! Storage module for persistent data management.
//!
//! - **InMemoryStore**: ordered, ephemeral key-value storage
//! - **TypedStore**: bincode-encoded values over any backend
//! - **StateManager**: the ledger, registries, oracle, treasury and locked
//!   vault store over a typed store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use borrow_liquidation::storage::{InMemoryStore, StateManager};
//!
//! let mut state = StateManager::new(InMemoryStore::new());
//! state.set_price(1, 10)?;
//! ```

pub mod backend;
pub mod state;

pub use backend::*;
pub use state::*;
