//! Capability interfaces the engine is written against.
//!
//! Everything outside the liquidation core (the borrow ledger, registries,
//! the oracle, custody primitives) is reached through these traits. Getters
//! return `Ok(None)` for an absent record; `Err` is reserved for store-level
//! failures.
//!
//! [`crate::storage::StateManager`] implements all of them over a key-value
//! backend.

use chrono::{DateTime, Utc};

use crate::core::borrow::*;
use crate::core::types::*;
use crate::core::vault::{LockedVault, LockedVaultHistory};
use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// BORROW LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Owner of open borrow positions and their indexes
pub trait BorrowLedger {
    /// All open borrow ids, or `None` if the index has never been written
    fn borrow_ids(&self) -> Result<Option<Vec<BorrowId>>>;

    /// Get a borrow position
    fn borrow(&self, id: BorrowId) -> Result<Option<BorrowPosition>>;

    /// Insert or replace a borrow position
    fn set_borrow(&mut self, borrow: &BorrowPosition) -> Result<()>;

    /// Delete a borrow position
    fn delete_borrow(&mut self, id: BorrowId) -> Result<bool>;

    /// Allocate a fresh borrow id
    fn next_borrow_id(&mut self) -> Result<BorrowId>;

    /// Add or remove an id in the primary open-id list
    fn update_borrow_ids(&mut self, id: BorrowId, add: bool) -> Result<()>;

    /// Add or remove an id in the owner index
    fn update_owner_borrow_ids(&mut self, owner: &str, id: BorrowId, add: bool) -> Result<()>;

    /// Add or remove an id in the owner + pool index
    fn update_owner_pool_borrow_ids(
        &mut self,
        owner: &str,
        pool_id: PoolId,
        id: BorrowId,
        add: bool,
    ) -> Result<()>;

    /// Record the borrow an owner holds on a pair
    fn set_borrow_for_owner_by_pair(&mut self, owner: &str, pair_id: PairId, id: BorrowId)
        -> Result<()>;

    /// Forget the borrow an owner holds on a pair
    fn delete_borrow_for_owner_by_pair(&mut self, owner: &str, pair_id: PairId) -> Result<()>;

    /// Apply a principal change to the pair's aggregate borrow stats
    fn update_borrow_stats(
        &mut self,
        pair: &LendPair,
        is_stable: bool,
        amount: Amount,
        add: bool,
    ) -> Result<()>;

    /// Get a lend position
    fn lend(&self, id: LendId) -> Result<Option<LendPosition>>;

    /// Insert or replace a lend position
    fn set_lend(&mut self, lend: &LendPosition) -> Result<()>;

    /// Get a lending pair
    fn lend_pair(&self, id: PairId) -> Result<Option<LendPair>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRIES AND ORACLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Asset metadata and risk parameters
pub trait AssetRegistry {
    /// Get asset metadata
    fn asset(&self, id: AssetId) -> Result<Option<Asset>>;

    /// Get the risk parameters of an asset
    fn asset_rates_stats(&self, id: AssetId) -> Result<Option<AssetRatesStats>>;
}

/// Pool metadata
pub trait PoolRegistry {
    /// Get a pool
    fn pool(&self, id: PoolId) -> Result<Option<Pool>>;
}

/// External price source
pub trait PriceOracle {
    /// Current unit price of an asset
    fn price(&self, asset_id: AssetId) -> Result<Option<u64>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// TREASURY
// ═══════════════════════════════════════════════════════════════════════════════

/// Custody primitives. Failures surface as `TransferFailed` / `BurnFailed`.
pub trait Treasury {
    /// Move a coin between two module accounts
    fn send_module_to_module(&mut self, from: &str, to: &str, coin: &Coin) -> Result<()>;

    /// Move a coin from a module account to a user account
    fn send_module_to_account(&mut self, from: &str, to: &str, coin: &Coin) -> Result<()>;

    /// Burn a coin held by a module account
    fn burn(&mut self, module: &str, coin: &Coin) -> Result<()>;

    /// Move a coin between a pool module and the reserve, tracking the
    /// asset's reserve balance (`add` credits the reserve)
    fn update_reserve_balance(
        &mut self,
        asset_id: AssetId,
        module: &str,
        coin: &Coin,
        add: bool,
    ) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOCKED VAULT STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Storage owned by the engine itself
pub trait LockedVaultStore {
    /// Get a locked vault
    fn locked_vault(&self, app_id: AppId, id: VaultId) -> Result<Option<LockedVault>>;

    /// Insert or replace a locked vault
    fn set_locked_vault(&mut self, vault: &LockedVault) -> Result<()>;

    /// Delete a locked vault
    fn delete_locked_vault(&mut self, app_id: AppId, id: VaultId) -> Result<bool>;

    /// All locked vaults in ascending `(app_id, locked_vault_id)` order
    fn locked_vaults(&self) -> Result<Vec<LockedVault>>;

    /// Highest vault id assigned so far
    fn locked_vault_id(&self) -> Result<VaultId>;

    /// Persist the highest vault id assigned
    fn set_locked_vault_id(&mut self, id: VaultId) -> Result<()>;

    /// Archive a vault, returning the history id
    fn create_locked_vault_history(
        &mut self,
        vault: &LockedVault,
        archived_at: DateTime<Utc>,
    ) -> Result<u64>;

    /// Get an archived vault
    fn locked_vault_history(&self, history_id: u64) -> Result<Option<LockedVaultHistory>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the engine needs in one bound
pub trait LiquidationContext:
    BorrowLedger + AssetRegistry + PoolRegistry + PriceOracle + Treasury + LockedVaultStore
{
}

impl<T> LiquidationContext for T where
    T: BorrowLedger + AssetRegistry + PoolRegistry + PriceOracle + Treasury + LockedVaultStore
{
}
