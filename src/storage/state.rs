//! Ledger state over a key-value backend.
//!
//! [`StateManager`] is the reference implementation of every capability trait
//! in [`crate::ledger`]. The simulation harness and the test-suite run the
//! engine against it; a host chain would provide its own implementations.

use chrono::{DateTime, Utc};

use crate::core::borrow::*;
use crate::core::types::*;
use crate::core::vault::{LockedVault, LockedVaultHistory};
use crate::error::{Error, Result};
use crate::ledger::*;
use crate::storage::backend::{id_key, make_key, prefixes, StorageBackend, TypedStore};
use crate::utils::math::safe_add;

// ═══════════════════════════════════════════════════════════════════════════════
// STATE MANAGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Protocol state backed by a [`StorageBackend`]
pub struct StateManager<B: StorageBackend> {
    /// Underlying storage
    store: TypedStore<B>,
}

fn owner_key(prefix: &[u8], owner: &str, id: Option<u64>) -> Vec<u8> {
    let mut key = make_key(prefix, owner.as_bytes());
    if let Some(id) = id {
        key.push(b'/');
        key.extend_from_slice(&id.to_be_bytes());
    }
    key
}

fn balance_key(account: &str, denom: &str) -> Vec<u8> {
    make_key(prefixes::BALANCE, format!("{}/{}", account, denom).as_bytes())
}

impl<B: StorageBackend> StateManager<B> {
    /// Create a new state manager
    pub fn new(backend: B) -> Self {
        Self {
            store: TypedStore::new(backend),
        }
    }

    /// Get the typed store
    pub fn store(&self) -> &TypedStore<B> {
        &self.store
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // REGISTRY SETUP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register an asset
    pub fn set_asset(&self, asset: &Asset) -> Result<()> {
        self.store.set(&id_key(prefixes::ASSET, &[asset.id]), asset)
    }

    /// Register the risk parameters of an asset
    pub fn set_asset_rates_stats(&self, stats: &AssetRatesStats) -> Result<()> {
        self.store.set(&id_key(prefixes::RATES, &[stats.asset_id]), stats)
    }

    /// Register a pool
    pub fn set_pool(&self, pool: &Pool) -> Result<()> {
        self.store.set(&id_key(prefixes::POOL, &[pool.id]), pool)
    }

    /// Register a lending pair
    pub fn set_lend_pair(&self, pair: &LendPair) -> Result<()> {
        self.store.set(&id_key(prefixes::PAIR, &[pair.id]), pair)
    }

    /// Set the oracle price of an asset
    pub fn set_price(&self, asset_id: AssetId, price: u64) -> Result<()> {
        self.store.set(&id_key(prefixes::PRICE, &[asset_id]), &price)
    }

    /// Remove the oracle price of an asset
    pub fn remove_price(&self, asset_id: AssetId) -> Result<bool> {
        self.store.delete(&id_key(prefixes::PRICE, &[asset_id]))
    }

    /// Open a borrow: persist it, index it and count it in the pair stats
    pub fn open_borrow(&mut self, borrow: &BorrowPosition) -> Result<()> {
        let lend = self
            .lend(borrow.lending_id)?
            .ok_or_else(|| Error::missing("lend position", borrow.lending_id))?;
        let pair = self
            .lend_pair(borrow.pair_id)?
            .ok_or_else(|| Error::missing("lend pair", borrow.pair_id))?;

        let counter: BorrowId = self.store.get(prefixes::BORROW_COUNTER)?.unwrap_or(0);
        if borrow.id > counter {
            self.store.set(prefixes::BORROW_COUNTER, &borrow.id)?;
        }

        self.set_borrow(borrow)?;
        self.update_borrow_ids(borrow.id, true)?;
        self.update_owner_borrow_ids(&lend.owner, borrow.id, true)?;
        self.update_owner_pool_borrow_ids(&lend.owner, pair.asset_out_pool_id, borrow.id, true)?;
        self.set_borrow_for_owner_by_pair(&lend.owner, pair.id, borrow.id)?;
        self.update_borrow_stats(&pair, borrow.is_stable_borrow, borrow.amount_out.amount, true)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BALANCES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Mint a coin into an account
    pub fn mint(&self, account: &str, coin: &Coin) -> Result<()> {
        let balance = self.balance(account, &coin.denom)?;
        self.store
            .set(&balance_key(account, &coin.denom), &safe_add(balance, coin.amount)?)?;
        let supply = self.supply(&coin.denom)?;
        self.store.set(
            &make_key(prefixes::SUPPLY, coin.denom.as_bytes()),
            &safe_add(supply, coin.amount)?,
        )
    }

    /// Balance of an account
    pub fn balance(&self, account: &str, denom: &str) -> Result<Amount> {
        Ok(self.store.get(&balance_key(account, denom))?.unwrap_or(0))
    }

    /// Total supply of a denomination
    pub fn supply(&self, denom: &str) -> Result<Amount> {
        Ok(self
            .store
            .get(&make_key(prefixes::SUPPLY, denom.as_bytes()))?
            .unwrap_or(0))
    }

    /// Reserve balance tracked for an asset
    pub fn reserve_balance(&self, asset_id: AssetId) -> Result<Amount> {
        Ok(self
            .store
            .get(&id_key(prefixes::RESERVE, &[asset_id]))?
            .unwrap_or(0))
    }

    fn move_balance(&self, from: &str, to: &str, coin: &Coin) -> std::result::Result<(), String> {
        let from_balance = self.balance(from, &coin.denom).map_err(|e| e.to_string())?;
        let remaining = from_balance.checked_sub(coin.amount).ok_or_else(|| {
            format!("insufficient funds: {}{} < {}", from_balance, coin.denom, coin)
        })?;
        let to_balance = self.balance(to, &coin.denom).map_err(|e| e.to_string())?;
        let credited = to_balance
            .checked_add(coin.amount)
            .ok_or_else(|| "balance overflow".to_string())?;
        self.store
            .set(&balance_key(from, &coin.denom), &remaining)
            .map_err(|e| e.to_string())?;
        self.store
            .set(&balance_key(to, &coin.denom), &credited)
            .map_err(|e| e.to_string())
    }

    fn transfer_failed(from: &str, to: &str, coin: &Coin, reason: String) -> Error {
        Error::TransferFailed {
            from: from.into(),
            to: to.into(),
            denom: coin.denom.clone(),
            amount: coin.amount,
            reason,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Borrow ids held by an owner
    pub fn owner_borrow_ids(&self, owner: &str) -> Result<Vec<BorrowId>> {
        Ok(self
            .store
            .get(&owner_key(prefixes::OWNER_BORROWS, owner, None))?
            .unwrap_or_default())
    }

    /// Borrow ids held by an owner against a pool
    pub fn owner_pool_borrow_ids(&self, owner: &str, pool_id: PoolId) -> Result<Vec<BorrowId>> {
        Ok(self
            .store
            .get(&owner_key(prefixes::OWNER_POOL_BORROWS, owner, Some(pool_id)))?
            .unwrap_or_default())
    }

    /// Borrow an owner holds on a pair
    pub fn borrow_for_owner_by_pair(&self, owner: &str, pair_id: PairId) -> Result<Option<BorrowId>> {
        self.store
            .get(&owner_key(prefixes::OWNER_PAIR_BORROW, owner, Some(pair_id)))
    }

    /// Aggregate borrow stats of a pair
    pub fn borrow_stats(&self, pair_id: PairId) -> Result<PairBorrowStats> {
        Ok(self
            .store
            .get(&id_key(prefixes::BORROW_STATS, &[pair_id]))?
            .unwrap_or(PairBorrowStats {
                pair_id,
                ..Default::default()
            }))
    }

    fn update_id_list(&self, key: &[u8], id: u64, add: bool) -> Result<()> {
        let mut ids: Vec<u64> = self.store.get(key)?.unwrap_or_default();
        if add {
            if !ids.contains(&id) {
                ids.push(id);
            }
        } else {
            let before = ids.len();
            ids.retain(|existing| *existing != id);
            if ids.len() == before {
                return Err(Error::missing("index entry", id));
            }
        }
        self.store.set(key, &ids)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CAPABILITY IMPLEMENTATIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl<B: StorageBackend> BorrowLedger for StateManager<B> {
    fn borrow_ids(&self) -> Result<Option<Vec<BorrowId>>> {
        self.store.get(prefixes::BORROW_IDS)
    }

    fn borrow(&self, id: BorrowId) -> Result<Option<BorrowPosition>> {
        self.store.get(&id_key(prefixes::BORROW, &[id]))
    }

    fn set_borrow(&mut self, borrow: &BorrowPosition) -> Result<()> {
        self.store.set(&id_key(prefixes::BORROW, &[borrow.id]), borrow)
    }

    fn delete_borrow(&mut self, id: BorrowId) -> Result<bool> {
        self.store.delete(&id_key(prefixes::BORROW, &[id]))
    }

    fn next_borrow_id(&mut self) -> Result<BorrowId> {
        let current: BorrowId = self.store.get(prefixes::BORROW_COUNTER)?.unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| Error::overflow("borrow id counter"))?;
        self.store.set(prefixes::BORROW_COUNTER, &next)?;
        Ok(next)
    }

    fn update_borrow_ids(&mut self, id: BorrowId, add: bool) -> Result<()> {
        self.update_id_list(prefixes::BORROW_IDS, id, add)
    }

    fn update_owner_borrow_ids(&mut self, owner: &str, id: BorrowId, add: bool) -> Result<()> {
        self.update_id_list(&owner_key(prefixes::OWNER_BORROWS, owner, None), id, add)
    }

    fn update_owner_pool_borrow_ids(
        &mut self,
        owner: &str,
        pool_id: PoolId,
        id: BorrowId,
        add: bool,
    ) -> Result<()> {
        self.update_id_list(
            &owner_key(prefixes::OWNER_POOL_BORROWS, owner, Some(pool_id)),
            id,
            add,
        )
    }

    fn set_borrow_for_owner_by_pair(
        &mut self,
        owner: &str,
        pair_id: PairId,
        id: BorrowId,
    ) -> Result<()> {
        self.store
            .set(&owner_key(prefixes::OWNER_PAIR_BORROW, owner, Some(pair_id)), &id)
    }

    fn delete_borrow_for_owner_by_pair(&mut self, owner: &str, pair_id: PairId) -> Result<()> {
        self.store
            .delete(&owner_key(prefixes::OWNER_PAIR_BORROW, owner, Some(pair_id)))?;
        Ok(())
    }

    fn update_borrow_stats(
        &mut self,
        pair: &LendPair,
        is_stable: bool,
        amount: Amount,
        add: bool,
    ) -> Result<()> {
        let mut stats = self.borrow_stats(pair.id)?;
        stats.apply(is_stable, amount, add)?;
        self.store.set(&id_key(prefixes::BORROW_STATS, &[pair.id]), &stats)
    }

    fn lend(&self, id: LendId) -> Result<Option<LendPosition>> {
        self.store.get(&id_key(prefixes::LEND, &[id]))
    }

    fn set_lend(&mut self, lend: &LendPosition) -> Result<()> {
        self.store.set(&id_key(prefixes::LEND, &[lend.id]), lend)
    }

    fn lend_pair(&self, id: PairId) -> Result<Option<LendPair>> {
        self.store.get(&id_key(prefixes::PAIR, &[id]))
    }
}

impl<B: StorageBackend> AssetRegistry for StateManager<B> {
    fn asset(&self, id: AssetId) -> Result<Option<Asset>> {
        self.store.get(&id_key(prefixes::ASSET, &[id]))
    }

    fn asset_rates_stats(&self, id: AssetId) -> Result<Option<AssetRatesStats>> {
        self.store.get(&id_key(prefixes::RATES, &[id]))
    }
}

impl<B: StorageBackend> PoolRegistry for StateManager<B> {
    fn pool(&self, id: PoolId) -> Result<Option<Pool>> {
        self.store.get(&id_key(prefixes::POOL, &[id]))
    }
}

impl<B: StorageBackend> PriceOracle for StateManager<B> {
    fn price(&self, asset_id: AssetId) -> Result<Option<u64>> {
        self.store.get(&id_key(prefixes::PRICE, &[asset_id]))
    }
}

impl<B: StorageBackend> Treasury for StateManager<B> {
    fn send_module_to_module(&mut self, from: &str, to: &str, coin: &Coin) -> Result<()> {
        self.move_balance(from, to, coin)
            .map_err(|reason| Self::transfer_failed(from, to, coin, reason))
    }

    fn send_module_to_account(&mut self, from: &str, to: &str, coin: &Coin) -> Result<()> {
        self.move_balance(from, to, coin)
            .map_err(|reason| Self::transfer_failed(from, to, coin, reason))
    }

    fn burn(&mut self, module: &str, coin: &Coin) -> Result<()> {
        let burn_failed = |reason: String| Error::BurnFailed {
            module: module.into(),
            denom: coin.denom.clone(),
            amount: coin.amount,
            reason,
        };
        let balance = self.balance(module, &coin.denom)?;
        let remaining = balance
            .checked_sub(coin.amount)
            .ok_or_else(|| burn_failed(format!("insufficient funds: {}", balance)))?;
        let supply = self.supply(&coin.denom)?;
        let new_supply = supply
            .checked_sub(coin.amount)
            .ok_or_else(|| burn_failed(format!("supply {} too small", supply)))?;
        self.store.set(&balance_key(module, &coin.denom), &remaining)?;
        self.store
            .set(&make_key(prefixes::SUPPLY, coin.denom.as_bytes()), &new_supply)
    }

    fn update_reserve_balance(
        &mut self,
        asset_id: AssetId,
        module: &str,
        coin: &Coin,
        add: bool,
    ) -> Result<()> {
        let reserve_module = crate::utils::constants::RESERVE_MODULE;
        let (from, to) = if add {
            (module, reserve_module)
        } else {
            (reserve_module, module)
        };
        let reserve = self.reserve_balance(asset_id)?;
        let updated = if add {
            reserve.checked_add(coin.amount)
        } else {
            reserve.checked_sub(coin.amount)
        }
        .ok_or_else(|| {
            Self::transfer_failed(from, to, coin, format!("reserve balance {} out of range", reserve))
        })?;
        self.move_balance(from, to, coin)
            .map_err(|reason| Self::transfer_failed(from, to, coin, reason))?;
        self.store.set(&id_key(prefixes::RESERVE, &[asset_id]), &updated)
    }
}

impl<B: StorageBackend> LockedVaultStore for StateManager<B> {
    fn locked_vault(&self, app_id: AppId, id: VaultId) -> Result<Option<LockedVault>> {
        self.store.get(&id_key(prefixes::LOCKED_VAULT, &[app_id, id]))
    }

    fn set_locked_vault(&mut self, vault: &LockedVault) -> Result<()> {
        self.store.set(
            &id_key(prefixes::LOCKED_VAULT, &[vault.app_id, vault.locked_vault_id]),
            vault,
        )
    }

    fn delete_locked_vault(&mut self, app_id: AppId, id: VaultId) -> Result<bool> {
        self.store
            .delete(&id_key(prefixes::LOCKED_VAULT, &[app_id, id]))
    }

    fn locked_vaults(&self) -> Result<Vec<LockedVault>> {
        self.store.values_with_prefix(prefixes::LOCKED_VAULT)
    }

    fn locked_vault_id(&self) -> Result<VaultId> {
        Ok(self.store.get(prefixes::LOCKED_VAULT_COUNTER)?.unwrap_or(0))
    }

    fn set_locked_vault_id(&mut self, id: VaultId) -> Result<()> {
        self.store.set(prefixes::LOCKED_VAULT_COUNTER, &id)
    }

    fn create_locked_vault_history(
        &mut self,
        vault: &LockedVault,
        archived_at: DateTime<Utc>,
    ) -> Result<u64> {
        let current: u64 = self
            .store
            .get(prefixes::LOCKED_VAULT_HISTORY_COUNTER)?
            .unwrap_or(0);
        let history_id = current
            .checked_add(1)
            .ok_or_else(|| Error::overflow("history id counter"))?;
        let entry = LockedVaultHistory {
            history_id,
            locked_vault: vault.clone(),
            archived_at,
        };
        self.store
            .set(&id_key(prefixes::LOCKED_VAULT_HISTORY, &[history_id]), &entry)?;
        self.store
            .set(prefixes::LOCKED_VAULT_HISTORY_COUNTER, &history_id)?;
        Ok(history_id)
    }

    fn locked_vault_history(&self, history_id: u64) -> Result<Option<LockedVaultHistory>> {
        self.store
            .get(&id_key(prefixes::LOCKED_VAULT_HISTORY, &[history_id]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::InMemoryStore;

    fn state() -> StateManager<InMemoryStore> {
        StateManager::new(InMemoryStore::new())
    }

    #[test]
    fn test_transfers_and_burn() {
        let mut state = state();
        state.mint("pool1", &Coin::new("uatom", 1_000)).unwrap();

        state
            .send_module_to_module("pool1", "auction", &Coin::new("uatom", 300))
            .unwrap();
        assert_eq!(state.balance("pool1", "uatom").unwrap(), 700);
        assert_eq!(state.balance("auction", "uatom").unwrap(), 300);

        let err = state
            .send_module_to_account("pool1", "user", &Coin::new("uatom", 701))
            .unwrap_err();
        assert!(matches!(err, Error::TransferFailed { .. }));
        assert_eq!(state.balance("pool1", "uatom").unwrap(), 700);

        state.burn("pool1", &Coin::new("uatom", 200)).unwrap();
        assert_eq!(state.supply("uatom").unwrap(), 800);
        assert!(matches!(
            state.burn("pool1", &Coin::new("uatom", 10_000)),
            Err(Error::BurnFailed { .. })
        ));
    }

    #[test]
    fn test_reserve_balance() {
        let mut state = state();
        state.mint("pool1", &Coin::new("uatom", 100)).unwrap();
        state
            .update_reserve_balance(1, "pool1", &Coin::new("uatom", 40), true)
            .unwrap();
        assert_eq!(state.reserve_balance(1).unwrap(), 40);
        assert_eq!(state.balance("reserve", "uatom").unwrap(), 40);
        assert_eq!(state.balance("pool1", "uatom").unwrap(), 60);
    }

    #[test]
    fn test_id_index_removal_of_missing_entry_fails() {
        let mut state = state();
        state.update_borrow_ids(5, true).unwrap();
        state.update_borrow_ids(5, true).unwrap();
        assert_eq!(state.borrow_ids().unwrap(), Some(vec![5]));
        state.update_borrow_ids(5, false).unwrap();
        assert!(state.update_borrow_ids(5, false).is_err());
    }

    #[test]
    fn test_counters() {
        let mut state = state();
        assert_eq!(state.locked_vault_id().unwrap(), 0);
        state.set_locked_vault_id(4).unwrap();
        assert_eq!(state.locked_vault_id().unwrap(), 4);
        assert_eq!(state.next_borrow_id().unwrap(), 1);
        assert_eq!(state.next_borrow_id().unwrap(), 2);
    }
}
