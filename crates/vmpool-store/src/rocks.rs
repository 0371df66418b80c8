//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, Direction, ErrorKind, IteratorMode, MultiThreaded,
    OptimisticTransactionDB, Options, Transaction,
};
use vmpool_core::TokenId;

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{Pool, PoolUpdate, Token, VmRecord};
use crate::Store;

/// How many times a conflicting transaction is replayed before giving up.
pub const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

type Db = OptimisticTransactionDB<MultiThreaded>;

fn db_err(err: rocksdb::Error) -> StoreError {
    StoreError::Database(err.to_string())
}

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<Db>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = Db::open_cf_descriptors(&opts, path, cf_descriptors).map_err(db_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode_name(data: &[u8]) -> Result<String> {
        String::from_utf8(data.to_vec()).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Run `body` inside an optimistic transaction, replaying it on conflict.
    ///
    /// Dropping the transaction after an error in `body` rolls it back.
    fn transact<T>(
        &self,
        operation: &'static str,
        mut body: impl FnMut(&Transaction<'_, Db>) -> Result<T>,
    ) -> Result<T> {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            let txn = self.db.transaction();
            let value = body(&txn)?;

            match txn.commit() {
                Ok(()) => return Ok(value),
                Err(e) if matches!(e.kind(), ErrorKind::Busy | ErrorKind::TryAgain) => {
                    tracing::debug!(operation, attempt, "Transaction conflict, retrying");
                }
                Err(e) => return Err(db_err(e)),
            }
        }

        tracing::warn!(operation, "Transaction retries exhausted");
        Err(StoreError::Conflict)
    }

    /// Collect every key in a column family.
    fn scan_keys(&self, name: &str) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(name)?;
        let mut keys = Vec::new();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, _) = item.map_err(db_err)?;
            keys.push(key.to_vec());
        }

        Ok(keys)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Pool Configuration
    // =========================================================================

    fn declare_pools(&self, pools: &[Pool], aliases: &BTreeMap<String, String>) -> Result<()> {
        for (alias, target) in aliases {
            if !pools.iter().any(|pool| &pool.name == target) {
                return Err(StoreError::InvalidAlias {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }

        let existing_pools = self.scan_keys(cf::POOLS)?;
        let existing_positions = self.scan_keys(cf::POOLS_BY_POSITION)?;
        let existing_aliases = self.scan_keys(cf::POOL_ALIASES)?;
        let declared: HashSet<Vec<u8>> = pools.iter().map(|p| keys::pool_key(&p.name)).collect();

        self.transact("declare_pools", |txn| {
            let cf_pools = self.cf(cf::POOLS)?;
            let cf_positions = self.cf(cf::POOLS_BY_POSITION)?;
            let cf_aliases = self.cf(cf::POOL_ALIASES)?;

            for key in &existing_positions {
                txn.delete_cf(&cf_positions, key).map_err(db_err)?;
            }
            for key in &existing_aliases {
                txn.delete_cf(&cf_aliases, key).map_err(db_err)?;
            }
            for key in existing_pools.iter().filter(|key| !declared.contains(*key)) {
                txn.delete_cf(&cf_pools, key).map_err(db_err)?;
            }

            for (position, pool) in pools.iter().enumerate() {
                let key = keys::pool_key(&pool.name);

                // Keep runtime changes made before a restart
                if txn
                    .get_for_update_cf(&cf_pools, &key, true)
                    .map_err(db_err)?
                    .is_none()
                {
                    txn.put_cf(&cf_pools, &key, Self::serialize(pool)?)
                        .map_err(db_err)?;
                }

                let position = u32::try_from(position)
                    .map_err(|_| StoreError::Database("too many pools".to_string()))?;
                txn.put_cf(
                    &cf_positions,
                    keys::position_key(position),
                    pool.name.as_bytes(),
                )
                .map_err(db_err)?;
            }

            for (alias, target) in aliases {
                txn.put_cf(&cf_aliases, keys::alias_key(alias), target.as_bytes())
                    .map_err(db_err)?;
            }

            Ok(())
        })?;

        tracing::debug!(
            pools = pools.len(),
            aliases = aliases.len(),
            "Declared pool configuration"
        );
        Ok(())
    }

    fn list_pools(&self) -> Result<Vec<Pool>> {
        let cf_positions = self.cf(cf::POOLS_BY_POSITION)?;

        let mut pools = Vec::new();
        for item in self.db.iterator_cf(&cf_positions, IteratorMode::Start) {
            let (_, name) = item.map_err(db_err)?;
            let name = Self::decode_name(&name)?;

            if let Some(pool) = self.get_pool(&name)? {
                pools.push(pool);
            }
        }

        Ok(pools)
    }

    fn get_pool(&self, name: &str) -> Result<Option<Pool>> {
        let cf = self.cf(cf::POOLS)?;

        self.db
            .get_cf(&cf, keys::pool_key(name))
            .map_err(db_err)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn resolve_pool_name(&self, name: &str) -> Result<Option<String>> {
        let cf_pools = self.cf(cf::POOLS)?;
        if self
            .db
            .get_cf(&cf_pools, keys::pool_key(name))
            .map_err(db_err)?
            .is_some()
        {
            return Ok(Some(name.to_string()));
        }

        let cf_aliases = self.cf(cf::POOL_ALIASES)?;
        let Some(target) = self
            .db
            .get_cf(&cf_aliases, keys::alias_key(name))
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        let target = Self::decode_name(&target)?;

        // An alias only resolves while its pool is still declared
        let exists = self
            .db
            .get_cf(&cf_pools, keys::pool_key(&target))
            .map_err(db_err)?
            .is_some();
        Ok(exists.then_some(target))
    }

    fn update_pools(&self, updates: &[PoolUpdate]) -> Result<Vec<String>> {
        self.transact("update_pools", |txn| {
            let cf_pools = self.cf(cf::POOLS)?;

            // (value before this call, value after this call), in first-touch order
            let mut touched: Vec<(Pool, Pool)> = Vec::new();

            for update in updates {
                let index = if let Some(index) = touched
                    .iter()
                    .position(|(original, _)| original.name == update.pool)
                {
                    index
                } else {
                    let data = txn
                        .get_for_update_cf(&cf_pools, keys::pool_key(&update.pool), true)
                        .map_err(db_err)?
                        .ok_or(StoreError::NotFound)?;
                    let pool: Pool = Self::deserialize(&data)?;
                    touched.push((pool.clone(), pool));
                    touched.len() - 1
                };

                touched[index].1.apply(&update.change);
            }

            let mut changed = Vec::new();
            for (original, updated) in &touched {
                txn.put_cf(
                    &cf_pools,
                    keys::pool_key(&updated.name),
                    Self::serialize(updated)?,
                )
                .map_err(db_err)?;

                if original != updated {
                    changed.push(updated.name.clone());
                }
            }

            Ok(changed)
        })
    }

    // =========================================================================
    // Token Operations
    // =========================================================================

    fn insert_token(&self, token: &Token) -> Result<bool> {
        let value = Self::serialize(token)?;

        self.transact("insert_token", |txn| {
            let cf = self.cf(cf::TOKENS)?;
            let key = keys::token_key(&token.id);

            if txn
                .get_for_update_cf(&cf, &key, true)
                .map_err(db_err)?
                .is_some()
            {
                return Ok(false);
            }

            txn.put_cf(&cf, &key, &value).map_err(db_err)?;
            Ok(true)
        })
    }

    fn get_token(&self, token_id: &TokenId) -> Result<Option<Token>> {
        let cf = self.cf(cf::TOKENS)?;

        self.db
            .get_cf(&cf, keys::token_key(token_id))
            .map_err(db_err)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn list_tokens(&self) -> Result<Vec<Token>> {
        let cf = self.cf(cf::TOKENS)?;

        let mut tokens = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(db_err)?;
            tokens.push(Self::deserialize(&value)?);
        }

        Ok(tokens)
    }

    fn delete_token(&self, token_id: &TokenId) -> Result<()> {
        self.transact("delete_token", |txn| {
            let cf = self.cf(cf::TOKENS)?;
            let key = keys::token_key(token_id);

            txn.get_for_update_cf(&cf, &key, true)
                .map_err(db_err)?
                .ok_or(StoreError::NotFound)?;
            txn.delete_cf(&cf, &key).map_err(db_err)
        })
    }

    // =========================================================================
    // VM Records
    // =========================================================================

    fn put_vm(&self, vm: &VmRecord) -> Result<()> {
        let value = Self::serialize(vm)?;

        self.transact("put_vm", |txn| {
            let cf_vms = self.cf(cf::VMS)?;
            let cf_by_token = self.cf(cf::VMS_BY_TOKEN)?;
            let vm_key = keys::vm_key(&vm.hostname);

            let old_token = txn
                .get_for_update_cf(&cf_vms, &vm_key, true)
                .map_err(db_err)?
                .map(|data| Self::deserialize::<VmRecord>(&data))
                .transpose()?
                .and_then(|old| old.token_id);

            if let Some(old) = old_token.filter(|old| Some(old) != vm.token_id.as_ref()) {
                txn.delete_cf(&cf_by_token, keys::token_vm_key(&old, &vm.hostname))
                    .map_err(db_err)?;
            }

            txn.put_cf(&cf_vms, &vm_key, &value).map_err(db_err)?;
            if let Some(token_id) = &vm.token_id {
                txn.put_cf(&cf_by_token, keys::token_vm_key(token_id, &vm.hostname), b"")
                    .map_err(db_err)?;
            }

            Ok(())
        })
    }

    fn get_vm(&self, hostname: &str) -> Result<Option<VmRecord>> {
        let cf = self.cf(cf::VMS)?;

        self.db
            .get_cf(&cf, keys::vm_key(hostname))
            .map_err(db_err)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_vm(&self, hostname: &str) -> Result<()> {
        self.transact("delete_vm", |txn| {
            let cf_vms = self.cf(cf::VMS)?;
            let cf_by_token = self.cf(cf::VMS_BY_TOKEN)?;
            let vm_key = keys::vm_key(hostname);

            let data = txn
                .get_for_update_cf(&cf_vms, &vm_key, true)
                .map_err(db_err)?
                .ok_or(StoreError::NotFound)?;
            let vm: VmRecord = Self::deserialize(&data)?;

            txn.delete_cf(&cf_vms, &vm_key).map_err(db_err)?;
            if let Some(token_id) = &vm.token_id {
                txn.delete_cf(&cf_by_token, keys::token_vm_key(token_id, hostname))
                    .map_err(db_err)?;
            }

            Ok(())
        })
    }

    fn list_vms_by_token(&self, token_id: &TokenId) -> Result<Vec<VmRecord>> {
        let cf_by_token = self.cf(cf::VMS_BY_TOKEN)?;
        let prefix = keys::token_prefix(token_id);

        let mut vms = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf_by_token, IteratorMode::From(&prefix, Direction::Forward));

        for item in iter {
            let (key, _) = item.map_err(db_err)?;

            // Stop if we're past the prefix
            if !key.starts_with(&prefix) {
                break;
            }

            let Some(hostname) = keys::extract_hostname_from_token_vm_key(&key, &prefix) else {
                continue;
            };

            if let Some(vm) = self.get_vm(&hostname)? {
                if vm.token_id.as_ref() == Some(token_id) {
                    vms.push(vm);
                }
            }
        }

        Ok(vms)
    }
}
