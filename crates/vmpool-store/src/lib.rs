//! `RocksDB` storage layer for vmpool.
//!
//! This crate is the authoritative record shared by the control plane and the
//! pooling engine: declared pools and their aliases, bearer tokens, and the VM
//! records the engine writes as machines move through their lifecycle.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `pools`: Pool records, keyed by canonical name
//! - `pools_by_position`: Declaration order of the pools
//! - `pool_aliases`: Alternate names resolving to one canonical pool
//! - `tokens`: Bearer token records, keyed by `token_id`
//! - `vms`: VM records, keyed by hostname
//! - `vms_by_token`: Index for listing VMs checked out with a token
//!
//! Multi-key writes run inside optimistic transactions, so concurrent writers
//! touching disjoint keys never block each other and a writer never observes a
//! half-applied change from another.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use vmpool_store::{Pool, RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/vmpool-db").unwrap();
//!
//! let pools = vec![Pool {
//!     name: "debian-12".to_string(),
//!     size: 5,
//!     template: Some("templates/debian-12".to_string()),
//! }];
//! store.declare_pools(&pools, &BTreeMap::new()).unwrap();
//!
//! assert_eq!(store.list_pools().unwrap().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

use std::collections::BTreeMap;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{Pool, PoolChange, PoolUpdate, Token, VmRecord, VmState};

use vmpool_core::TokenId;

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Pool Configuration
    // =========================================================================

    /// Seed the declared pools and aliases.
    ///
    /// Pools already present keep their stored size and template so runtime
    /// changes survive a restart. Pools missing from `pools` are removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidAlias` if an alias targets an undeclared pool.
    fn declare_pools(&self, pools: &[Pool], aliases: &BTreeMap<String, String>) -> Result<()>;

    /// List all pools in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_pools(&self) -> Result<Vec<Pool>>;

    /// Get a pool by canonical name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_pool(&self, name: &str) -> Result<Option<Pool>>;

    /// Resolve a pool name or alias to the canonical pool name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn resolve_pool_name(&self, name: &str) -> Result<Option<String>>;

    /// Apply a batch of pool updates atomically.
    ///
    /// Returns the canonical names of the pools whose stored value changed,
    /// in first-update order. Updates to the same pool apply in order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if a pool doesn't exist, or
    /// `StoreError::Conflict` if concurrent writers kept invalidating the batch.
    fn update_pools(&self, updates: &[PoolUpdate]) -> Result<Vec<String>>;

    // =========================================================================
    // Token Operations
    // =========================================================================

    /// Insert a token unless one with the same id already exists.
    ///
    /// Returns `false` without writing if the id is taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert_token(&self, token: &Token) -> Result<bool>;

    /// Get a token by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_token(&self, token_id: &TokenId) -> Result<Option<Token>>;

    /// List all tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_tokens(&self) -> Result<Vec<Token>>;

    /// Delete a token by ID.
    ///
    /// VM records referencing the token are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the token doesn't exist.
    fn delete_token(&self, token_id: &TokenId) -> Result<()>;

    // =========================================================================
    // VM Records
    // =========================================================================

    /// Insert or update a VM record, maintaining the token index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_vm(&self, vm: &VmRecord) -> Result<()>;

    /// Get a VM record by hostname.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_vm(&self, hostname: &str) -> Result<Option<VmRecord>>;

    /// Delete a VM record by hostname.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the VM doesn't exist.
    fn delete_vm(&self, hostname: &str) -> Result<()>;

    /// List all VM records referencing a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_vms_by_token(&self, token_id: &TokenId) -> Result<Vec<VmRecord>>;
}
