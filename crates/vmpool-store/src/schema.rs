//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Pool records, keyed by canonical pool name.
    pub const POOLS: &str = "pools";

    /// Index: declaration order, keyed by big-endian `position`, value is the pool name.
    pub const POOLS_BY_POSITION: &str = "pools_by_position";

    /// Pool aliases, keyed by alias, value is the canonical pool name.
    pub const POOL_ALIASES: &str = "pool_aliases";

    /// Bearer token records, keyed by `token_id`.
    pub const TOKENS: &str = "tokens";

    /// VM records, keyed by hostname.
    pub const VMS: &str = "vms";

    /// Index: VMs by token, keyed by `len(token_id) || token_id || hostname`.
    pub const VMS_BY_TOKEN: &str = "vms_by_token";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::POOLS,
        cf::POOLS_BY_POSITION,
        cf::POOL_ALIASES,
        cf::TOKENS,
        cf::VMS,
        cf::VMS_BY_TOKEN,
    ]
}
