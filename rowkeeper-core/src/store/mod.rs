//! Persistence of the unified order
//!
//! [`KeyValueStore`] is the storage collaborator; [`OrderStore`] layers
//! load, repair, legacy migration and save on top of it.

mod kv;
mod order_store;

pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use order_store::{
    COLLAPSED_KEY, LEGACY_ORDER_KEY, LoadedOrder, MIGRATION_FLAG_KEY, ORDER_FORMAT_VERSION,
    ORDER_KEY, OrderStore, decode_order, default_order, encode_order, migrate_legacy,
    validate_and_repair,
};
