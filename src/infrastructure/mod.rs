//! Infrastructure: concrete implementations of the store and gate ports.

pub mod auth;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
