//! Storage adapters for the domain ports.

pub mod expiring;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
