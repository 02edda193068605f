//! Storage adapters implementing the `LoanStore` port.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
