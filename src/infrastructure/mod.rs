//! Adapters for the ports in [`crate::domain::ports`].

pub mod email;
pub mod in_memory;
pub mod nwc;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod trigger;
