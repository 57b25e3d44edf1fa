//! # quotesync-store
//!
//! Reference [`CompanyStore`](quotesync_core::CompanyStore) implementation
//! backed by process memory. Suitable for tests and single-process hosts;
//! a persistent backend implements the same trait.

mod memory;

pub use memory::MemoryStore;
