//! Profile storage for studygate.
//!
//! This module provides persistent storage for user entitlements,
//! supporting file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileEntitlementStore;
pub use memory::MemoryEntitlementStore;
pub use traits::EntitlementStore;
