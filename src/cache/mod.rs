//! Build result cache
//!
//! Re-uses the last built artifact when the source tree and toolchain
//! are unchanged.
//!
//! # Cache Decision
//!
//! | Stored record | Current record | Result |
//! |---------------|----------------|--------|
//! | absent / unreadable | any | miss |
//! | version differs | any | miss |
//! | fingerprint differs (path, mode, hash, length) | any | miss |
//! | equal | equal | hit |

pub mod record;
pub mod store;

pub use record::{CacheMetadata, CacheRecord};
pub use store::BuildCache;
