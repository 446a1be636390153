//! # synckit
//!
//! Small concurrency building blocks:
//!
//! - [`ConcurrentMap`]: a hash map behind one reader/writer lock, with atomic
//!   get-or-set and get-and-delete.
//! - [`Snowflake`]: a mutex-guarded generator of time-ordered 64-bit IDs
//!   (`timestamp << 22 | node << 12 | sequence`).
//! - [`ObjectId`]: 12-byte IDs made of a timestamp, per-process random bytes
//!   and a counter.
//!
//! All operations are synchronous and run to completion while holding the
//! instance's lock. Nothing here installs a `tracing` subscriber; events are
//! emitted for the application to collect.
//!
//! ## Example
//!
//! ```rust
//! use synckit::{ConcurrentMap, Snowflake};
//!
//! let sf = Snowflake::new(1_600_000_000_000, 1);
//! let sessions: ConcurrentMap<i64, &str> = ConcurrentMap::new();
//!
//! let id = sf.generate().unwrap();
//! let (name, loaded) = sessions.get_or_set(id, "alice");
//! assert_eq!((name, loaded), ("alice", false));
//!
//! assert_eq!(sessions.get_and_delete(&id), Some("alice"));
//! assert!(sessions.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod clock;
pub mod error;
pub mod map;
pub mod object_id;
pub mod snowflake;

pub use clock::{Clock, SystemClock};
pub use error::{Error, Result};
pub use map::{ConcurrentMap, MapConfig};
pub use object_id::ObjectId;
pub use snowflake::{Snowflake, SnowflakeConfig, SnowflakeParts};

#[cfg(test)]
mod proptests;
