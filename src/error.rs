//! Error types for ID generation.

use thiserror::Error;

/// Errors produced by the ID generators.
///
/// [`ConcurrentMap`](crate::ConcurrentMap) never fails; absence is reported
/// through `Option` and `bool` results instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The wall clock reads earlier than the last millisecond an ID was
    /// minted at. No ID is produced and the generator state is left as is.
    #[error("clock moved backwards: last id at {last}ms, clock now reads {now}ms")]
    ClockMovedBackward { last: i64, now: i64 },

    /// The wall clock reads earlier than the generator's epoch, so the
    /// timestamp offset would be negative.
    #[error("clock reads {now}ms, which is before the generator epoch {epoch}ms")]
    ClockBeforeEpoch { epoch: i64, now: i64 },

    /// The offset from the epoch no longer fits the 41-bit timestamp field,
    /// so the ID would wrap into the sign bit.
    #[error("clock reads {now}ms, beyond the 41-bit range of epoch {epoch}ms")]
    TimestampOverflow { epoch: i64, now: i64 },

    /// A string could not be parsed as a 24-character hex object ID.
    #[error("invalid object id: {0:?}")]
    InvalidObjectId(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
