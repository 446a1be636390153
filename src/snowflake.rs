//! Snowflake-style 64-bit unique IDs.
//!
//! # ID Structure
//!
//! ```text
//! | 1 bit: sign (0) | 41 bits: ms since epoch | 2 bits: zero | 8 bits: node | 12 bits: sequence |
//! 63               62                       22               20            12                   0
//! ```
//!
//! - **Timestamp**: milliseconds since the generator's epoch (41 bits, about
//!   69 years); past that [`Snowflake::generate`] returns
//!   [`Error::TimestampOverflow`] instead of wrapping into the sign bit
//! - **Node**: the node ID given at construction (0-255)
//! - **Sequence**: counter within each millisecond (4096 IDs/ms/node)
//!
//! IDs from one generator are strictly increasing as long as the clock does
//! not step backwards. When it does, [`Snowflake::generate`] refuses with
//! [`Error::ClockMovedBackward`] rather than emit an ID out of order.
//!
//! Distinct processes must use distinct node IDs; the generator does not
//! coordinate node assignment.

use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};

/// Default epoch: 2020-09-13T12:26:40Z (milliseconds since Unix epoch).
pub const DEFAULT_EPOCH: i64 = 1_600_000_000_000;

/// Node ID used by the process-wide generator.
pub const DEFAULT_NODE_ID: u8 = 1;

/// Number of bits used for the sequence portion.
pub const SEQUENCE_BITS: u32 = 12;

/// Number of bits used for the node portion.
pub const NODE_BITS: u32 = 8;

/// Shift of the node portion.
pub const NODE_SHIFT: u32 = SEQUENCE_BITS;

/// Shift of the timestamp portion.
pub const TIMESTAMP_SHIFT: u32 = 22;

/// Number of bits used for the timestamp portion, below the sign bit.
pub const TIMESTAMP_BITS: u32 = 41;

/// Largest millisecond offset from the epoch that keeps IDs positive.
pub const MAX_TIMESTAMP_OFFSET: i64 = (1 << TIMESTAMP_BITS) - 1;

/// Mask for extracting the sequence portion.
pub const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;

/// Mask for extracting the node portion (after shifting).
pub const NODE_MASK: i64 = (1 << NODE_BITS) - 1;

/// Configuration for a [`Snowflake`] generator.
#[derive(Debug, Clone)]
pub struct SnowflakeConfig {
    /// Reference instant subtracted from the clock, in ms since Unix epoch
    pub epoch_ms: i64,
    /// Node ID embedded in every generated ID
    pub node_id: u8,
}

impl Default for SnowflakeConfig {
    fn default() -> Self {
        Self {
            epoch_ms: DEFAULT_EPOCH,
            node_id: DEFAULT_NODE_ID,
        }
    }
}

/// State for sequence-based ID generation.
#[derive(Debug)]
struct State {
    /// Last millisecond an ID was minted at.
    last_millis: i64,
    /// Sequence counter within `last_millis`.
    sequence: u16,
}

/// A mutex-guarded Snowflake ID generator.
///
/// # Example
///
/// ```rust
/// use synckit::Snowflake;
///
/// let sf = Snowflake::new(1_600_000_000_000, 7);
/// let a = sf.generate().unwrap();
/// let b = sf.generate().unwrap();
///
/// assert!(b > a);
/// assert_eq!(sf.decompose(b).node_id, 7);
/// ```
#[derive(Debug)]
pub struct Snowflake<C = SystemClock> {
    epoch: i64,
    node_id: u8,
    state: Mutex<State>,
    clock: C,
}

impl Snowflake {
    /// Create a generator reading the system clock.
    pub fn new(epoch_ms: i64, node_id: u8) -> Self {
        Self::with_config(SnowflakeConfig { epoch_ms, node_id })
    }

    /// Create a generator reading the system clock, with the given configuration.
    pub fn with_config(config: SnowflakeConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Snowflake<C> {
    /// Create a generator reading time from `clock`.
    pub fn with_clock(config: SnowflakeConfig, clock: C) -> Self {
        tracing::trace!(
            epoch_ms = config.epoch_ms,
            node_id = config.node_id,
            "created snowflake generator"
        );
        Self {
            epoch: config.epoch_ms,
            node_id: config.node_id,
            state: Mutex::new(State {
                last_millis: 0,
                sequence: 0,
            }),
            clock,
        }
    }

    /// The epoch, in ms since the Unix epoch.
    pub fn epoch(&self) -> i64 {
        self.epoch
    }

    /// The node ID embedded in generated IDs.
    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    /// Generate a new ID.
    ///
    /// The lock is held for the whole call. If the 4096 sequence numbers of
    /// the current millisecond are used up, this spins until the clock moves
    /// to the next millisecond.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockMovedBackward`] if the clock reads earlier than the
    ///   last ID's millisecond. The generator state is not touched, so later
    ///   calls still produce increasing IDs once the clock catches up.
    /// - [`Error::ClockBeforeEpoch`] if the clock reads earlier than the epoch.
    /// - [`Error::TimestampOverflow`] if the offset from the epoch no longer
    ///   fits the 41-bit timestamp field.
    ///
    /// On error no ID is minted and the generator state is left as it was.
    pub fn generate(&self) -> Result<i64> {
        let mut state = self.state.lock();

        let now = self.clock.now_millis();
        if now < state.last_millis {
            tracing::warn!(
                last = state.last_millis,
                now,
                node_id = self.node_id,
                "clock moved backwards, refusing to generate id"
            );
            return Err(Error::ClockMovedBackward {
                last: state.last_millis,
                now,
            });
        }
        if now < self.epoch {
            return Err(Error::ClockBeforeEpoch {
                epoch: self.epoch,
                now,
            });
        }

        let (now, sequence) = if now == state.last_millis {
            match (state.sequence + 1) & SEQUENCE_MASK as u16 {
                0 => {
                    tracing::debug!(
                        millis = now,
                        node_id = self.node_id,
                        "sequence exhausted, waiting for next millisecond"
                    );
                    (self.wait_next_millis(state.last_millis), 0)
                }
                next => (now, next),
            }
        } else {
            (now, 0)
        };

        let offset = self.timestamp_offset(now)?;
        state.last_millis = now;
        state.sequence = sequence;

        Ok((offset << TIMESTAMP_SHIFT)
            | (i64::from(self.node_id) << NODE_SHIFT)
            | i64::from(sequence))
    }

    /// Milliseconds since the epoch, if they fit the timestamp field.
    fn timestamp_offset(&self, now: i64) -> Result<i64> {
        match now.checked_sub(self.epoch) {
            Some(offset) if (0..=MAX_TIMESTAMP_OFFSET).contains(&offset) => Ok(offset),
            _ => {
                tracing::warn!(
                    epoch = self.epoch,
                    now,
                    node_id = self.node_id,
                    "timestamp offset exceeds 41 bits, refusing to generate id"
                );
                Err(Error::TimestampOverflow {
                    epoch: self.epoch,
                    now,
                })
            }
        }
    }

    /// Split an ID into its fields.
    pub fn decompose(&self, id: i64) -> SnowflakeParts {
        SnowflakeParts::from_id(id)
    }

    /// Spin until the clock reads past `last`. Bounded by about a millisecond.
    fn wait_next_millis(&self, last: i64) -> i64 {
        let mut now = self.clock.now_millis();
        while now <= last {
            std::hint::spin_loop();
            now = self.clock.now_millis();
        }
        now
    }
}

/// The fields of a generated ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnowflakeParts {
    /// Milliseconds since the generator's epoch.
    pub timestamp_offset: i64,
    pub node_id: u8,
    pub sequence: u16,
}

impl SnowflakeParts {
    /// Split an ID into its fields.
    pub fn from_id(id: i64) -> Self {
        Self {
            timestamp_offset: id >> TIMESTAMP_SHIFT,
            node_id: ((id >> NODE_SHIFT) & NODE_MASK) as u8,
            sequence: (id & SEQUENCE_MASK) as u16,
        }
    }

    /// Reassemble the ID.
    pub fn to_id(self) -> i64 {
        (self.timestamp_offset << TIMESTAMP_SHIFT)
            | (i64::from(self.node_id) << NODE_SHIFT)
            | (i64::from(self.sequence) & SEQUENCE_MASK)
    }

    /// Wall-clock milliseconds the ID was minted at, given its generator's epoch.
    pub fn timestamp_millis(self, epoch_ms: i64) -> i64 {
        self.timestamp_offset + epoch_ms
    }
}

static GLOBAL: OnceLock<Snowflake> = OnceLock::new();

/// The process-wide generator, built on first use with [`DEFAULT_EPOCH`] and
/// node [`DEFAULT_NODE_ID`].
///
/// Prefer constructing a [`Snowflake`] at startup and passing it down when
/// the node ID has to be configurable.
pub fn global() -> &'static Snowflake {
    GLOBAL.get_or_init(|| Snowflake::with_config(SnowflakeConfig::default()))
}

/// Generate an ID from the [`global`] generator.
pub fn next_id() -> Result<i64> {
    global().generate()
}
