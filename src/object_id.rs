//! 12-byte object identifiers.
//!
//! Layout:
//!
//! ```text
//! | 4 bytes: unix seconds (BE) | 5 bytes: process random | 3 bytes: counter (BE) |
//! ```
//!
//! The random bytes and the counter's starting value are drawn once per
//! process. IDs minted within the same second by one process differ in the
//! counter, which wraps after 2^24 values.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::error::{Error, Result};

struct ProcessSeed {
    host: [u8; 5],
    counter: AtomicU32,
}

static SEED: OnceLock<ProcessSeed> = OnceLock::new();

fn seed() -> &'static ProcessSeed {
    SEED.get_or_init(|| {
        let mut rng = rand::thread_rng();
        ProcessSeed {
            host: rng.gen(),
            counter: AtomicU32::new(rng.gen()),
        }
    })
}

/// A 12-byte unique identifier, displayed as 24 lowercase hex characters.
///
/// ```rust
/// use synckit::ObjectId;
///
/// let id = ObjectId::new();
/// let text = id.to_string();
/// assert_eq!(text.len(), 24);
/// assert_eq!(text.parse::<ObjectId>().unwrap(), id);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generate a new ID stamped with the current time.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        Self::with_seconds(secs)
    }

    fn with_seconds(secs: u32) -> Self {
        let seed = seed();
        let c = seed.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);

        let mut b = [0u8; 12];
        b[0..4].copy_from_slice(&secs.to_be_bytes());
        b[4..9].copy_from_slice(&seed.host);
        b[9..12].copy_from_slice(&c.to_be_bytes()[1..]);
        Self(b)
    }

    /// Wrap raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// The creation time, to whole-second precision.
    pub fn timestamp(&self) -> SystemTime {
        let secs = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        UNIX_EPOCH + Duration::from_secs(u64::from(secs))
    }

    /// The 24-bit counter portion.
    pub fn counter(&self) -> u32 {
        u32::from_be_bytes([0, self.0[9], self.0[10], self.0[11]])
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({self})")
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidObjectId(s.to_string());
        if s.len() != 24 || !s.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut b = [0u8; 12];
        for (i, out) in b.iter_mut().enumerate() {
            *out = u8::from_str_radix(&s[2 * i..2 * i + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(b))
    }
}
