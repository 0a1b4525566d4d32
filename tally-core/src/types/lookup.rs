//! Result of a single cached fetch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a lookup was served from the store or fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheOutcome {
    /// Served from a live cache entry; nothing was fetched.
    Hit,
    /// No live entry; the resource was fetched and stored.
    Miss,
}

impl CacheOutcome {
    /// Returns the outcome as an uppercase label (`"HIT"` / `"MISS"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "HIT",
            CacheOutcome::Miss => "MISS",
        }
    }

    /// Returns true for [`CacheOutcome::Hit`].
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheOutcome::Hit)
    }
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one `get_or_fetch` call learned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    /// The cached or freshly fetched value
    pub value: String,
    /// Access counter after this call's increment
    pub access_count: u64,
    /// Hit or miss
    pub outcome: CacheOutcome,
}

impl Lookup {
    /// Creates a lookup result.
    pub fn new(value: String, access_count: u64, outcome: CacheOutcome) -> Self {
        Self {
            value,
            access_count,
            outcome,
        }
    }
}
