//! Defaults shared by every Tally crate.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE ENTRY EXPIRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live of a cache entry, in seconds.
pub const DEFAULT_TTL_SECONDS: u64 = 10;

/// Longest accepted time-to-live, in seconds.
///
/// Redis expiries are signed 64-bit milliseconds; anything longer cannot be
/// stored there.
pub const MAX_TTL_SECONDS: u64 = i64::MAX as u64 / 1000;

// ═══════════════════════════════════════════════════════════════════════════════
// STORE KEY TEMPLATES
// ═══════════════════════════════════════════════════════════════════════════════
// Both entries for a key live in the same store namespace. These prefixes
// match the layout used by existing deployments, so a store populated by
// another client stays readable.

/// Prefix of the store key holding a cached fetch result.
pub const DEFAULT_KEY_PREFIX_RESULT: &str = "result:";

/// Prefix of the store key holding the access counter.
pub const DEFAULT_KEY_PREFIX_COUNT: &str = "count:";

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT VARIABLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Overrides [`DEFAULT_TTL_SECONDS`].
pub const ENV_TTL_SECONDS: &str = "TALLY_TTL_SECONDS";

/// Overrides [`DEFAULT_KEY_PREFIX_RESULT`].
pub const ENV_KEY_PREFIX_RESULT: &str = "TALLY_KEY_PREFIX_RESULT";

/// Overrides [`DEFAULT_KEY_PREFIX_COUNT`].
pub const ENV_KEY_PREFIX_COUNT: &str = "TALLY_KEY_PREFIX_COUNT";
