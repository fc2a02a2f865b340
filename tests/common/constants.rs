//! Shared constants for end-to-end tests

// ============================================================================
// Titles
// ============================================================================

/// A title the stub model answers with three beats
pub const STORY_TITLE: &str = "Inception";

/// Conventional title used together with an empty catalog
pub const EMPTY_RESULT_TITLE: &str = "Empty Result Movie";

/// The stub model fails for any title containing this marker
pub const FAILING_LLM_MARKER: &str = "Unreachable Model";

/// Number of beats the stub model returns for regular titles
pub const STUB_BEAT_COUNT: usize = 3;

/// Number of beats used when the model fails
pub const DEFAULT_BEAT_COUNT: usize = 4;

// ============================================================================
// Stub catalog
// ============================================================================

/// Tracks returned for every query, on top of the query-specific ones
pub const SHARED_TRACK_IDS: [&str; 2] = ["shared-1", "shared-2"];

/// Query-specific tracks returned per query
pub const TRACKS_PER_QUERY: usize = 4;

/// BPM reported by the stub enricher
pub const STUB_BPM: f64 = 128.0;

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
