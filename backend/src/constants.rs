// =============================================================================
// PatternPals Backend Constants
// =============================================================================
// Tuning knobs for matching and the HTTP server, kept in one place.

// =============================================================================
// COMPATIBILITY SCORING
// =============================================================================

/// Points for an exact experience match
pub const EXPERIENCE_MAX_POINTS: i32 = 40;

/// Points lost per experience level of difference
pub const EXPERIENCE_STEP_PENALTY: i32 = 15;

/// Points per pattern both users know
pub const SHARED_PATTERN_POINTS: usize = 10;

/// Cap on the shared-pattern term
pub const SHARED_PATTERN_MAX_POINTS: usize = 30;

/// Points per teachable pattern, in either direction
pub const TEACHING_PATTERN_POINTS: usize = 5;

/// Cap on the teaching-opportunity term
pub const TEACHING_MAX_POINTS: usize = 20;

/// Points when the candidate has a location set (presence only, no distance)
pub const LOCATION_POINTS: u32 = 10;

/// Upper bound of the final score
pub const MAX_SCORE: u32 = 100;

// =============================================================================
// SERVER CONFIGURATION
// =============================================================================

/// Default port for the HTTP server
pub const DEFAULT_SERVER_PORT: u16 = 3001;

/// Default number of candidates returned by the match list
pub const DEFAULT_MATCH_LIMIT: usize = 50;

/// Default maximum database connections
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Maximum profiles returned by a single search
pub const PROFILE_SEARCH_LIMIT: i64 = 100;

/// Maximum profiles scored when building an unfiltered match list
pub const CANDIDATE_POOL_LIMIT: i64 = 500;
