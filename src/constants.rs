/// Earliest year a movie can carry (first commercial films)
pub const MIN_MOVIE_YEAR: i32 = 1890;

/// How far into the future a release year may point
/// Allows announced-but-unreleased titles
pub const MAX_YEAR_FUTURE_SLACK: i32 = 5;

/// Cache key for the serialized movie snapshot
pub const MOVIES_CACHE_KEY: &str = "cached_movies";

/// Cache key for the snapshot expiry timestamp (Unix millis)
pub const CACHE_EXPIRY_KEY: &str = "cached_movies_expiry";

/// Default snapshot lifetime in minutes
pub const DEFAULT_CACHE_TTL_MINUTES: u64 = 30;

/// Session lifetime in seconds (24 hours)
pub const SESSION_TTL_SECS: i64 = 86_400;

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LEN: usize = 6;

/// Capacity of the movie change broadcast channel
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a missing movie name
pub const ERR_EMPTY_NAME: &str = "Movie name must not be empty";

/// Error message for a year outside the accepted range
pub const ERR_INVALID_YEAR: &str = "Please enter a valid year";

/// Error message for a malformed email address
pub const ERR_INVALID_EMAIL: &str = "Invalid email address";

/// Error message for a too-short password
pub const ERR_WEAK_PASSWORD: &str = "Password should be at least 6 characters";

/// Generic message when the metadata provider is unreachable
pub const ERR_DETAILS_UNAVAILABLE: &str = "Failed to load movie details";
