//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the fake provider library or credentials change, update only this file.

// ============================================================================
// OAuth
// ============================================================================

pub const CLIENT_ID: &str = "test-client-id";

pub const CLIENT_SECRET: &str = "test-client-secret";

pub const REDIRECT_URI: &str = "http://127.0.0.1:3001/api/spotify/callback";

/// The only authorization code the fake token endpoint accepts
pub const AUTH_CODE: &str = "valid-auth-code";

/// Access token handed out for `AUTH_CODE`
pub const ACCESS_TOKEN: &str = "access-token-1";

pub const REFRESH_TOKEN: &str = "refresh-token-1";

/// Access token handed out by the refresh grant
pub const REFRESHED_ACCESS_TOKEN: &str = "access-token-2";

// ============================================================================
// Fake Library
// ============================================================================

/// Number of saved tracks in the fake library, spread over two pages
pub const LIBRARY_SIZE: usize = 60;

/// Distinct primary artists (`artist_0` .. `artist_2`)
pub const LIBRARY_ARTISTS: usize = 3;

/// Every tenth track has no audio features
pub const TRACKS_WITHOUT_FEATURES: usize = 6;

// ============================================================================
// Timeouts
// ============================================================================

/// Default timeout for HTTP requests in tests
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Polling interval while waiting for the server
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
