//! Redis database keys
//!
//! This module contains the keys for accessing values in the Redis database.

/// Stream all raw analytics events are appended to
pub const EVENT_STREAM: &str = "analytics:events";
