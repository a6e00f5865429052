//! Utility modules.

/// TTL serialization helpers (`Duration` <-> whole seconds).
pub mod ttl;

/// Log sanitization utilities to prevent sensitive data exposure.
pub mod log_sanitizer;
