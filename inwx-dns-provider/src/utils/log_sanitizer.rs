//! Log sanitization utilities
//!
//! Keeps account passwords and two-factor codes out of debug logs, and
//! bounds the size of logged response bodies (zone listings can be large).

use serde_json::Value;

/// Maximum number of bytes to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// Request parameter keys whose values must never be logged.
const SECRET_KEYS: &[&str] = &["pass", "password", "tan", "shared_secret"];

const REDACTED: &str = "***";

/// MSRV-compatible replacement for `str::floor_char_boundary` (stable since 1.91.0).
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        s.len()
    } else {
        let mut i = index;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        i
    }
}

/// Truncate a string for safe logging.
///
/// Strings over the limit are cut on a char boundary and suffixed with the
/// total length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
            s.len()
        )
    }
}

/// Render RPC parameters for logging with secret values masked.
pub fn redact_params(params: &Value) -> String {
    let mut masked = params.clone();
    mask_secrets(&mut masked);
    truncate_for_log(&masked.to_string())
}

fn mask_secrets(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if SECRET_KEYS.contains(&key.as_str()) {
                    *v = Value::String(REDACTED.to_string());
                } else {
                    mask_secrets(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_secrets),
        _ => {}
    }
}
