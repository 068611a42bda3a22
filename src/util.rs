//! Utility functions with platform-specific implementations.

use std::borrow::Cow;

/// Get current wall-clock time as milliseconds since Unix epoch.
///
/// On native platforms, uses `SystemTime::now()`.
/// On WASM, uses `js_sys::Date::now()`.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
pub fn now_millis() -> u64 {
    // js_sys::Date::now() returns milliseconds as f64
    js_sys::Date::now() as u64
}

/// Source of the cache-busting tokens appended to asset URLs.
///
/// The session takes a clock at construction so tests can pin token values
/// instead of depending on wall-clock time.
pub trait Clock {
    /// Milliseconds since Unix epoch.
    fn now_millis(&mut self) -> u64;
}

/// Wall-clock [`Clock`] used outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&mut self) -> u64 {
        now_millis()
    }
}

/// Decode fetched markup bytes to a string.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. Falls back to Windows-1252 (superset of ISO-8859-1, the usual
///    encoding of legacy static pages)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("héllo".as_bytes()), "héllo");
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // 0xE9 is é in Windows-1252 but malformed UTF-8
        let bytes = b"caf\xe9";
        assert_eq!(decode_text(bytes), "café");
    }

    #[test]
    fn test_system_clock_monotonic_enough() {
        let mut clock = SystemClock;
        let a = clock.now_millis();
        let b = clock.now_millis();
        assert!(b >= a);
    }
}
