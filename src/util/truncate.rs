//! UTF-8 safe size caps.
//!
//! Every piece of text that comes from outside the crate (agent output, host
//! context) is capped in bytes. A cap never drops text silently: the capped
//! value always carries a marker saying it was cut.

/// Marker appended (or prepended) when text is cut.
pub const TRUNCATION_MARKER: &str = "\n...[truncated]...\n";

/// Longest prefix of `s` that is at most `max_bytes` long and ends on a char
/// boundary.
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut cutoff = max_bytes;
    while cutoff > 0 && !s.is_char_boundary(cutoff) {
        cutoff -= 1;
    }
    &s[..cutoff]
}

/// Keep at most `max_bytes` from the start of `s`, then append `marker`.
///
/// Returns the capped text and whether anything was cut.
pub fn cap_head(s: &str, max_bytes: usize, marker: &str) -> (String, bool) {
    if s.len() <= max_bytes {
        return (s.to_string(), false);
    }

    let mut out = String::with_capacity(max_bytes + marker.len());
    out.push_str(truncate_utf8(s, max_bytes));
    out.push_str(marker);
    (out, true)
}

/// Keep at most `max_bytes` from the end of `s`, prefixed with `marker`.
pub fn cap_tail(s: &str, max_bytes: usize, marker: &str) -> (String, bool) {
    if s.len() <= max_bytes {
        return (s.to_string(), false);
    }

    let mut start = s.len() - max_bytes;
    while start < s.len() && !s.is_char_boundary(start) {
        start += 1;
    }

    let mut out = String::with_capacity(s.len() - start + marker.len());
    out.push_str(marker);
    out.push_str(&s[start..]);
    (out, true)
}
