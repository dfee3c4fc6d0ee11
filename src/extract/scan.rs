//! A deliberately narrow, textual reader for the JSON the agents emit.
//!
//! This is not a JSON parser. It supports exactly four operations:
//!
//! - [`strip_to_object`]: slice from the first `{` to the last `}` (no
//!   nesting awareness).
//! - [`find_field_value`]: locate `"<field>"` followed by optional whitespace
//!   and `:` with a plain substring search. The first textual match wins, so
//!   an earlier occurrence of the same literal inside a string value is taken
//!   as the field. This is inherited behavior and is kept as-is.
//! - [`read_string_literal`]: read one string literal with escape handling
//!   for `\" \\ \/ \b \f \n \r \t` and `\uXXXX`. Only codes up to `\u00FF`
//!   decode (to the Latin-1 character); anything higher, or malformed hex,
//!   becomes `?`. Surrogate pairs are not combined.
//! - [`match_closing`]: string-aware bracket matching, used to find array and
//!   object spans.
//!
//! All positions are byte offsets into the input.

/// Substituted for `\u` escapes outside Latin-1 and for malformed escapes.
pub const PLACEHOLDER_CHAR: char = '?';

/// Skip ASCII whitespace starting at `pos`.
pub fn skip_ws(text: &str, pos: usize) -> usize {
    let bytes = text.as_bytes();
    let mut pos = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Slice from the first `{` to the last `}`, inclusive.
pub fn strip_to_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Byte offset of the first non-whitespace character after `"<field>" :`.
pub fn find_field_value(text: &str, field: &str) -> Option<usize> {
    if field.is_empty() {
        return None;
    }

    let pattern = format!("\"{field}\"");
    let bytes = text.as_bytes();
    let mut from = 0;

    while let Some(found) = text[from..].find(&pattern) {
        let at = from + found;
        let after = skip_ws(text, at + pattern.len());
        if bytes.get(after) == Some(&b':') {
            return Some(skip_ws(text, after + 1));
        }
        from = at + 1;
    }

    None
}

/// Read a string literal starting at `pos` (leading whitespace allowed).
///
/// Returns the unescaped value and the offset just past the closing quote,
/// or `None` when there is no opening quote or the literal never closes.
pub fn read_string_literal(text: &str, pos: usize) -> Option<(String, usize)> {
    let start = skip_ws(text, pos);
    if text.as_bytes().get(start) != Some(&b'"') {
        return None;
    }
    let body = start + 1;

    let mut out = String::new();
    let mut chars = text[body..].char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            '"' => return Some((out, body + offset + 1)),
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    '"' | '\\' | '/' => out.push(escaped),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'u' => match hex4(chars.as_str()) {
                        Some(code) => {
                            out.push(latin1_or_placeholder(code));
                            for _ in 0..4 {
                                chars.next();
                            }
                        }
                        None => out.push(PLACEHOLDER_CHAR),
                    },
                    other => out.push(other),
                }
            }
            _ => out.push(c),
        }
    }

    None
}

fn hex4(rest: &str) -> Option<u32> {
    let digits = rest.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

fn latin1_or_placeholder(code: u32) -> char {
    match u8::try_from(code) {
        Ok(byte) => char::from(byte),
        Err(_) => PLACEHOLDER_CHAR,
    }
}

/// Find the `close` bracket matching the `open` bracket at `pos`.
///
/// Brackets inside string literals are ignored. Returns the byte offset of
/// the closing bracket.
pub fn match_closing(text: &str, pos: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(pos) != Some(&open) {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, &b) in bytes.iter().enumerate().skip(pos) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
    }

    None
}

/// Inclusive byte span of the value of `field` when it starts with `open`.
pub fn field_span(text: &str, field: &str, open: u8, close: u8) -> Option<(usize, usize)> {
    let start = find_field_value(text, field)?;
    let end = match_closing(text, start, open, close)?;
    Some((start, end))
}

/// Value of a string field, unescaped.
pub fn extract_string_field(text: &str, field: &str) -> Option<String> {
    let pos = find_field_value(text, field)?;
    read_string_literal(text, pos).map(|(value, _)| value)
}

/// Read a base-10 integer the way `strtol` does: optional whitespace and
/// sign, then at least one digit. Out-of-range values saturate.
pub fn read_int(text: &str, pos: usize) -> Option<i64> {
    let bytes = text.as_bytes();
    let mut pos = skip_ws(text, pos);

    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let digits_start = pos;
    let mut value: i64 = 0;
    while let Some(b) = bytes.get(pos).filter(|b| b.is_ascii_digit()) {
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
        pos += 1;
    }

    (pos > digits_start).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strip_to_object_takes_first_and_last_brace() {
        let text = "banner {\"a\":1} middle {\"b\":2} trailer";
        assert_eq!(strip_to_object(text), Some("{\"a\":1} middle {\"b\":2}"));
        assert_eq!(strip_to_object("no json here"), None);
        assert_eq!(strip_to_object("} backwards {"), None);
    }

    #[test]
    fn reads_all_simple_escapes() {
        let text = r#""q\" b\\ s\/ \b\f\n\r\t end""#;
        let (value, next) = read_string_literal(text, 0).unwrap();
        assert_eq!(value, "q\" b\\ s/ \u{8}\u{c}\n\r\t end");
        assert_eq!(next, text.len());
    }

    #[test]
    fn unicode_escapes_are_latin1_only() {
        let (value, _) = read_string_literal(r#""\u0041\u00e9\u263a""#, 0).unwrap();
        assert_eq!(value, "Aé?");
    }

    #[test]
    fn malformed_unicode_escape_becomes_placeholder() {
        let (value, _) = read_string_literal(r#""x\uZZ12y""#, 0).unwrap();
        assert_eq!(value, "x?ZZ12y");
    }

    #[test]
    fn surrogate_pairs_are_not_combined() {
        let (value, _) = read_string_literal(r#""\ud83d\ude00""#, 0).unwrap();
        assert_eq!(value, "??");
    }

    #[test]
    fn unterminated_literal_is_rejected() {
        assert_eq!(read_string_literal(r#""never ends"#, 0), None);
        assert_eq!(read_string_literal(r#""dangling \"#, 0), None);
        assert_eq!(read_string_literal("42", 0), None);
    }

    #[test]
    fn non_ascii_text_passes_through() {
        let (value, _) = read_string_literal("\"größe ✓\"", 0).unwrap();
        assert_eq!(value, "größe ✓");
    }

    #[test]
    fn field_lookup_requires_colon() {
        let text = r#"{"note":"name", "name" : "real"}"#;
        assert_eq!(extract_string_field(text, "name").as_deref(), Some("real"));
    }

    #[test]
    fn field_lookup_takes_first_textual_match() {
        // The decoy inside the string value is found first.
        let text = r#"{"assistant_text":"see \"name\": \"decoy\"","name":"real"}"#;
        let found = extract_string_field(text, "name");
        assert_ne!(found.as_deref(), Some("real"));
    }

    #[test]
    fn match_closing_ignores_brackets_in_strings() {
        let text = r#"[{"a":"]"},{"b":"\"]"}] tail"#;
        let end = match_closing(text, 0, b'[', b']').unwrap();
        assert_eq!(&text[..=end], r#"[{"a":"]"},{"b":"\"]"}]"#);
    }

    #[test]
    fn match_closing_requires_open_bracket() {
        assert_eq!(match_closing("x[]", 0, b'[', b']'), None);
        assert_eq!(match_closing("[[]", 0, b'[', b']'), None);
    }

    #[test]
    fn field_span_finds_nested_array() {
        let text = r#"{"tool_calls": [[1], [2]], "x": 1}"#;
        let (start, end) = field_span(text, "tool_calls", b'[', b']').unwrap();
        assert_eq!(&text[start..=end], "[[1], [2]]");
    }

    #[test]
    fn read_int_behaves_like_strtol() {
        assert_eq!(read_int("  42,", 0), Some(42));
        assert_eq!(read_int("-7}", 0), Some(-7));
        assert_eq!(read_int("+3", 0), Some(3));
        assert_eq!(read_int("\"5\"", 0), None);
        assert_eq!(read_int("-", 0), None);
        assert_eq!(read_int("99999999999999999999999", 0), Some(i64::MAX));
    }
}
