/// Escape a string for inclusion in a JSON document.
///
/// Escapes control characters (0x00–0x1F), the double quote and the
/// backslash; everything else (including multi-byte Unicode) passes through
/// verbatim.
pub fn escape(s: &str) -> String {
    let mut out = String::new();
    let mut last = 0;
    for (i, ch) in s.char_indices() {
        let replacement: Option<String> = match ch {
            '"' => Some("\\\"".to_owned()),
            '\\' => Some("\\\\".to_owned()),
            '\u{0008}' => Some("\\b".to_owned()),
            '\t' => Some("\\t".to_owned()),
            '\n' => Some("\\n".to_owned()),
            '\u{000C}' => Some("\\f".to_owned()),
            '\r' => Some("\\r".to_owned()),
            c if c < '\u{0020}' => Some(format!("\\u{:04x}", c as u32)),
            _ => None,
        };
        if let Some(esc) = replacement {
            out.push_str(&s[last..i]);
            out.push_str(&esc);
            last = i + ch.len_utf8();
        }
    }
    out.push_str(&s[last..]);
    out
}
