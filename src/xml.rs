//! Escaping for the SVG and HTML emitters.

/// XML 1.0 valid char ranges:
/// - 0x09, 0x0A, 0x0D
/// - 0x20..=0xD7FF
/// - 0xE000..=0xFFFD
/// - 0x10000..=0x10FFFF
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// Escapes element text content, dropping chars XML cannot carry.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if !is_valid_xml_char(c) {
            continue;
        }
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escapes a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if !is_valid_xml_char(c) {
            continue;
        }
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_attr, escape_text};

    #[test]
    fn drops_invalid_control_chars() {
        assert_eq!(escape_text("A\u{0007}B\u{000C}C"), "ABC");
    }

    #[test]
    fn keeps_valid_whitespace_controls() {
        let s = "a\tb\nc\rd";
        assert_eq!(escape_text(s), s);
    }

    #[test]
    fn text_escapes_markup_but_not_quotes() {
        assert_eq!(escape_text(r#"a < b & "c""#), r#"a &lt; b &amp; "c""#);
    }

    #[test]
    fn attr_escapes_quotes_too() {
        assert_eq!(
            escape_attr(r#"<x a="y&z">'w'"#),
            "&lt;x a=&quot;y&amp;z&quot;&gt;&apos;w&apos;"
        );
    }
}
