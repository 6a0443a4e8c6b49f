use std::borrow::Cow;

/// Escape text for interpolation into markup, as text content or inside a
/// quoted attribute value.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(&['&', '<', '>', '"', '\''][..]) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Absent input escapes to the empty string
pub fn escape_opt(input: Option<&str>) -> Cow<'_, str> {
    match input {
        Some(s) => escape_html(s),
        None => Cow::Borrowed(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(escape_html("Inception"), Cow::Borrowed("Inception")));
    }

    #[test]
    fn test_empty_and_absent() {
        assert_eq!(escape_html(""), "");
        assert_eq!(escape_opt(None), "");
        assert_eq!(escape_opt(Some("a&b")), "a&amp;b");
    }

    #[test]
    fn test_existing_entities_are_escaped_again() {
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }
}
