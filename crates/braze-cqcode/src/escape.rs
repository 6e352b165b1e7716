//! Escape and unescape primitives of the CQ marker grammar.
//!
//! Plain text protects `&`, `[` and `]`; marker field values additionally
//! protect `,`, the field separator. The substitution orders are part of
//! the wire grammar: `&` must be escaped first so an already produced
//! entity is never re-escaped, and unescaping runs the other way around,
//! commas first and ampersands last, so decoded content can never form a
//! new false marker.

/// Escapes special characters in a plain text run.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('[', "&#91;")
        .replace(']', "&#93;")
}

/// Unescapes a plain text run.
pub fn unescape_text(text: &str) -> String {
    text.replace("&#44;", ",")
        .replace("&#93;", "]")
        .replace("&#91;", "[")
        .replace("&amp;", "&")
}

/// Escapes special characters in a marker field value.
pub fn escape_value(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('[', "&#91;")
        .replace(']', "&#93;")
        .replace(',', "&#44;")
}

/// Unescapes a marker field value.
pub fn unescape_value(value: &str) -> String {
    unescape_text(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("[,]&"), "&#91;,&#93;&amp;");
        assert_eq!(escape_text("no specials"), "no specials");
        assert_eq!(escape_text("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("[,]&"), "&#91;&#44;&#93;&amp;");
        assert_eq!(escape_value("a,b,c"), "a&#44;b&#44;c");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_text("&#91;,&#93;&amp;"), "[,]&");
        assert_eq!(unescape_value("&#91;&#44;&#93;&amp;"), "[,]&");
        // An escaped entity reference survives one decode step intact.
        assert_eq!(unescape_text("&amp;amp;"), "&amp;");
    }

    #[test]
    fn test_roundtrip() {
        let samples = ["[,]&", "plain", "a=b,c=d", "&#91;already&#93;"];
        for s in samples {
            assert_eq!(unescape_text(&escape_text(s)), s);
            assert_eq!(unescape_value(&escape_value(s)), s);
        }
    }
}
