//! Escaping and placeholder substitution shared by the template engines.

use std::{borrow::Cow, sync::LazyLock};

use regex::{Captures, Regex};

/// Matches `${name}` placeholders in requirement text.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}").expect("valid placeholder regex"));

/// Escapes text for embedding in (X)HTML element content or attribute values.
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Replaces every `${name}` for which `lookup` returns a value.
///
/// Placeholders `lookup` does not know are left as they are.
pub fn substitute<'a, F>(text: &'a str, lookup: F) -> Cow<'a, str>
where
    F: Fn(&str) -> Option<String>,
{
    PLACEHOLDER.replace_all(text, |caps: &Captures| {
        lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    })
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("plain", "plain"; "nothing to escape")]
    #[test_case("a < b && c > d", "a &lt; b &amp;&amp; c &gt; d"; "operators")]
    #[test_case(r#"say "hi" it's"#, "say &quot;hi&quot; it&#39;s"; "quotes")]
    fn escapes(input: &str, expected: &str) {
        assert_eq!(escape(input), expected);
    }

    #[test]
    fn unescaped_text_is_borrowed() {
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn substitutes_known_placeholders_only() {
        let text = "Deliver ${DOC} by ${DATE} to ${unknown}";
        let result = substitute(text, |name| match name {
            "DOC" => Some("SDP".to_string()),
            "DATE" => Some("PDR".to_string()),
            _ => None,
        });
        assert_eq!(result, "Deliver SDP by PDR to ${unknown}");
    }

    #[test]
    fn substitution_is_not_recursive() {
        let result = substitute("${A}", |name| {
            (name == "A").then(|| "${A}".to_string())
        });
        assert_eq!(result, "${A}");
    }
}
