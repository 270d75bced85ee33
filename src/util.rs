//! Shared utility functions.

/// Convert heading text to an anchor id.
///
/// Lowercases and trims the text, drops every character that is not a letter,
/// digit, whitespace or hyphen, then collapses each whitespace run into a
/// single hyphen.
/// "Getting Started!" -> "getting-started"
/// "What's  New?" -> "whats-new"
pub fn slugify(s: &str) -> String {
    let lowered = s.to_lowercase();
    let kept = lowered
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-');

    let mut slug = String::with_capacity(lowered.len());
    let mut in_whitespace = false;
    for c in kept {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
            }
            in_whitespace = true;
        } else {
            slug.push(c);
            in_whitespace = false;
        }
    }

    slug
}

/// The anchor id for a heading.
///
/// Both the table of contents and the markdown renderer go through here, so a
/// heading's link target and its `id` attribute can never disagree.
pub fn heading_anchor(explicit_id: Option<&str>, text: &str) -> String {
    match explicit_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => slugify(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("API Reference"), "api-reference");
        assert_eq!(slugify("  Padded  "), "padded");
    }

    #[test]
    fn test_slugify_collapses_whitespace_runs() {
        assert_eq!(slugify("a  \t b"), "a-b");
        // Punctuation is dropped before the collapse, so its surrounding
        // spaces merge into one run.
        assert_eq!(slugify("Rust & Safety"), "rust-safety");
    }

    #[test]
    fn test_slugify_keeps_hyphens_and_unicode_letters() {
        assert_eq!(slugify("state-of-the-art"), "state-of-the-art");
        assert_eq!(slugify("Café Numérique"), "café-numérique");
        assert_eq!(slugify("snake_case"), "snakecase");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        for input in [
            "Hello World",
            "  Mixed CASE -- and   spaces ",
            "Über-Ärger (2024)",
            "$$x^2$$ in a heading",
            "",
        ] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_heading_anchor_prefers_explicit_id() {
        assert_eq!(heading_anchor(Some("custom"), "Some Title"), "custom");
        assert_eq!(heading_anchor(Some(""), "Some Title"), "some-title");
        assert_eq!(heading_anchor(None, "Some Title"), "some-title");
    }
}
