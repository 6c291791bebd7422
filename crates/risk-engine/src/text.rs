//! Text normalisation and keyword matching helpers

/// Trim and lowercase
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Plain substring test against a keyword list (text must be lowercased)
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// First keyword of the list found as a substring
pub fn first_keyword<'a>(text: &str, keywords: &[&'a str]) -> Option<&'a str> {
    keywords.iter().copied().find(|kw| text.contains(kw))
}

/// `needle` occurs in `haystack` with no alphanumeric character on either side.
///
/// Both arguments are expected lowercased. "hong kong" matches
/// "strike in hong kong." but "oman" does not match "woman".
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Supplier names compare without regard to case
pub fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Truncate to at most `max` characters on a char boundary
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_word() {
        assert!(contains_word("strike in hong kong.", "hong kong"));
        assert!(contains_word("oman ports", "oman"));
        assert!(!contains_word("a woman said", "oman"));
        assert!(!contains_word("business as usual", "usa"));
        assert!(contains_word("usa", "usa"));
        assert!(!contains_word("anything", ""));
    }

    #[test]
    fn test_keywords() {
        assert!(contains_any("port strike today", &["strike", "flood"]));
        assert!(!contains_any("calm", &["strike", "flood"]));
        assert_eq!(first_keyword("flood and strike", &["strike", "flood"]), Some("strike"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
