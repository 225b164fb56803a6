//! Keyword normalization and tokenization.

/// Trim and lower-case a raw keyword. Returns `None` when nothing remains,
/// in which case no full-text predicate should be built at all.
pub fn normalize(keyword: &str) -> Option<String> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Split a normalized phrase on runs of whitespace, discarding empty tokens.
pub fn tokenize(phrase: &str) -> Vec<&str> {
    phrase.split_whitespace().collect()
}

/// Whether a token participates in per-word expansion.
///
/// Short tokens ("di", "ke", "jl") match almost every row, so only words of
/// at least `min_len` characters are expanded. Length is counted in chars,
/// not bytes.
///
/// `%` and `_` are deliberately not stripped or escaped here: patterns are
/// bound as query parameters downstream, so the only effect of a literal
/// `%`/`_` in the keyword is an extra LIKE wildcard. Power users can exploit
/// that; it can never change the query shape.
pub fn expandable(token: &str, min_len: usize) -> bool {
    token.chars().count() >= min_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Rumah Kaliurang "), Some("rumah kaliurang".into()));
        assert_eq!(normalize("SHM"), Some("shm".into()));
    }

    #[test]
    fn normalize_rejects_whitespace_only() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("\t\n"), None);
    }

    #[test]
    fn tokenize_never_yields_empty_tokens() {
        let tokens = tokenize("rumah   jl \t kaliurang");
        assert_eq!(tokens, vec!["rumah", "jl", "kaliurang"]);
        assert!(tokens.iter().all(|t| !t.trim().is_empty()));
    }

    #[test]
    fn expandable_counts_chars_not_bytes() {
        assert!(!expandable("jl", 3));
        assert!(expandable("shm", 3));
        // two chars, four bytes
        assert!(!expandable("éé", 3));
    }
}
