//! Token normalization shared by linking and title search.
//!
//! One pipeline, used identically on both sides of every comparison:
//! trim, lowercase, strip diacritics, split on whitespace, strip
//! punctuation from token edges, drop empties.

use unicode_normalization::UnicodeNormalization;

/// Normalize free text into comparison tokens.
///
/// Punctuation is stripped from token edges only, so `"co-op"` keeps its
/// interior hyphen while `"thou!"` becomes `"thou"`. Pure and
/// deterministic.
pub fn normalize_tokens(text: &str) -> Vec<String> {
    strip_diacritics(text.trim())
        .to_lowercase()
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove diacritics: canonical decomposition, drop combining marks,
/// recompose.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .nfc()
        .collect()
}

/// Whether two strings normalize to the same token sequence.
pub fn tokens_equal(a: &str, b: &str) -> bool {
    normalize_tokens(a) == normalize_tokens(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_lowercased_and_trimmed() {
        assert_eq!(
            normalize_tokens("  The FLY  "),
            vec!["the".to_string(), "fly".to_string()]
        );
    }

    #[test]
    fn punctuation_stripped_from_edges_only() {
        assert_eq!(
            normalize_tokens("where, art thou!"),
            vec!["where", "art", "thou"]
        );
        assert_eq!(normalize_tokens("co-op"), vec!["co-op"]);
    }

    #[test]
    fn diacritics_are_stripped() {
        assert_eq!(strip_diacritics("Amélie"), "Amelie");
        assert_eq!(normalize_tokens("Amélie Poulain"), vec!["amelie", "poulain"]);
    }

    #[test]
    fn garbage_tokens_disappear() {
        assert_eq!(
            normalize_tokens("??? licorice ==> piZZa (2021)%%$$##"),
            vec!["licorice", "pizza", "2021"]
        );
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(normalize_tokens("").is_empty());
        assert!(normalize_tokens("  --- !!! ").is_empty());
    }

    #[test]
    fn token_equality_ignores_case_and_punctuation() {
        assert!(tokens_equal("The Fly", "the fly"));
        assert!(tokens_equal("Khrustalyov, My Car!", "khrustalyov my car"));
        assert!(!tokens_equal("The Fly", "Curse of the Fly"));
    }
}
