//! Tokenization shared by indexing and querying.

/// Function words that carry no retrieval signal.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "did", "do", "does", "for", "from", "how",
    "in", "is", "it", "its", "of", "on", "or", "the", "to", "was", "were", "what", "when", "which",
    "who", "with",
];

/// Lowercase the text and split it into alphanumeric terms, dropping stopwords.
///
/// Punctuation separates terms, so `"1997?"` and `"1997"` match, and
/// `"AOV"` matches `"aov"`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits_punctuation() {
        assert_eq!(
            tokenize("Summer Beverages 1997: AOV?"),
            vec!["summer", "beverages", "1997", "aov"]
        );
    }

    #[test]
    fn test_tokenize_drops_stopwords() {
        assert_eq!(tokenize("What is the return window"), vec!["return", "window"]);
        assert!(tokenize("what is the").is_empty());
    }

    #[test]
    fn test_tokenize_keeps_unicode_letters() {
        assert_eq!(tokenize("Café-Lattes"), vec!["café", "lattes"]);
    }
}
