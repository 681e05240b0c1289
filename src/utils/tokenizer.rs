use unicode_segmentation::{UnicodeSegmentation, UnicodeWords};

/// Maximum term length to keep, in chars.
/// Longer words are almost always base64 blobs, hashes or hex dumps.
const MAX_TERM_LENGTH: usize = 255;

/// Position of a token within a document's token stream
pub type Position = u32;

/// A normalized term together with its position in the token stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub position: Position,
}

/// Lazy token stream over a piece of text.
///
/// Words are split on Unicode word boundaries (UAX #29) and lowercased.
/// Positions start at 0 and increase by one for every emitted token, so
/// skipped words never leave gaps. The stream is restartable by calling
/// [`tokenize`] again on the same text.
pub struct Tokens<'a> {
    words: UnicodeWords<'a>,
    next_position: Position,
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        for word in self.words.by_ref() {
            if word.chars().nth(MAX_TERM_LENGTH).is_some() {
                continue;
            }

            let token = Token {
                term: word.to_lowercase(),
                position: self.next_position,
            };
            self.next_position += 1;
            return Some(token);
        }
        None
    }
}

/// Tokenize document text into positioned, normalized terms
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens {
        words: text.unicode_words(),
        next_position: 0,
    }
}

/// Normalize a raw query fragment into the terms the indexes store.
///
/// Runs the exact same pipeline as document ingestion, so a single raw
/// token may produce zero, one or several terms.
pub fn normalize(raw: &str) -> Vec<String> {
    tokenize(raw).map(|token| token.term).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_start_at_zero() {
        let tokens: Vec<Token> = tokenize("first second third").collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[2].term, "third");
        assert_eq!(tokens[2].position, 2);
    }

    #[test]
    fn test_lowercase_and_punctuation() {
        let terms = normalize("Hello, World! Java-Programming.");
        assert_eq!(terms, vec!["hello", "world", "java", "programming"]);
    }

    #[test]
    fn test_non_ascii_words() {
        let terms = normalize("Привіт, Світе! Ça va?");
        assert_eq!(terms, vec!["привіт", "світе", "ça", "va"]);
    }

    #[test]
    fn test_long_words_are_skipped_without_gaps() {
        let blob = "x".repeat(MAX_TERM_LENGTH + 1);
        let text = format!("before {} after", blob);
        let tokens: Vec<Token> = tokenize(&text).collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].term, "after");
        assert_eq!(tokens[1].position, 1);
    }

    #[test]
    fn test_length_limit_counts_chars() {
        let cyrillic = "ж".repeat(MAX_TERM_LENGTH);
        assert!(cyrillic.len() > MAX_TERM_LENGTH);
        assert_eq!(normalize(&cyrillic), vec![cyrillic.clone()]);

        let too_long = "ж".repeat(MAX_TERM_LENGTH + 1);
        assert!(normalize(&too_long).is_empty());
    }

    #[test]
    fn test_stream_is_restartable() {
        let text = "one two three";
        let first: Vec<Token> = tokenize(text).collect();
        let second: Vec<Token> = tokenize(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize("").is_empty());
        assert!(normalize("  ... !!").is_empty());
    }
}
