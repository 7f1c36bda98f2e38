//! Pre-compiled patterns shared by the matcher and the text-editing rules

use once_cell::sync::Lazy;
use regex::Regex;

/// Words that can never name a variable
pub const KEYWORDS: &[&str] = &[
    "and", "break", "continue", "elif", "else", "False", "for", "from", "if", "import", "in",
    "not", "or", "True", "while",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Common patterns used across the editor
pub struct EditorPatterns;

impl EditorPatterns {
    /// Complete identifier: `total`, `_tmp2`
    pub fn identifier() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Valid identifier regex")
        });
        &PATTERN
    }

    /// Number literal text while it is being typed: `12`, `3.`, `3.25`
    pub fn number_text() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^[0-9]+(\.[0-9]*)?$").expect("Valid number regex")
        });
        &PATTERN
    }

    /// Text that may still grow into an assignment or augmented assignment
    pub fn assignment_prefix() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^[A-Za-z_][A-Za-z0-9_]* ?[-+*/]?$").expect("Valid assignment prefix regex")
        });
        &PATTERN
    }

    /// `name.meth` while a method call on a variable is being typed
    pub fn method_on_variable_prefix() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(\.[A-Za-z_]*\(?)$")
                .expect("Valid method prefix regex")
        });
        &PATTERN
    }

    /// `name[` starting a list access on a variable
    pub fn list_access_on_variable() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\[$").expect("Valid list access regex")
        });
        &PATTERN
    }

    /// Remainder after a pattern trigger such as `for ` that is still a name prefix
    pub fn identifier_tail() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)?$").expect("Valid identifier tail regex")
        });
        &PATTERN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_pattern() {
        assert!(EditorPatterns::identifier().is_match("total_2"));
        assert!(!EditorPatterns::identifier().is_match("2total"));
        assert!(!EditorPatterns::identifier().is_match("a b"));
    }

    #[test]
    fn test_number_text_allows_trailing_dot() {
        assert!(EditorPatterns::number_text().is_match("3."));
        assert!(EditorPatterns::number_text().is_match("3.25"));
        assert!(!EditorPatterns::number_text().is_match("3.2.5"));
        assert!(!EditorPatterns::number_text().is_match(""));
    }

    #[test]
    fn test_method_on_variable_prefix() {
        let caps = EditorPatterns::method_on_variable_prefix()
            .captures("names.app")
            .unwrap();
        assert_eq!(&caps[1], "names");
        assert_eq!(&caps[2], ".app");
    }
}
