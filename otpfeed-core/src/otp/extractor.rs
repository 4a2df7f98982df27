//! Pattern-based extraction of 6-digit codes from SMS text

use regex::Regex;

/// Finds the verification code embedded in a message body
pub struct CodeExtractor {
    /// A run of exactly six ASCII digits, not touching further digits
    code_pattern: Regex,
}

impl CodeExtractor {
    /// Create a new CodeExtractor with its compiled pattern
    pub fn new() -> Self {
        Self {
            code_pattern: Regex::new(r"(?:^|[^0-9])([0-9]{6})(?:[^0-9]|$)")
                .expect("Failed to compile code pattern"),
        }
    }

    /// Extract the first 6-digit code from `body`
    ///
    /// Longer digit runs (phone numbers, order ids) are skipped rather than
    /// truncated. Returns `None` when the text carries no such run.
    pub fn extract(&self, body: &str) -> Option<String> {
        self.code_pattern
            .captures(body)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl Default for CodeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_apple_code() {
        let extractor = CodeExtractor::new();
        assert_eq!(
            extractor.extract("Your Apple ID Verification Code is: 482913"),
            Some("482913".to_string())
        );
    }

    #[test]
    fn test_extract_first_of_several() {
        let extractor = CodeExtractor::new();
        assert_eq!(
            extractor.extract("123456 then 654321"),
            Some("123456".to_string())
        );
    }

    #[test]
    fn test_extract_skips_longer_runs() {
        let extractor = CodeExtractor::new();
        assert_eq!(extractor.extract("Call 0123456789 now"), None);
        assert_eq!(
            extractor.extract("Order 1234567, code 246810."),
            Some("246810".to_string())
        );
    }

    #[test]
    fn test_extract_none_without_code() {
        let extractor = CodeExtractor::new();
        assert_eq!(extractor.extract("Your Apple ID Verification Code is: 12345"), None);
        assert_eq!(extractor.extract(""), None);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let extractor = CodeExtractor::new();
        let body = "Your Apple ID Verification Code is: 771204. Don't share it.";
        assert_eq!(extractor.extract(body), extractor.extract(body));
    }
}
