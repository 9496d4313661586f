//! Plain-text code list format.
//!
//! One code per line. Blank lines and lines starting with `#` (after
//! trimming) are ignored on read and preserved on rewrite.

use regex::Regex;
use std::sync::LazyLock;

use super::error::{StorageError, StorageResult};

/// Content written to a freshly bootstrapped codes file.
pub const CODES_FILE_HEADER: &str = "# ghostkey: one code per line, lines starting with # are ignored\n";

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{6,10}$").expect("valid code pattern"));

fn code_line(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        None
    } else {
        Some(trimmed)
    }
}

/// Extract the ordered code list from file content.
pub fn parse_codes(text: &str) -> Vec<String> {
    text.lines().filter_map(code_line).map(str::to_string).collect()
}

/// Validate user input for appending.
///
/// Returns `Ok(None)` for blank input, `Ok(Some(code))` with the trimmed
/// code when valid.
pub fn validate_code(input: &str) -> StorageResult<Option<String>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !CODE_PATTERN.is_match(trimmed) {
        return Err(StorageError::invalid_code());
    }
    Ok(Some(trimmed.to_string()))
}

/// Append `code` as a new last line, keeping the existing content intact.
pub fn with_appended(text: &str, code: &str) -> String {
    let mut out = String::with_capacity(text.len() + code.len() + 2);
    out.push_str(text);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(code);
    out.push('\n');
    out
}

/// Drop the first code line equal to `code`.
///
/// Returns `None` when no such line exists. Comments, blank lines and the
/// relative order of the remaining codes are untouched.
pub fn without_first(text: &str, code: &str) -> Option<String> {
    let mut removed = false;
    let mut kept = Vec::new();

    for line in text.lines() {
        if !removed && code_line(line) == Some(code) {
            removed = true;
            continue;
        }
        kept.push(line);
    }

    if !removed {
        return None;
    }

    let mut out = kept.join("\n");
    if !out.is_empty() && text.ends_with('\n') {
        out.push('\n');
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let text = "# header\n\n 111111 \n   # indented comment\n222222\r\n\n";
        assert_eq!(parse_codes(text), vec!["111111", "222222"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_codes("").is_empty());
        assert!(parse_codes(CODES_FILE_HEADER).is_empty());
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate_code("  123456 ").unwrap(), Some("123456".to_string()));
        assert_eq!(validate_code("1234567890").unwrap(), Some("1234567890".to_string()));
        assert_eq!(validate_code("   ").unwrap(), None);
        assert_eq!(validate_code("").unwrap(), None);

        for bad in ["12345", "12345678901", "12a456", "123 456", "-123456"] {
            let err = validate_code(bad).unwrap_err();
            assert_eq!(err.to_string(), "Code must be 6–10 digits", "input {bad:?}");
        }
    }

    #[test]
    fn test_validate_rejects_non_ascii_digits() {
        // Arabic-Indic digits are Unicode \d but cannot be typed as keystrokes
        assert!(validate_code("١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_with_appended_adds_missing_newline() {
        assert_eq!(with_appended("# h\n111111", "222222"), "# h\n111111\n222222\n");
        assert_eq!(with_appended("# h\n", "222222"), "# h\n222222\n");
        assert_eq!(with_appended("", "222222"), "222222\n");
    }

    #[test]
    fn test_without_first_preserves_layout() {
        let text = "# header\n111111\n\n222222\n111111\n";
        let out = without_first(text, "111111").unwrap();
        assert_eq!(out, "# header\n\n222222\n111111\n");
        assert_eq!(parse_codes(&out), vec!["222222", "111111"]);
    }

    #[test]
    fn test_without_first_ignores_commented_match() {
        let text = "# 111111\n222222\n";
        assert!(without_first(text, "111111").is_none());
    }

    #[test]
    fn test_without_first_last_code() {
        let out = without_first("# header\n111111\n", "111111").unwrap();
        assert_eq!(out, "# header\n");
    }
}
