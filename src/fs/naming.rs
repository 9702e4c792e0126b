//! Filename generation and manipulation.

use crate::error::{Error, Result};
use crate::media::parser::extension;

/// Longest original filename kept verbatim.
pub const MAX_FILENAME_CHARS: usize = 50;

/// Sanitize a path component (guild or channel folder).
///
/// Rejects traversal patterns and null bytes, replaces characters that are
/// invalid on common filesystems.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    // Reject path traversal attempts
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    // Reject null bytes
    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized = replace_invalid_chars(name);

    // Reject empty or whitespace-only names
    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Path component cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Replace separators, reserved and control characters with underscores.
fn replace_invalid_chars(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Cut a filename to [`MAX_FILENAME_CHARS`] characters, keeping its extension.
pub fn truncate_filename(name: &str) -> String {
    if name.chars().count() <= MAX_FILENAME_CHARS {
        return name.to_string();
    }

    let head: String = name.chars().take(MAX_FILENAME_CHARS).collect();
    match extension(name) {
        Some(ext) => format!("{}.{}", head, ext),
        None => head,
    }
}

/// Name a downloaded file is stored under: `<message id>.<truncated name>`.
///
/// The message id prefix keeps files from different messages apart even when
/// they were uploaded under the same name.
pub fn stored_filename(message_id: &str, original: &str) -> String {
    let cleaned = replace_invalid_chars(original.trim());
    let cleaned = cleaned.trim_start_matches('.');
    let name = if cleaned.is_empty() { "file" } else { cleaned };
    format!("{}.{}", message_id, truncate_filename(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_component_valid() {
        assert_eq!(sanitize_path_component("123456").unwrap(), "123456");
        assert_eq!(sanitize_path_component("@me").unwrap(), "@me");
        // Path separators are sanitized (not rejected) in path components
        assert_eq!(
            sanitize_path_component("path/to/name").unwrap(),
            "path_to_name"
        );
    }

    #[test]
    fn test_sanitize_path_component_rejected() {
        assert!(sanitize_path_component("../evil").is_err());
        assert!(sanitize_path_component("foo/../bar").is_err());
        assert!(sanitize_path_component("a\0b").is_err());
        assert!(sanitize_path_component("   ").is_err());
    }

    #[test]
    fn test_short_names_untouched() {
        assert_eq!(truncate_filename("cat.png"), "cat.png");
        let exactly_fifty = "a".repeat(46) + ".png";
        assert_eq!(truncate_filename(&exactly_fifty), exactly_fifty);
    }

    #[test]
    fn test_long_names_truncated_with_extension() {
        let long = "b".repeat(80) + ".jpeg";
        let truncated = truncate_filename(&long);
        assert_eq!(truncated, "b".repeat(50) + ".jpeg");

        let long_no_ext = "c".repeat(70);
        assert_eq!(truncate_filename(&long_no_ext), "c".repeat(50));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let long = "é".repeat(60) + ".txt";
        assert_eq!(truncate_filename(&long), "é".repeat(50) + ".txt");
    }

    #[test]
    fn test_stored_filename() {
        assert_eq!(stored_filename("100", "cat.png"), "100.cat.png");
        assert_eq!(stored_filename("90", "../../etc/passwd"), "90._.._etc_passwd");
        assert_eq!(stored_filename("80", ""), "80.file");
        assert_eq!(stored_filename("70", "a:b?.txt"), "70.a_b_.txt");
    }
}
