use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationErrors;

lazy_static! {
    /// Any character that may not appear in a storage key segment.
    /// Only ASCII letters, digits, dots and hyphens survive sanitization.
    pub static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9.-]").unwrap();
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
///
/// Multi-byte characters are replaced by a single `_`, one per character.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(name, "_").into_owned()
}

/// First field-level message of a failed validation, for single-message error bodies
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::filesystem::en::FileName;
    use fake::Fake;
    use validator::Validate;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1, message = "Missing name"))]
        name: String,
    }

    #[test]
    fn test_first_validation_message() {
        let errors = Named {
            name: String::new(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(first_validation_message(&errors), "Missing name");
    }

    #[test]
    fn test_sanitize_filename_examples() {
        assert_eq!(sanitize_filename("My File (1).pdf"), "My_File__1_.pdf");
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("slides-v2.pptx"), "slides-v2.pptx");
        assert_eq!(sanitize_filename("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_filename("a b\tc"), "a_b_c");
        assert_eq!(sanitize_filename("résumé.pdf"), "r_sum_.pdf");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn test_sanitize_filename_only_leaves_safe_chars() {
        for _ in 0..50 {
            let name: String = FileName().fake();
            let name = format!("{} copy (2)", name);
            let sanitized = sanitize_filename(&name);

            assert_eq!(sanitized.chars().count(), name.chars().count());
            assert!(sanitized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'));
        }
    }
}
