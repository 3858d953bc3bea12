//! Part header block parsing

const FILENAME_ATTR: &str = "filename=\"";

/// Extract the `filename="…"` attribute from a part's header block.
///
/// The first occurrence with a non-empty quoted value wins; occurrences
/// with an empty value are passed over. Returns `None` when no occurrence
/// qualifies, which callers treat as "skip this part".
pub fn parse_filename(block: &str) -> Option<String> {
    let mut from = 0;

    while let Some(pos) = block[from..].find(FILENAME_ATTR) {
        let value_start = from + pos + FILENAME_ATTR.len();
        let rest = &block[value_start..];

        match rest.find('"') {
            Some(0) => from = value_start,
            Some(end) => return Some(rest[..end].to_string()),
            // No closing quote anywhere after this point
            None => return None,
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_in_content_disposition() {
        let block = "\r\nContent-Disposition: form-data; name=\"f\"; filename=\"a.txt\"";
        assert_eq!(parse_filename(block).as_deref(), Some("a.txt"));
    }

    #[test]
    fn test_filename_with_following_headers() {
        let block = "\r\nContent-Disposition: form-data; name=\"doc\"; filename=\"report 2024.pdf\"\r\nContent-Type: application/pdf";
        assert_eq!(parse_filename(block).as_deref(), Some("report 2024.pdf"));
    }

    #[test]
    fn test_plain_field_has_no_filename() {
        let block = "\r\nContent-Disposition: form-data; name=\"title\"";
        assert_eq!(parse_filename(block), None);
    }

    #[test]
    fn test_empty_filename_is_skipped() {
        let block = "\r\nContent-Disposition: form-data; name=\"f\"; filename=\"\"";
        assert_eq!(parse_filename(block), None);

        let block = "filename=\"\" filename=\"second.bin\"";
        assert_eq!(parse_filename(block).as_deref(), Some("second.bin"));
    }

    #[test]
    fn test_unterminated_filename() {
        assert_eq!(parse_filename("filename=\"never-closed"), None);
    }

    #[test]
    fn test_first_filename_wins() {
        let block = "filename=\"one.txt\"; filename=\"two.txt\"";
        assert_eq!(parse_filename(block).as_deref(), Some("one.txt"));
    }

    #[test]
    fn test_non_ascii_filename() {
        let block = "Content-Disposition: form-data; filename=\"résumé.pdf\"";
        assert_eq!(parse_filename(block).as_deref(), Some("résumé.pdf"));
    }
}
