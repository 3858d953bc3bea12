//! Boundary extraction from a `Content-Type` header

use crate::{Error, Result};

const BOUNDARY_ATTR: &str = "boundary=";

/// Multipart boundary token and the delimiter derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    token: String,
    delimiter: Vec<u8>,
}

impl Boundary {
    /// Build from a raw token; an empty token is rejected
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::MissingBoundary);
        }
        let delimiter = format!("--{token}").into_bytes();
        Ok(Self { token, delimiter })
    }

    /// The token as declared in the header
    pub fn token(&self) -> &str {
        &self.token
    }

    /// `--` followed by the token; separates parts in the body
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }
}

/// Extract the boundary from a `Content-Type` header value.
///
/// The attribute name is matched case-insensitively and must start the
/// header or follow `;` or whitespace. The value runs to the next `;`
/// (or to the closing quote when quoted) and is trimmed.
///
/// ```
/// use bucketgate_core::multipart::extract_boundary;
///
/// let b = extract_boundary(Some("multipart/form-data; boundary=----X")).unwrap();
/// assert_eq!(b.delimiter(), b"------X");
/// assert!(extract_boundary(Some("text/plain")).is_err());
/// ```
pub fn extract_boundary(content_type: Option<&str>) -> Result<Boundary> {
    let header = content_type.ok_or(Error::MissingBoundary)?;
    let lower = header.to_ascii_lowercase();

    let mut from = 0;
    while let Some(pos) = lower[from..].find(BOUNDARY_ATTR) {
        let start = from + pos;
        let preceded_ok = start == 0
            || matches!(lower.as_bytes()[start - 1], b';' | b' ' | b'\t');
        if preceded_ok {
            return Boundary::new(attribute_value(&header[start + BOUNDARY_ATTR.len()..]));
        }
        from = start + BOUNDARY_ATTR.len();
    }

    Err(Error::MissingBoundary)
}

fn attribute_value(rest: &str) -> &str {
    let rest = rest.trim_start();
    if let Some(quoted) = rest.strip_prefix('"') {
        return quoted.split('"').next().unwrap_or_default();
    }
    rest.split(';').next().unwrap_or_default().trim()
}
