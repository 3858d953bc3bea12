//! Byte subsequence search

/// Find the lowest index `i >= offset` where `needle` occurs in `haystack`.
///
/// Both arguments are compared as raw bytes, so `&str`, `String`, byte
/// slices, arrays and `Bytes` can be mixed freely. Returns `None` when the
/// needle does not occur or `offset` lies past the end of the haystack. An
/// empty needle matches at `offset`.
///
/// Naive sliding window, O(n·m).
///
/// ```
/// use bucketgate_core::multipart::find;
///
/// assert_eq!(find("abcabc", "bc", 0), Some(1));
/// assert_eq!(find(b"abcabc", "bc", 2), Some(4));
/// assert_eq!(find("abc", "x", 0), None);
/// ```
pub fn find(haystack: impl AsRef<[u8]>, needle: impl AsRef<[u8]>, offset: usize) -> Option<usize> {
    let haystack = haystack.as_ref();
    let needle = needle.as_ref();

    if offset > haystack.len() || needle.len() > haystack.len() - offset {
        return None;
    }

    let last = haystack.len() - needle.len();
    (offset..=last).find(|&i| &haystack[i..i + needle.len()] == needle)
}
