//! Multipart body scanner
//!
//! Walks a fully buffered `multipart/form-data` body from one delimiter to
//! the next. Each call to [`Scanner::step`] resolves exactly one part (or
//! reports the end of the body) and returns the cursor for the next call,
//! so callers can interleave their own work, such as storing the part,
//! between steps.
//!
//! ```text
//! SeekBoundary -> ReadHeaders -> LocatePartEnd -> EmitPart | SkipPart
//!      |               |               |
//!      v               v               v
//!     Done          Aborted         Aborted
//! ```

use super::{find, parse_filename, Boundary};
use bytes::Bytes;
use std::ops::Range;
use thiserror::Error;

/// Separates a part's header block from its content
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Suffix that turns a delimiter into the close delimiter.
///
/// Only the last delimiter in the body counts as the close delimiter. An
/// earlier `--token--` (inside part content) is read as an ordinary part
/// start, so later parts are still found.
const CLOSE_SUFFIX: &[u8] = b"--";

/// Why a scan stopped before reaching the close delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Malformed {
    /// No `CRLF CRLF` after the delimiter at `offset`
    #[error("no header terminator after offset {offset}")]
    MissingHeaderTerminator { offset: usize },

    /// Part content starting at `offset` is never followed by a delimiter
    #[error("part content at offset {offset} has no closing boundary")]
    UnterminatedPart { offset: usize },
}

/// One file-bearing part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPart {
    /// Value of the `filename` attribute
    pub filename: String,
    /// Content position within the body
    pub range: Range<usize>,
    /// Content bytes (shares the body's allocation)
    pub content: Bytes,
}

/// Scanner state. Intermediate states carry what the next transition needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    SeekBoundary { cursor: usize },
    ReadHeaders { part_start: usize },
    LocatePartEnd { headers_end: usize, filename: Option<String> },
    EmitPart { part: DecodedPart },
    SkipPart { next: usize },
    Done,
    Aborted(Malformed),
}

/// Outcome of one [`Scanner::step`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A part with a filename; resume scanning at `next`
    Emit { part: DecodedPart, next: usize },
    /// A part without a filename; resume scanning at `next`
    Skip { next: usize },
    /// No further parts
    Done,
    /// A required marker is missing; nothing after this point is decoded
    Aborted(Malformed),
}

/// Scanner over one buffered request body
#[derive(Debug, Clone)]
pub struct Scanner {
    body: Bytes,
    boundary: Boundary,
}

impl Scanner {
    pub fn new(body: Bytes, boundary: Boundary) -> Self {
        Self { body, boundary }
    }

    /// Apply a single transition.
    ///
    /// Terminal states (`EmitPart`, `SkipPart`, `Done`, `Aborted`) are
    /// returned unchanged.
    pub fn transition(&self, state: ScanState) -> ScanState {
        let delimiter = self.boundary.delimiter();

        match state {
            ScanState::SeekBoundary { cursor } => match find(&self.body, delimiter, cursor) {
                None => ScanState::Done,
                Some(pos) => {
                    let part_start = pos + delimiter.len();
                    let closing = self.body[part_start..].starts_with(CLOSE_SUFFIX)
                        && find(&self.body, delimiter, part_start).is_none();
                    if closing {
                        ScanState::Done
                    } else {
                        ScanState::ReadHeaders { part_start }
                    }
                }
            },
            ScanState::ReadHeaders { part_start } => {
                match find(&self.body, HEADER_TERMINATOR, part_start) {
                    None => ScanState::Aborted(Malformed::MissingHeaderTerminator {
                        offset: part_start,
                    }),
                    Some(terminator) => {
                        let block = String::from_utf8_lossy(&self.body[part_start..terminator]);
                        ScanState::LocatePartEnd {
                            headers_end: terminator + HEADER_TERMINATOR.len(),
                            filename: parse_filename(&block),
                        }
                    }
                }
            }
            ScanState::LocatePartEnd { headers_end, filename } => {
                match find(&self.body, delimiter, headers_end) {
                    None => ScanState::Aborted(Malformed::UnterminatedPart {
                        offset: headers_end,
                    }),
                    Some(end) => match filename {
                        Some(filename) => ScanState::EmitPart {
                            part: DecodedPart {
                                filename,
                                range: headers_end..end,
                                content: self.body.slice(headers_end..end),
                            },
                        },
                        None => ScanState::SkipPart { next: end },
                    },
                }
            }
            terminal => terminal,
        }
    }

    /// Resolve the next part at or after `cursor`.
    ///
    /// The `next` cursor of `Emit`/`Skip` is always strictly greater than
    /// `cursor`, so repeatedly stepping terminates.
    pub fn step(&self, cursor: usize) -> Step {
        let mut state = ScanState::SeekBoundary { cursor };

        loop {
            state = match self.transition(state) {
                ScanState::EmitPart { part } => {
                    let next = part.range.end;
                    debug_assert!(next > cursor);
                    tracing::debug!(cursor, next, filename = %part.filename, "multipart part");
                    return Step::Emit { part, next };
                }
                ScanState::SkipPart { next } => {
                    debug_assert!(next > cursor);
                    tracing::debug!(cursor, next, "multipart part without filename skipped");
                    return Step::Skip { next };
                }
                ScanState::Done => return Step::Done,
                ScanState::Aborted(reason) => {
                    tracing::debug!(cursor, %reason, "multipart scan aborted");
                    return Step::Aborted(reason);
                }
                intermediate => intermediate,
            };
        }
    }

    /// Iterate over file-bearing parts in body order.
    ///
    /// Yields at most one `Err`, after which iteration ends.
    pub fn parts(&self) -> Parts<'_> {
        Parts {
            scanner: self,
            cursor: 0,
            finished: false,
        }
    }
}

/// Iterator returned by [`Scanner::parts`]
#[derive(Debug)]
pub struct Parts<'a> {
    scanner: &'a Scanner,
    cursor: usize,
    finished: bool,
}

impl Iterator for Parts<'_> {
    type Item = Result<DecodedPart, Malformed>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.scanner.step(self.cursor) {
                Step::Emit { part, next } => {
                    self.cursor = next;
                    return Some(Ok(part));
                }
                Step::Skip { next } => self.cursor = next,
                Step::Done => self.finished = true,
                Step::Aborted(reason) => {
                    self.finished = true;
                    return Some(Err(reason));
                }
            }
        }
        None
    }
}
