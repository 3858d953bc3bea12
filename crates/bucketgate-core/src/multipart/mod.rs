//! `multipart/form-data` decoding over a fully buffered body
//!
//! Leaf-first: [`find`] is the only search primitive, [`extract_boundary`]
//! turns the request `Content-Type` into a [`Boundary`],
//! [`parse_filename`] reads a part's header block, and [`Scanner`] ties
//! them together one part at a time.

mod boundary;
mod headers;
mod scanner;
mod search;

pub use boundary::{extract_boundary, Boundary};
pub use headers::parse_filename;
pub use scanner::{DecodedPart, Malformed, Parts, ScanState, Scanner, Step, HEADER_TERMINATOR};
pub use search::find;
