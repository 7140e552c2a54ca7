//! A reader and writer for the Project Haystack Zinc grid text format.
//!
//! ```text
//! bytes -> CharCursor -> Tokenizer -> TokenCursor -> Parser -> GridBuilder -> Grid
//! ```
//!
//! Parsing is pull-based and fails fast: a malformed stream never yields a
//! partial [`Grid`]. See [`parse`] and [`read`] for the entry points, and
//! [`Grid::to_zinc_string`] to emit one back.

mod builder;
mod char_cursor;
mod dict;
mod emitter;
mod error;
mod grid;
mod parser;
mod scalar;
mod token;
mod token_cursor;
mod tokenizer;

pub use builder::ColumnData;
pub use dict::Dict;
pub use error::{Result, ZincError};
pub use grid::Grid;
pub use scalar::{NumberValue, Scalar};

use std::path::Path;

/// Parses an in-memory Zinc document.
pub fn parse(text: &str) -> Result<Grid> {
    parser::parse(text)
}

/// Reads and parses a Zinc document from any readable byte source.
pub fn read(mut source: impl std::io::Read) -> Result<Grid> {
    let mut text = String::new();
    source
        .read_to_string(&mut text)
        .map_err(ZincError::IoAnonymous)?;
    parse(&text)
}

/// Reads and parses a Zinc document from a file path.
pub fn read_file(path: impl AsRef<Path>) -> Result<Grid> {
    let path = path.as_ref();
    log::debug!("reading zinc grid from {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|source| ZincError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_from_a_byte_slice() {
        let grid = read("ver:\"3.0\"\nts\n2020-01-01T00:00:00Z\n".as_bytes()).unwrap();
        assert_eq!(grid.version(), 3);
        assert_eq!(grid.row_count(), 1);
    }
}
