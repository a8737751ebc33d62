use super::gz::MaybeGzipped;
use crate::core::models::structure::Structure;
use std::error::Error;
use std::io::{self, BufRead};
use std::path::Path;

/// Defines the interface for reading coordinate file formats into a [`Structure`].
///
/// Implementors handle format-specific parsing; opening files (including
/// gzip-compressed ones) is shared.
pub trait StructureFile {
    /// The error type for I/O and parsing failures.
    type Error: Error + From<io::Error>;

    /// Reads a structure from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Return
    ///
    /// Returns the parsed structure.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error>;

    /// Reads a structure from a file path; paths ending in `.gz` are decompressed.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the file to read.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Structure, Self::Error> {
        let mut reader = MaybeGzipped::new(path).open()?;
        Self::read_from(&mut reader)
    }
}
