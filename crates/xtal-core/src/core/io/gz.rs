use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// A path to a file that may be gzip-compressed, recognized by the `.gz` extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaybeGzipped {
    path: PathBuf,
}

impl MaybeGzipped {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_compressed(&self) -> bool {
        self.path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.eq_ignore_ascii_case("gz"))
    }

    /// The path with a trailing `.gz` removed, used to detect the inner format.
    pub fn basepath(&self) -> PathBuf {
        if self.is_compressed() {
            self.path.with_extension("")
        } else {
            self.path.clone()
        }
    }

    /// Opens the file, decompressing on the fly when needed.
    pub fn open(&self) -> io::Result<Box<dyn BufRead>> {
        let file = File::open(&self.path)?;
        if self.is_compressed() {
            Ok(Box::new(BufReader::new(GzDecoder::new(file))))
        } else {
            Ok(Box::new(BufReader::new(file)))
        }
    }

    /// Reads the whole (decompressed) content into memory.
    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.open()?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}
