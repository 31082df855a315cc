use crate::error::{Result, ScreenError};
use crate::types::Rsid;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Reads one identifier per line, trimmed, in file order.
///
/// A missing file is an error. A read failure part way through is logged
/// and the identifiers read up to that point are returned.
pub fn load_identifiers(path: &Path) -> Result<Vec<Rsid>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScreenError::InputNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let identifiers = read_identifiers(BufReader::new(file));
    info!("Loaded {} identifiers from {}", identifiers.len(), path.display());
    Ok(identifiers)
}

/// Line reader behind [`load_identifiers`], usable on any buffered source.
pub fn read_identifiers<R: BufRead>(reader: R) -> Vec<Rsid> {
    let mut identifiers = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        match line {
            Ok(line) => {
                let id = line.trim();
                if !id.is_empty() {
                    identifiers.push(id.to_string());
                }
            }
            Err(e) => {
                warn!(
                    "Read error at line {}: {}; continuing with {} identifiers",
                    line_no + 1,
                    e,
                    identifiers.len()
                );
                break;
            }
        }
    }
    identifiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    #[test]
    fn trims_and_keeps_order_and_duplicates() {
        let input = Cursor::new("rs7412\n  rs429358 \r\n\nrs7412\n");
        assert_eq!(read_identifiers(input), vec!["rs7412", "rs429358", "rs7412"]);
    }

    #[test]
    fn empty_file_gives_empty_list() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(load_identifiers(file.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_identifiers(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, ScreenError::InputNotFound(_)));
    }

    /// Yields a fixed prefix, then fails.
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk went away"));
            }
            Ok(n)
        }
    }

    #[test]
    fn read_error_keeps_partial_data() {
        let reader = io::BufReader::new(FailingReader {
            data: Cursor::new(b"rs1\nrs2\n".to_vec()),
        });
        assert_eq!(read_identifiers(reader), vec!["rs1", "rs2"]);
    }
}
