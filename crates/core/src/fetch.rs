//! Content reading from files and stdin.
//!
//! Input is read as raw bytes; [`Document::parse_bytes`](crate::Document::parse_bytes)
//! decides whether it is usable.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::{DocsanError, Result};

/// Reads a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();

    if !path.exists() {
        Err(DocsanError::FileNotFound(path.to_path_buf()))
    } else {
        fs::read(path).map_err(DocsanError::from)
    }
}

/// Reads standard input until EOF.
pub fn fetch_stdin() -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/file.html");
        assert!(matches!(result, Err(DocsanError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"<html><body>caf\xc3\xa9</body></html>").unwrap();

        let bytes = fetch_file(file.path()).unwrap();
        assert_eq!(bytes, b"<html><body>caf\xc3\xa9</body></html>");
    }

    #[test]
    fn test_fetch_file_keeps_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x3c, 0xff, 0x3e]).unwrap();

        let bytes = fetch_file(file.path()).unwrap();
        assert!(matches!(
            crate::Document::parse_bytes(&bytes),
            Err(DocsanError::InvalidEncoding)
        ));
    }
}
