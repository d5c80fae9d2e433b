//! Error types for Docsan operations.
//!
//! This module defines the main error type [`DocsanError`]. Only input
//! that cannot be turned into a tree is fatal; everything the assembler
//! meets after parsing degrades to documented defaults instead.
//!
//! # Example
//!
//! ```rust
//! use docsan_core::{DocsanError, Document, Result, fetch_file};
//!
//! fn load(path: &str) -> Result<Document> {
//!     let bytes = fetch_file(path)?;
//!     Document::parse_bytes(&bytes)
//! }
//!
//! assert!(matches!(load("/no/such/page.html"), Err(DocsanError::FileNotFound(_))));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for parsing, reading and rendering documents.
///
/// # Example
///
/// ```rust
/// use docsan_core::{DocsanError, Document};
///
/// match Document::parse_bytes(&[0xff, 0xfe, 0x00]) {
///     Ok(_) => println!("parsed"),
///     Err(DocsanError::InvalidEncoding) => println!("not UTF-8"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum DocsanError {
    /// Invalid character encoding.
    ///
    /// Returned when the input bytes are not valid UTF-8.
    #[error("Invalid character encoding")]
    InvalidEncoding,

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Read and write errors on files and standard streams.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding of a document record failed.
    #[error("Failed to encode JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for DocsanError.
pub type Result<T> = std::result::Result<T, DocsanError>;
