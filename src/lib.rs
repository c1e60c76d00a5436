//! Huffman compression for 7-bit text files.
//!
//! The archive stores the alphabet and its frequencies, never the codes: the
//! decoder rebuilds the same prefix tree and walks it until the end-of-stream
//! marker.
//!
//! ```rust
//! use hzip::{compress, decompress};
//! use std::io::Cursor;
//!
//! let text = b"so much depends upon a red wheel barrow";
//! let mut archive = Vec::new();
//! compress(Cursor::new(&text[..]), &mut archive)?;
//!
//! let mut restored = Vec::new();
//! decompress(Cursor::new(&archive), &mut restored)?;
//! assert_eq!(restored, text);
//! # Ok::<(), hzip::Error>(())
//! ```

pub mod compression;
pub mod error;

pub use compression::{
    compress, decompress, CompressStats, Compression, DecompressStats, Huffman, HuffmanConfig,
};
pub use error::{Error, Result};
