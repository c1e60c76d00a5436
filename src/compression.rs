//! Compression algorithms.
//!
//! This module provides a Huffman coder for 7-bit text:
//! - frequency scanning with a reserved end-of-stream symbol
//! - linear-time prefix tree construction from sorted frequencies
//! - a compact header that stores frequencies instead of codes
//! - word-at-a-time bit packing with a byte-granular final flush
//!
//! # Examples
//!
//! ```rust
//! use hzip::compression::{huffman::Huffman, Compression};
//!
//! let codec = Huffman::new();
//! let archive = codec.compress(b"banana bandana").unwrap();
//! assert_eq!(codec.decompress(&archive).unwrap(), b"banana bandana");
//! ```

use crate::error::Error;

/// Result type for compression operations
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for compression algorithms
pub trait Compression {
    /// Compress the input data
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompress the compressed data
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;
}

pub mod huffman;
pub use huffman::{
    compress, decompress, CompressStats, DecompressStats, Huffman, HuffmanConfig,
};
