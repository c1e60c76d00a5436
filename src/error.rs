//! Error types shared by every stage of the codec.

use thiserror::Error;

/// Errors produced while compressing or decompressing.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the source or writing the destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value is out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The source holds a byte that is not a 7-bit text symbol.
    /// Byte 0 is reserved for the end-of-stream marker.
    #[error("byte {0:#04x} cannot be encoded: only values 1..=127 are supported")]
    InvalidSymbol(u8),

    /// Tree construction was asked to work on zero symbols.
    #[error("cannot build a prefix tree from an empty alphabet")]
    EmptyAlphabet,

    /// The alphabet size does not fit in the one-byte header count.
    #[error("alphabet of {0} symbols exceeds the 255 symbol limit")]
    AlphabetTooLarge(usize),

    /// The archive header is corrupt or incomplete.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// The packed bitstream ran out before the end-of-stream marker.
    #[error("compressed stream ended before the end-of-stream marker")]
    Truncated,

    /// A symbol sits deeper in the tree than a code register can hold.
    #[error("code for symbol {symbol:#04x} is {length} bits long, longer than 64 bits")]
    CodeOverflow { symbol: u8, length: usize },
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
