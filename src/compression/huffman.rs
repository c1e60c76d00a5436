//! Huffman compression of 7-bit text streams.
//!
//! Compression reads the source twice. The first pass counts symbols, the
//! tree and codes are derived from the counts, the header is written, and the
//! second pass packs the codes followed by the end-of-stream marker.
//! Decompression parses the header, rebuilds the identical tree from the stored
//! frequencies and walks it bit by bit until the marker leaf.
//!
//! See [`header`] for the archive layout.

pub mod bitstream;
pub mod code;
pub mod frequency;
pub mod header;
pub mod tree;

pub use code::{CodeTable, CompactCode};
pub use frequency::{FrequencyTable, SymbolFrequency, SENTINEL};
pub use header::{FrequencyWidth, Header};
pub use tree::HuffmanTree;

use crate::compression::{Compression, Result};
use crate::error::Error;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};

use bitstream::{BitReader, BitWriter};

/// Tuning knobs for the codec. None of them change the archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanConfig {
    /// Accumulator width in bytes: 1, 2, 4 or 8.
    pub word_bytes: usize,
    /// Capacity of the buffers wrapped around the caller's streams.
    pub buffer_capacity: usize,
}

impl Default for HuffmanConfig {
    fn default() -> Self {
        Self {
            word_bytes: 8,
            buffer_capacity: 8 * 1024,
        }
    }
}

impl HuffmanConfig {
    /// Checks that every field is in range.
    pub fn validate(&self) -> Result<()> {
        bitstream::check_word_bytes(self.word_bytes)?;
        if self.buffer_capacity == 0 {
            return Err(Error::InvalidInput(
                "buffer capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sizes reported by a successful compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressStats {
    pub input_bytes: u64,
    pub symbols: usize,
    pub header_bytes: u64,
    pub payload_bytes: u64,
}

impl CompressStats {
    pub fn archive_bytes(&self) -> u64 {
        self.header_bytes + self.payload_bytes
    }
}

/// Sizes reported by a successful decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecompressStats {
    pub header_bytes: u64,
    pub payload_bytes: u64,
    pub output_bytes: u64,
}

/// Huffman codec for 7-bit text.
#[derive(Debug, Clone, Default)]
pub struct Huffman {
    config: HuffmanConfig,
}

impl Huffman {
    /// Creates a codec with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec after validating `config`.
    pub fn with_config(config: HuffmanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Huffman { config })
    }

    pub fn config(&self) -> &HuffmanConfig {
        &self.config
    }

    /// Compresses `input` from its current position to its end into `output`.
    ///
    /// Both streams are consumed and dropped when the call returns. The input
    /// is read twice, seeking back to where it started between passes.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSymbol`] if the input holds a byte outside `1..=127`
    /// - [`Error::CodeOverflow`] if a code would exceed 64 bits
    /// - [`Error::Io`] on any read, seek or write failure, or with
    ///   [`io::ErrorKind::InvalidData`] if the source length changed between
    ///   the two passes
    pub fn compress_stream<R, W>(&self, input: R, output: W) -> Result<CompressStats>
    where
        R: Read + Seek,
        W: Write,
    {
        let capacity = self.config.buffer_capacity;
        let mut reader = BufReader::with_capacity(capacity, input);
        let start = reader.stream_position()?;

        let table = FrequencyTable::scan(&mut reader)?;
        let header = Header::new(table.symbols())?;
        log::trace!("sorted alphabet: {:?}", header.symbols());
        let tree = HuffmanTree::from_sorted(header.symbols())?;
        let codes = CodeTable::from_tree(&tree)?;
        let sentinel = codes.get(SENTINEL).ok_or(Error::EmptyAlphabet)?;

        reader.seek(SeekFrom::Start(start))?;

        let mut writer = BufWriter::with_capacity(capacity, output);
        let header_bytes = header.write_to(&mut writer)? as u64;
        let mut bits = BitWriter::new(writer, self.config.word_bytes)?;

        let mut encoded = 0u64;
        loop {
            let chunk = reader.fill_buf()?;
            if chunk.is_empty() {
                break;
            }
            for &byte in chunk {
                let code = match codes.get(byte) {
                    Some(code) if byte != SENTINEL => code,
                    _ => return Err(Error::InvalidSymbol(byte)),
                };
                bits.write_code(code)?;
            }
            let len = chunk.len();
            reader.consume(len);
            encoded += len as u64;
        }
        if encoded != table.input_bytes() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "source changed between passes: counted {} bytes, encoded {}",
                    table.input_bytes(),
                    encoded
                ),
            )));
        }

        bits.write_code(sentinel)?;
        let payload_bytes = bits.finish()?;

        let stats = CompressStats {
            input_bytes: encoded,
            symbols: header.symbols().len(),
            header_bytes,
            payload_bytes,
        };
        log::debug!(
            "compressed {} bytes: {} symbols, {}-byte frequencies, header {} bytes, payload {} bytes",
            stats.input_bytes,
            stats.symbols,
            header.width().bytes(),
            stats.header_bytes,
            stats.payload_bytes
        );
        Ok(stats)
    }

    /// Decompresses an archive read from the current position of `input` into
    /// `output`.
    ///
    /// The payload length is taken from the stream length before decoding.
    /// On [`Error::Truncated`] the bytes decoded before the payload ran out
    /// have already been written and flushed to `output`.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedHeader`] if the header is corrupt
    /// - [`Error::Truncated`] if the payload ends before the end-of-stream marker
    /// - [`Error::Io`] on any read, seek or write failure
    pub fn decompress_stream<R, W>(&self, mut input: R, output: W) -> Result<DecompressStats>
    where
        R: Read + Seek,
        W: Write,
    {
        let start = input.stream_position()?;
        let end = input.seek(SeekFrom::End(0))?;
        input.seek(SeekFrom::Start(start))?;
        let archive_bytes = end.saturating_sub(start);

        let capacity = self.config.buffer_capacity;
        let mut reader = BufReader::with_capacity(capacity, input);
        let header = Header::read_from(&mut reader)?;
        let header_bytes = header.encoded_len() as u64;
        let payload_bytes = archive_bytes.saturating_sub(header_bytes);
        log::trace!("archive alphabet: {:?}", header.symbols());

        let tree = HuffmanTree::from_sorted(header.symbols())?;
        let mut bits = BitReader::new(reader, payload_bytes, self.config.word_bytes)?;
        let mut writer = BufWriter::with_capacity(capacity, output);

        let decoded = bitstream::decode(&tree, &mut bits, &mut writer);
        let flushed = writer.flush();
        let output_bytes = decoded.map_err(|e| {
            log::warn!("decompression stopped early: {}", e);
            e
        })?;
        flushed?;

        let stats = DecompressStats {
            header_bytes,
            payload_bytes,
            output_bytes,
        };
        log::debug!(
            "decompressed {} symbols, {}-byte frequencies, payload {} bytes into {} bytes",
            header.symbols().len(),
            header.width().bytes(),
            stats.payload_bytes,
            stats.output_bytes
        );
        Ok(stats)
    }
}

impl Compression for Huffman {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut archive = Vec::new();
        self.compress_stream(Cursor::new(data), &mut archive)?;
        Ok(archive)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut restored = Vec::new();
        self.decompress_stream(Cursor::new(data), &mut restored)?;
        Ok(restored)
    }
}

/// Compresses `input` into `output` with the default configuration.
///
/// # Example
///
/// ```
/// use hzip::compression::huffman::compress;
/// use std::io::Cursor;
///
/// let mut archive = Vec::new();
/// let stats = compress(Cursor::new(b"aab"), &mut archive).unwrap();
/// assert_eq!(archive, [3, 1, b'a', 2, 0, 1, b'b', 1, 0x2c]);
/// assert_eq!(stats.archive_bytes(), 9);
/// ```
pub fn compress<R: Read + Seek, W: Write>(input: R, output: W) -> Result<CompressStats> {
    Huffman::new().compress_stream(input, output)
}

/// Decompresses `input` into `output` with the default configuration.
pub fn decompress<R: Read + Seek, W: Write>(input: R, output: W) -> Result<DecompressStats> {
    Huffman::new().decompress_stream(input, output)
}
