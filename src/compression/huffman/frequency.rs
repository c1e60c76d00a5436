//! Symbol frequency collection.
//!
//! The scanner reads the source once and counts every 7-bit symbol. Symbol 0
//! never occurs in text, so it is reserved as the end-of-stream marker and
//! always counted once.

use crate::compression::Result;
use crate::error::Error;
use std::io::{ErrorKind, Read};

/// Number of symbols in the 7-bit alphabet.
pub const ALPHABET_SIZE: usize = 128;

/// The reserved end-of-stream symbol.
pub const SENTINEL: u8 = 0;

const SCAN_CHUNK: usize = 4096;

/// A symbol together with its occurrence count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolFrequency {
    pub symbol: u8,
    pub frequency: u64,
}

impl SymbolFrequency {
    pub fn new(symbol: u8, frequency: u64) -> Self {
        SymbolFrequency { symbol, frequency }
    }
}

/// Occurrence counts for every symbol in the 7-bit alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; ALPHABET_SIZE],
    input_bytes: u64,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencyTable {
    /// Creates a table holding only the end-of-stream marker.
    pub fn new() -> Self {
        let mut counts = [0; ALPHABET_SIZE];
        counts[SENTINEL as usize] = 1;
        FrequencyTable {
            counts,
            input_bytes: 0,
        }
    }

    /// Counts every byte of `reader` until end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSymbol`] on the first byte outside `1..=127`,
    /// or [`Error::Io`] if the reader fails.
    pub fn scan<R: Read>(mut reader: R) -> Result<Self> {
        let mut table = Self::new();
        let mut buf = [0u8; SCAN_CHUNK];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            table.record_all(&buf[..n])?;
        }
        log::trace!("frequency table: {:?}", table);
        Ok(table)
    }

    /// Counts every byte of an in-memory buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut table = Self::new();
        table.record_all(data)?;
        Ok(table)
    }

    fn record_all(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            if byte == SENTINEL || byte as usize >= ALPHABET_SIZE {
                return Err(Error::InvalidSymbol(byte));
            }
            self.counts[byte as usize] += 1;
        }
        self.input_bytes += data.len() as u64;
        Ok(())
    }

    /// Returns the stored count for `symbol`, including the marker's reserved occurrence.
    pub fn count(&self, symbol: u8) -> u64 {
        self.counts.get(symbol as usize).copied().unwrap_or(0)
    }

    /// Number of source bytes counted.
    pub fn input_bytes(&self) -> u64 {
        self.input_bytes
    }

    /// Returns the symbols with a non-zero count, unordered.
    ///
    /// The marker is always present, so the result is never empty.
    pub fn symbols(&self) -> Vec<SymbolFrequency> {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(symbol, &count)| SymbolFrequency::new(symbol as u8, count))
            .collect()
    }
}
