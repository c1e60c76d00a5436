//! Archive header: the alphabet and its frequencies.
//!
//! ```text
//! offset 0          symbol count N (1..=255)
//! offset 1          frequency width F in bytes (1, 2, 4 or 8)
//! offset 2          N x (symbol: i8, frequency: F bytes little-endian)
//! offset 2+N(1+F)   packed bitstream, to end of file
//! ```
//!
//! No codes are stored. The reader rebuilds the tree from the frequencies.

use crate::compression::Result;
use crate::error::Error;
use std::io::{self, Read, Write};

use super::frequency::{SymbolFrequency, ALPHABET_SIZE, SENTINEL};
use super::tree::{sort_symbols, MAX_SYMBOLS};

/// Size of the fixed part of the header.
const PREAMBLE_LEN: usize = 2;

/// Byte width of every stored frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyWidth {
    U8 = 1,
    U16 = 2,
    U32 = 4,
    U64 = 8,
}

impl FrequencyWidth {
    /// Smallest width that can hold `max`.
    pub fn for_max(max: u64) -> Self {
        if max <= u8::MAX as u64 {
            FrequencyWidth::U8
        } else if max <= u16::MAX as u64 {
            FrequencyWidth::U16
        } else if max <= u32::MAX as u64 {
            FrequencyWidth::U32
        } else {
            FrequencyWidth::U64
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(FrequencyWidth::U8),
            2 => Some(FrequencyWidth::U16),
            4 => Some(FrequencyWidth::U32),
            8 => Some(FrequencyWidth::U64),
            _ => None,
        }
    }

    pub fn bytes(self) -> usize {
        self as usize
    }
}

/// The alphabet of an archive in tree-building order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    symbols: Vec<SymbolFrequency>,
    width: FrequencyWidth,
}

impl Header {
    /// Sorts `symbols` and picks the frequency width from the most frequent one.
    pub fn new(mut symbols: Vec<SymbolFrequency>) -> Result<Self> {
        if symbols.is_empty() {
            return Err(Error::EmptyAlphabet);
        }
        if symbols.len() > MAX_SYMBOLS {
            return Err(Error::AlphabetTooLarge(symbols.len()));
        }
        sort_symbols(&mut symbols);
        let width = FrequencyWidth::for_max(symbols[0].frequency);
        Ok(Header { symbols, width })
    }

    pub fn symbols(&self) -> &[SymbolFrequency] {
        &self.symbols
    }

    pub fn width(&self) -> FrequencyWidth {
        self.width
    }

    /// Number of bytes the header occupies on disk.
    pub fn encoded_len(&self) -> usize {
        PREAMBLE_LEN + self.symbols.len() * (1 + self.width.bytes())
    }

    /// Serializes the header and returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let width = self.width.bytes();
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(self.symbols.len() as u8);
        buf.push(width as u8);
        for entry in &self.symbols {
            buf.push(entry.symbol);
            buf.extend_from_slice(&entry.frequency.to_le_bytes()[..width]);
        }
        writer.write_all(&buf)?;
        Ok(buf.len())
    }

    /// Parses a header and validates it.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedHeader`] if the header is truncated, declares zero
    /// symbols or an unsupported width, holds a symbol outside `0..=127`,
    /// repeats a symbol, stores a zero frequency, or lacks the end-of-stream
    /// marker.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut preamble = [0u8; PREAMBLE_LEN];
        read_section(reader, &mut preamble, "preamble")?;
        let [count, width_byte] = preamble;

        if count == 0 {
            return Err(Error::MalformedHeader("symbol count is zero".to_string()));
        }
        let width = FrequencyWidth::from_byte(width_byte).ok_or_else(|| {
            Error::MalformedHeader(format!("unsupported frequency width {}", width_byte))
        })?;

        let entry_len = 1 + width.bytes();
        let mut table = vec![0u8; count as usize * entry_len];
        read_section(reader, &mut table, "symbol table")?;

        let mut seen = [false; ALPHABET_SIZE];
        let mut symbols = Vec::with_capacity(count as usize);
        for entry in table.chunks_exact(entry_len) {
            let signed = entry[0] as i8;
            if signed < 0 {
                return Err(Error::MalformedHeader(format!(
                    "symbol {:#04x} is outside the 7-bit range",
                    entry[0]
                )));
            }
            let symbol = signed as u8;
            if std::mem::replace(&mut seen[symbol as usize], true) {
                return Err(Error::MalformedHeader(format!(
                    "symbol {:#04x} listed twice",
                    symbol
                )));
            }

            let mut freq = [0u8; 8];
            freq[..width.bytes()].copy_from_slice(&entry[1..]);
            let frequency = u64::from_le_bytes(freq);
            if frequency == 0 {
                return Err(Error::MalformedHeader(format!(
                    "symbol {:#04x} has zero frequency",
                    symbol
                )));
            }
            symbols.push(SymbolFrequency::new(symbol, frequency));
        }

        if !seen[SENTINEL as usize] {
            return Err(Error::MalformedHeader(
                "end-of-stream marker missing from alphabet".to_string(),
            ));
        }

        sort_symbols(&mut symbols);
        Ok(Header { symbols, width })
    }
}

fn read_section<R: Read>(reader: &mut R, buf: &mut [u8], section: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::MalformedHeader(format!("truncated {}", section)),
        _ => Error::Io(e),
    })
}
