//! Bit packing and unpacking of the encoded payload.
//!
//! Codes are packed most significant bit first into a fixed-width accumulator
//! word. Full words go out most significant byte first, so the byte stream does
//! not depend on the word width. The last word is cut down to the bytes that
//! actually hold bits.

use crate::compression::Result;
use crate::error::Error;
use bitvec::prelude::*;
use std::io::{self, Read, Write};

use super::code::CompactCode;
use super::frequency::SENTINEL;
use super::tree::{HuffmanTree, NodeId, NodeKind};

/// Largest supported accumulator, in bytes.
pub const MAX_WORD_BYTES: usize = 8;

/// Rejects accumulator widths other than 1, 2, 4 or 8 bytes.
pub fn check_word_bytes(word_bytes: usize) -> Result<()> {
    if !matches!(word_bytes, 1 | 2 | 4 | 8) {
        return Err(Error::InvalidInput(format!(
            "word width must be 1, 2, 4 or 8 bytes, got {}",
            word_bytes
        )));
    }
    Ok(())
}

fn low_bits(n: u32) -> u64 {
    if n >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

/// Packs variable-length codes into words and writes them out.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    inner: W,
    /// Pending bits, left-aligned in the register.
    acc: u64,
    /// Unfilled bits left in the current word.
    free: u32,
    word_bits: u32,
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    /// Creates a writer flushing `word_bytes` (1, 2, 4 or 8) bytes per full word.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for any other width.
    pub fn new(inner: W, word_bytes: usize) -> Result<Self> {
        check_word_bytes(word_bytes)?;
        let word_bits = (word_bytes * 8) as u32;
        Ok(BitWriter {
            inner,
            acc: 0,
            free: word_bits,
            word_bits,
            bytes_written: 0,
        })
    }

    fn used(&self) -> u32 {
        self.word_bits - self.free
    }

    /// Appends the `length` low bits of `code`, splitting it across words when
    /// it does not fit in the current one.
    pub fn write_code(&mut self, code: CompactCode) -> io::Result<()> {
        let mut remaining = code.length as u32;
        while remaining > 0 {
            let take = remaining.min(self.free);
            let chunk = (code.code >> (remaining - take)) & low_bits(take);
            self.acc |= chunk << (u64::BITS - self.used() - take);
            self.free -= take;
            remaining -= take;
            if self.free == 0 {
                self.flush_word()?;
            }
        }
        Ok(())
    }

    fn flush_word(&mut self) -> io::Result<()> {
        let len = (self.word_bits / 8) as usize;
        self.inner.write_all(&self.acc.to_be_bytes()[..len])?;
        self.bytes_written += len as u64;
        self.acc = 0;
        self.free = self.word_bits;
        Ok(())
    }

    /// Writes the partly filled last word using only as many bytes as its bits
    /// need, flushes the sink and returns the payload size in bytes.
    pub fn finish(mut self) -> io::Result<u64> {
        let used = self.used();
        if used > 0 {
            let len = used.div_ceil(8) as usize;
            self.inner.write_all(&self.acc.to_be_bytes()[..len])?;
            self.bytes_written += len as u64;
        }
        self.inner.flush()?;
        Ok(self.bytes_written)
    }
}

/// Reads the payload back one word at a time.
#[derive(Debug)]
pub struct BitReader<R: Read> {
    inner: R,
    remaining: u64,
    word_bytes: usize,
}

impl<R: Read> BitReader<R> {
    /// Creates a reader over exactly `payload_len` bytes of `inner`, taking
    /// `word_bytes` (1, 2, 4 or 8) bytes per word.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for any other width.
    pub fn new(inner: R, payload_len: u64, word_bytes: usize) -> Result<Self> {
        check_word_bytes(word_bytes)?;
        Ok(BitReader {
            inner,
            remaining: payload_len,
            word_bytes,
        })
    }

    /// Returns the next word left-aligned in a `u64`, with the number of valid
    /// bits, or `None` once the payload is exhausted.
    pub fn next_word(&mut self) -> io::Result<Option<(u64, usize)>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let len = self.remaining.min(self.word_bytes as u64) as usize;
        let mut buf = [0u8; MAX_WORD_BYTES];
        self.inner.read_exact(&mut buf[..len])?;
        self.remaining -= len as u64;

        let word = buf[..len]
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | byte as u64);
        let bits = len * 8;
        Ok(Some((word << (u64::BITS as usize - bits), bits)))
    }
}

/// Walks a tree one bit at a time, restarting at the root after each leaf.
#[derive(Debug)]
pub struct TreeWalker<'t> {
    tree: &'t HuffmanTree,
    cursor: NodeId,
}

impl<'t> TreeWalker<'t> {
    pub fn new(tree: &'t HuffmanTree) -> Self {
        TreeWalker {
            tree,
            cursor: tree.root(),
        }
    }

    /// Follows one branch; returns the symbol when a leaf is reached.
    pub fn step(&mut self, bit: bool) -> Option<u8> {
        let next = match self.tree.node(self.cursor).kind {
            NodeKind::Internal { left, right } => {
                if bit {
                    right
                } else {
                    left
                }
            }
            NodeKind::Leaf { .. } => self.cursor,
        };
        match self.tree.node(next).kind {
            NodeKind::Leaf { symbol } => {
                self.cursor = self.tree.root();
                Some(symbol)
            }
            NodeKind::Internal { .. } => {
                self.cursor = next;
                None
            }
        }
    }
}

/// Decodes symbols from `reader` into `output` until the end-of-stream leaf.
///
/// Bits after the marker are ignored. Returns the number of bytes written.
///
/// # Errors
///
/// [`Error::Truncated`] if the payload runs out first; everything decoded up
/// to that point has already been written to `output`.
pub fn decode<R: Read, W: Write>(
    tree: &HuffmanTree,
    reader: &mut BitReader<R>,
    output: &mut W,
) -> Result<u64> {
    if let NodeKind::Leaf { symbol } = tree.node(tree.root()).kind {
        // One symbol means no bits at all; anything but the marker is corrupt.
        return if symbol == SENTINEL {
            Ok(0)
        } else {
            Err(Error::MalformedHeader(
                "single-symbol alphabet without end-of-stream marker".to_string(),
            ))
        };
    }

    let mut walker = TreeWalker::new(tree);
    let mut decoded = 0u64;
    loop {
        let (word, bits) = match reader.next_word() {
            Ok(Some(word)) => word,
            Ok(None) => return Err(Error::Truncated),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(Error::Truncated),
            Err(e) => return Err(e.into()),
        };
        for bit in word.view_bits::<Msb0>()[..bits].iter().by_vals() {
            if let Some(symbol) = walker.step(bit) {
                if symbol == SENTINEL {
                    return Ok(decoded);
                }
                output.write_all(&[symbol])?;
                decoded += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::huffman::code::CodeTable;
    use crate::compression::huffman::frequency::{FrequencyTable, SymbolFrequency};
    use std::io::Cursor;

    fn code(code: u64, length: u8) -> CompactCode {
        CompactCode { code, length }
    }

    fn pack(codes: &[CompactCode], word_bytes: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out, word_bytes).unwrap();
        for &c in codes {
            writer.write_code(c).unwrap();
        }
        let written = writer.finish().unwrap();
        assert_eq!(written as usize, out.len());
        out
    }

    #[test]
    fn test_packs_msb_first() {
        let codes = [code(0b0, 1), code(0b0, 1), code(0b10, 2), code(0b11, 2)];
        assert_eq!(pack(&codes, 8), vec![0x2c]);
    }

    #[test]
    fn test_ragged_flush_rounds_up_to_bytes() {
        // 9 bits -> 2 bytes, not a full 8-byte word.
        let out = pack(&[code(0b1_1111_1111, 9)], 8);
        assert_eq!(out, vec![0xff, 0x80]);
        assert!(pack(&[], 8).is_empty());
    }

    #[test]
    fn test_exact_word_fill() {
        let out = pack(&[code(0xdead_beef, 32), code(0x0123_4567, 32)], 8);
        assert_eq!(out, vec![0xde, 0xad, 0xbe, 0xef, 0x01, 0x23, 0x45, 0x67]);
    }

    #[test]
    fn test_code_split_across_words() {
        let out = pack(&[code(0b101, 3), code(u64::MAX, 64), code(0b1, 1)], 8);
        // 3 + 64 + 1 = 68 bits = 9 bytes.
        assert_eq!(out.len(), 9);
        assert_eq!(out[0], 0b1011_1111);
        assert!(out[1..8].iter().all(|&b| b == 0xff));
        assert_eq!(out[8], 0b1111_0000);
    }

    #[test]
    fn test_word_width_does_not_change_output() {
        let codes: Vec<CompactCode> = (1..=40u8)
            .map(|i| code((i as u64).wrapping_mul(0x9e37_79b9) & low_bits(i as u32), i))
            .collect();
        let reference = pack(&codes, 8);
        for word_bytes in [1, 2, 4] {
            assert_eq!(pack(&codes, word_bytes), reference);
        }
    }

    #[test]
    fn test_reader_left_aligns_short_word() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0xab, 0xcd];
        let mut reader =
            BitReader::new(Cursor::new(&data[..]), data.len() as u64, 8).unwrap();
        assert_eq!(
            reader.next_word().unwrap(),
            Some((0x1234_5678_9abc_def0, 64))
        );
        assert_eq!(
            reader.next_word().unwrap(),
            Some((0xabcd_0000_0000_0000, 16))
        );
        assert_eq!(reader.next_word().unwrap(), None);
    }

    #[test]
    fn test_reader_honours_payload_length() {
        let data = [0xff, 0xee, 0xdd];
        let mut reader = BitReader::new(Cursor::new(&data[..]), 2, 4).unwrap();
        assert_eq!(
            reader.next_word().unwrap(),
            Some((0xffee_0000_0000_0000, 16))
        );
        assert_eq!(reader.next_word().unwrap(), None);
    }

    fn tree_for(text: &[u8]) -> (HuffmanTree, CodeTable) {
        let symbols = FrequencyTable::from_bytes(text).unwrap().symbols();
        let tree = HuffmanTree::build(symbols).unwrap();
        let codes = CodeTable::from_tree(&tree).unwrap();
        (tree, codes)
    }

    fn encode(text: &[u8], codes: &CodeTable, word_bytes: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = BitWriter::new(&mut out, word_bytes).unwrap();
        for &b in text.iter().chain(std::iter::once(&SENTINEL)) {
            writer.write_code(codes.get(b).unwrap()).unwrap();
        }
        writer.finish().unwrap();
        out
    }

    #[test]
    fn test_walker_decodes_symbols() {
        let (tree, codes) = tree_for(b"aab");
        let mut walker = TreeWalker::new(&tree);
        let b = codes.get(b'b').unwrap();
        assert_eq!(walker.step((b.code >> 1) & 1 == 1), None);
        assert_eq!(walker.step(b.code & 1 == 1), Some(b'b'));
        assert_eq!(walker.step(false), Some(b'a'));
    }

    #[test]
    fn test_decode_stops_at_marker() {
        let text = b"mississippi river banks";
        let (tree, codes) = tree_for(text);
        let mut payload = encode(text, &codes, 8);
        // Trailing garbage after the marker must be ignored.
        payload.extend_from_slice(&[0xff, 0x00, 0xaa]);
        for word_bytes in [1, 2, 4, 8] {
            let mut reader =
                BitReader::new(Cursor::new(&payload), payload.len() as u64, word_bytes)
                    .unwrap();
            let mut out = Vec::new();
            let n = decode(&tree, &mut reader, &mut out).unwrap();
            assert_eq!(out, text);
            assert_eq!(n as usize, text.len());
        }
    }

    #[test]
    fn test_decode_truncated_keeps_prefix() {
        let text = b"a longer line of plain text to cut short";
        let (tree, codes) = tree_for(text);
        let payload = encode(text, &codes, 8);
        let cut = &payload[..payload.len() - 1];
        let mut reader = BitReader::new(Cursor::new(cut), cut.len() as u64, 8).unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            decode(&tree, &mut reader, &mut out),
            Err(Error::Truncated)
        ));
        assert!(text.starts_with(&out));
    }

    #[test]
    fn test_decode_single_leaf_tree() {
        let tree = HuffmanTree::build(vec![SymbolFrequency::new(SENTINEL, 1)]).unwrap();
        let mut reader = BitReader::new(Cursor::new(Vec::new()), 0, 8).unwrap();
        let mut out = Vec::new();
        assert_eq!(decode(&tree, &mut reader, &mut out).unwrap(), 0);
        assert!(out.is_empty());

        let tree = HuffmanTree::build(vec![SymbolFrequency::new(b'a', 3)]).unwrap();
        let mut reader = BitReader::new(Cursor::new(Vec::new()), 0, 8).unwrap();
        assert!(matches!(
            decode(&tree, &mut reader, &mut out),
            Err(Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_rejects_unsupported_word_width() {
        for word_bytes in [0, 3, 5, 16] {
            let mut out = Vec::new();
            assert!(matches!(
                BitWriter::new(&mut out, word_bytes),
                Err(Error::InvalidInput(_))
            ));
            let data = [1u8; 32];
            assert!(matches!(
                BitReader::new(Cursor::new(&data[..]), 32, word_bytes),
                Err(Error::InvalidInput(_))
            ));
        }
    }
}
