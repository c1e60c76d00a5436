//! Code assignment.
//!
//! Codes are read straight off the tree by walking from the root, so the bits
//! come out in transmission order and no reversal is needed.

use crate::compression::Result;
use crate::error::Error;

use super::frequency::ALPHABET_SIZE;
use super::tree::{HuffmanTree, NodeId, NodeKind};

/// Widest code that fits in a code register.
pub const MAX_CODE_LEN: usize = u64::BITS as usize;

/// A prefix code: the low `length` bits of `code`, read most significant bit
/// first, spell the root-to-leaf path (0 = left, 1 = right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompactCode {
    pub code: u64,
    pub length: u8,
}

/// Code for every symbol present in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Option<CompactCode>; ALPHABET_SIZE],
}

impl CodeTable {
    /// Assigns a code to every leaf of `tree`.
    ///
    /// The only leaf of a one-symbol tree gets the empty code.
    ///
    /// # Errors
    ///
    /// [`Error::CodeOverflow`] if a leaf is more than 64 levels deep, and
    /// [`Error::InvalidSymbol`] if a leaf holds a symbol outside the 7-bit range.
    pub fn from_tree(tree: &HuffmanTree) -> Result<Self> {
        let mut codes = [None; ALPHABET_SIZE];
        let mut stack: Vec<(NodeId, u64, usize)> = vec![(tree.root(), 0, 0)];

        while let Some((id, code, depth)) = stack.pop() {
            match tree.node(id).kind {
                NodeKind::Leaf { symbol } => {
                    if depth > MAX_CODE_LEN {
                        return Err(Error::CodeOverflow {
                            symbol,
                            length: depth,
                        });
                    }
                    let slot = codes
                        .get_mut(symbol as usize)
                        .ok_or(Error::InvalidSymbol(symbol))?;
                    *slot = Some(CompactCode {
                        code,
                        length: depth as u8,
                    });
                }
                NodeKind::Internal { left, right } => {
                    // Past the register width the code bits are garbage, but
                    // the leaf below reports the overflow before they are used.
                    stack.push((right, (code << 1) | 1, depth + 1));
                    stack.push((left, code << 1, depth + 1));
                }
            }
        }

        let table = CodeTable { codes };
        log::trace!("assigned codes: {:?}", table.iter().collect::<Vec<_>>());
        Ok(table)
    }

    /// Code for `symbol`, `None` if the symbol is not in the tree.
    pub fn get(&self, symbol: u8) -> Option<CompactCode> {
        self.codes.get(symbol as usize).copied().flatten()
    }

    /// Assigned codes in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, CompactCode)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.map(|c| (symbol as u8, c)))
    }
}
