//! Prefix tree construction.
//!
//! Symbols are sorted by descending frequency and merged with the two-queue
//! optimal-merge algorithm: leaves are consumed from the low-frequency end of
//! the sorted array, and merged subtrees queue up in the order they are
//! created, which is also non-decreasing frequency order. Each step takes the
//! two lightest items from the two queue heads, so the whole build is linear
//! once the array is sorted and needs no heap.
//!
//! Compression and decompression both build from a frequency list alone, so
//! every ordering decision below is fixed:
//! - the array is sorted by frequency descending, then symbol ascending;
//! - a leaf wins over a subtree of equal frequency;
//! - the first item taken becomes the left ("0") child.

use crate::compression::Result;
use crate::error::Error;
use std::cmp::Reverse;
use std::collections::VecDeque;

use super::frequency::SymbolFrequency;

/// Largest alphabet whose size fits in the one-byte header count.
pub const MAX_SYMBOLS: usize = u8::MAX as usize;

/// Index of a node in the tree arena.
pub type NodeId = usize;

/// Leaf or internal payload of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf { symbol: u8 },
    Internal { left: NodeId, right: NodeId },
}

/// A node in the tree arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Sum of the frequencies of every leaf below this node.
    pub freq: u64,
    /// Non-owning link to the parent, `None` for the root.
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// Orders symbols the way both sides of the codec expect them.
pub fn sort_symbols(symbols: &mut [SymbolFrequency]) {
    symbols.sort_unstable_by_key(|s| (Reverse(s.frequency), s.symbol));
}

/// A strictly binary prefix tree stored in an arena.
///
/// Leaves occupy ids `0..leaf_count()` in sorted order; internal nodes follow
/// in creation order. A one-symbol tree has no internal nodes and its root is
/// the only leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    leaf_count: usize,
    root: NodeId,
}

impl HuffmanTree {
    /// Sorts `symbols` and builds the tree.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyAlphabet`] if `symbols` is empty and
    /// [`Error::AlphabetTooLarge`] if it holds more than 255 entries.
    pub fn build(mut symbols: Vec<SymbolFrequency>) -> Result<Self> {
        sort_symbols(&mut symbols);
        Self::from_sorted(&symbols)
    }

    /// Builds the tree from symbols already in [`sort_symbols`] order.
    pub fn from_sorted(symbols: &[SymbolFrequency]) -> Result<Self> {
        if symbols.is_empty() {
            return Err(Error::EmptyAlphabet);
        }
        if symbols.len() > MAX_SYMBOLS {
            return Err(Error::AlphabetTooLarge(symbols.len()));
        }

        let leaf_count = symbols.len();
        let mut nodes: Vec<Node> = Vec::with_capacity(2 * leaf_count - 1);
        nodes.extend(symbols.iter().map(|s| Node {
            freq: s.frequency,
            parent: None,
            kind: NodeKind::Leaf { symbol: s.symbol },
        }));

        let mut tree = HuffmanTree {
            nodes,
            leaf_count,
            root: 0,
        };
        if leaf_count == 1 {
            return Ok(tree);
        }

        // Leaves still to merge are `0..next_leaf`; the lightest is at the end.
        let mut next_leaf = leaf_count;
        let mut subtrees: VecDeque<NodeId> = VecDeque::new();
        while let Some(left) = tree.take_lightest(&mut next_leaf, &mut subtrees) {
            let Some(right) = tree.take_lightest(&mut next_leaf, &mut subtrees) else {
                tree.root = left;
                break;
            };
            subtrees.push_back(tree.join(left, right));
        }
        Ok(tree)
    }

    /// Removes the lighter of the two queue heads, `None` once both are empty.
    fn take_lightest(
        &self,
        next_leaf: &mut usize,
        subtrees: &mut VecDeque<NodeId>,
    ) -> Option<NodeId> {
        let leaf = next_leaf.checked_sub(1);
        match (leaf, subtrees.front()) {
            (Some(leaf), Some(&sub)) if self.nodes[sub].freq < self.nodes[leaf].freq => {
                subtrees.pop_front()
            }
            (Some(leaf), _) => {
                *next_leaf = leaf;
                Some(leaf)
            }
            (None, _) => subtrees.pop_front(),
        }
    }

    fn join(&mut self, left: NodeId, right: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            // Only a forged header can reach the top of the range.
            freq: self.nodes[left].freq.saturating_add(self.nodes[right].freq),
            parent: None,
            kind: NodeKind::Internal { left, right },
        });
        self.nodes[left].parent = Some(id);
        self.nodes[right].parent = Some(id);
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Number of distinct symbols.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Leaves in the sorted order the tree was built from.
    pub fn leaves(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes[..self.leaf_count].iter().enumerate()
    }

    /// Symbol and frequency of every leaf, in build order.
    pub fn symbols(&self) -> Vec<SymbolFrequency> {
        self.leaves()
            .filter_map(|(_, node)| match node.kind {
                NodeKind::Leaf { symbol } => Some(SymbolFrequency::new(symbol, node.freq)),
                NodeKind::Internal { .. } => None,
            })
            .collect()
    }

    /// Frequency of the root: the sum of all leaf frequencies.
    pub fn total_frequency(&self) -> u64 {
        self.nodes[self.root].freq
    }

    /// Root-to-leaf path of `leaf` found by following parent links upward
    /// (`false` = left, `true` = right).
    pub fn path(&self, leaf: NodeId) -> Vec<bool> {
        let mut path = Vec::new();
        let mut current = leaf;
        while let Some(parent) = self.nodes[current].parent {
            let is_right = matches!(
                self.nodes[parent].kind,
                NodeKind::Internal { right, .. } if right == current
            );
            path.push(is_right);
            current = parent;
        }
        path.reverse();
        path
    }
}
