//! Node alphabet and canonical node sets.
//!
//! Nodes are single upper-case letters. A system of `n` nodes uses the first
//! `n` letters of the Latin alphabet, and a node's position in that ordering
//! is its bit position in every joint-state encoding (position 0 is the most
//! significant bit).
//!
//! A [`NodeSet`] is always kept in alphabet order regardless of the order the
//! caller wrote it in, so `"CAB"` and `"ABC"` describe the same scope.

use std::fmt;

use smallvec::SmallVec;

use crate::engine::errors::ExecError;

/// Largest supported system (`A`..=`Z`).
pub const MAX_SYSTEM_SIZE: usize = 26;

/// Inline capacity for node lists; typical systems have at most 10 nodes.
const INLINE_NODES: usize = 16;

/// The fixed, ordered alphabet of a system with `size` binary nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alphabet {
    size: usize,
}

impl Alphabet {
    /// Creates the alphabet `A..` of the given size.
    pub fn new(size: usize) -> Result<Self, ExecError> {
        if size == 0 || size > MAX_SYSTEM_SIZE {
            return Err(ExecError::ValidationError(format!(
                "system size must be between 1 and {}, got {}",
                MAX_SYSTEM_SIZE, size
            )));
        }
        Ok(Self { size })
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Letter at `position`, if inside the alphabet.
    pub fn letter(&self, position: usize) -> Option<char> {
        (position < self.size).then(|| (b'A' + position as u8) as char)
    }

    /// Position of `node` in the alphabet.
    pub fn position(&self, node: char) -> Result<usize, ExecError> {
        if node.is_ascii_uppercase() {
            let pos = (node as u8 - b'A') as usize;
            if pos < self.size {
                return Ok(pos);
            }
        }
        Err(ExecError::unknown_node(node, self.to_string()))
    }

    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        (0..self.size).map(|p| (b'A' + p as u8) as char)
    }

    /// The node set holding every letter of the alphabet.
    pub fn full_set(&self) -> NodeSet {
        NodeSet(self.letters().collect())
    }

    /// Parses an unordered node string into a canonical node set.
    ///
    /// Duplicates collapse; any letter outside the alphabet is rejected.
    pub fn node_set(&self, nodes: &str) -> Result<NodeSet, ExecError> {
        let mut out: SmallVec<[char; INLINE_NODES]> = SmallVec::new();
        for node in nodes.chars().filter(|c| !c.is_whitespace()) {
            self.position(node)?;
            out.push(node);
        }
        out.sort_unstable();
        out.dedup();
        Ok(NodeSet(out))
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for letter in self.letters() {
            write!(f, "{}", letter)?;
        }
        Ok(())
    }
}

/// A set of nodes in canonical alphabet order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodeSet(SmallVec<[char; INLINE_NODES]>);

impl NodeSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, node: char) -> bool {
        self.0.binary_search(&node).is_ok()
    }

    /// Index of `node` within this set, which is its column and bit position
    /// in any matrix scoped to this set.
    pub fn position(&self, node: char) -> Option<usize> {
        self.0.binary_search(&node).ok()
    }

    /// Like [`position`](Self::position) but reports a missing node as an error.
    pub fn require(&self, node: char) -> Result<usize, ExecError> {
        self.position(node)
            .ok_or_else(|| ExecError::unknown_node(node, self.to_string()))
    }

    pub fn nodes(&self) -> &[char] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }

    /// True when every node of `self` is also in `other`.
    pub fn is_subset_of(&self, other: &NodeSet) -> bool {
        self.iter().all(|n| other.contains(n))
    }
}

impl fmt::Display for NodeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.0 {
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for NodeSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serialize")]
impl<'de> serde::Deserialize<'de> for NodeSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let alphabet = Alphabet::new(MAX_SYSTEM_SIZE).map_err(serde::de::Error::custom)?;
        alphabet.node_set(&raw).map_err(serde::de::Error::custom)
    }
}
