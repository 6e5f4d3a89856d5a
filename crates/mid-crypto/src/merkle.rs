//! # Binary Merkle Tree
//!
//! The tree both tiers are built on: identity trees over document
//! commitments, and the registry tree over root commitments.
//!
//! ## Algorithm
//!
//! - Level 0 is the ordered leaf sequence. Leaf order is significant and
//!   never changed.
//! - Level k+1 pairs adjacent nodes of level k left to right:
//!   `node = SHA256(left || right)`. There is no domain-separation prefix.
//! - An unpaired final node is paired with itself: `SHA256(x || x)`.
//! - Building stops when a level has exactly one node, the root.
//!
//! Proofs walk upward from the leaf index. An even index has its sibling at
//! `index + 1` on the RIGHT, an odd index at `index - 1` on the LEFT. When the
//! right sibling would be out of range the node itself is used, reproducing
//! the build-time padding. The next index is `index / 2`.
//!
//! Trees are rebuilt, never mutated, when the leaf set changes.

use std::fmt;
use std::str::FromStr;

use mid_core::{sha256_concat, DigestError, HashDigest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from tree construction and proof derivation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// A tree needs at least one leaf.
    #[error("cannot build a Merkle tree with no leaves")]
    EmptyInput,

    /// The requested leaf is not in the tree.
    #[error("leaf {0} not found in tree")]
    LeafNotFound(HashDigest),

    /// A leaf index past the end of level 0.
    #[error("leaf index {index} out of range for {len} leaves")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of leaves.
        len: usize,
    },

    /// A persisted tree does not have the shape of the tree rebuilt from
    /// its leaves.
    #[error("persisted tree has {actual} levels, rebuilt tree has {expected}")]
    LevelCountMismatch {
        /// Levels in the rebuilt tree.
        expected: usize,
        /// Levels in the persisted tree.
        actual: usize,
    },

    /// A persisted node disagrees with the rebuilt tree.
    #[error("persisted tree disagrees with rebuilt tree at level {level}, index {index}")]
    StructureMismatch {
        /// Level of the first disagreement.
        level: usize,
        /// Node index of the first disagreement.
        index: usize,
    },
}

// ---------------------------------------------------------------------------
// Proof steps
// ---------------------------------------------------------------------------

/// Which side of the running hash a sibling is concatenated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Sibling precedes: `H(sibling || current)`.
    Left,
    /// Sibling follows: `H(current || sibling)`.
    Right,
}

impl Side {
    /// Numeric wire form used by disclosure proofs: `1` for RIGHT, `0` for LEFT.
    pub fn as_index(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    /// Parse the numeric wire form.
    pub fn from_index(index: u8) -> Result<Self, DigestError> {
        match index {
            0 => Ok(Self::Left),
            1 => Ok(Self::Right),
            other => Err(DigestError::UnknownSide(other.to_string())),
        }
    }

    /// String wire form used by registry proofs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(DigestError::UnknownSide(other.to_string())),
        }
    }
}

/// One step of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofStep {
    /// The sibling digest at this level.
    pub sibling: HashDigest,
    /// Where the sibling goes relative to the running hash.
    pub side: Side,
}

/// Decode wire-form proof fields into proof steps.
///
/// Fails on malformed hex or when `elements` and `sides` differ in length.
pub fn decode_path<S: AsRef<str>>(
    elements: &[S],
    sides: &[Side],
) -> Result<Vec<ProofStep>, DigestError> {
    if elements.len() != sides.len() {
        return Err(DigestError::PathLengthMismatch {
            elements: elements.len(),
            sides: sides.len(),
        });
    }
    elements
        .iter()
        .zip(sides)
        .map(|(element, side)| {
            Ok(ProofStep {
                sibling: HashDigest::from_hex(element.as_ref())?,
                side: *side,
            })
        })
        .collect()
}

/// Split proof steps into wire-form sibling hex strings and sides.
pub fn encode_path(path: &[ProofStep]) -> (Vec<String>, Vec<Side>) {
    path.iter().map(|s| (s.sibling.to_hex(), s.side)).unzip()
}

// ---------------------------------------------------------------------------
// Hashing and folding
// ---------------------------------------------------------------------------

/// Parent of two nodes: `SHA256(left || right)`.
pub fn hash_pair(left: &HashDigest, right: &HashDigest) -> HashDigest {
    sha256_concat(&[left.as_bytes(), right.as_bytes()])
}

/// Fold a proof path starting from `leaf`, returning the computed apex.
pub fn fold_path(leaf: HashDigest, path: &[ProofStep]) -> HashDigest {
    path.iter().fold(leaf, |current, step| match step.side {
        Side::Left => hash_pair(&step.sibling, &current),
        Side::Right => hash_pair(&current, &step.sibling),
    })
}

/// Verify that folding `proof` from `leaf` reaches `expected_root`.
///
/// Pure and total: no I/O, no shared state, no errors.
pub fn verify(leaf: &HashDigest, proof: &[ProofStep], expected_root: &HashDigest) -> bool {
    fold_path(*leaf, proof) == *expected_root
}

fn next_level(level: &[HashDigest]) -> Vec<HashDigest> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_pair(left, right)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// MerkleTree
// ---------------------------------------------------------------------------

/// A fully materialised binary Merkle tree.
///
/// `levels[0]` holds the leaves, the last level holds only the root. Both
/// invariants are established by [`MerkleTree::build`] and cannot be broken
/// afterwards because the tree is immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    levels: Vec<Vec<HashDigest>>,
}

impl MerkleTree {
    /// Build a tree over an ordered, non-empty leaf sequence.
    pub fn build(leaves: Vec<HashDigest>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyInput);
        }
        let mut levels = vec![leaves];
        while let Some(level) = levels.last() {
            if level.len() == 1 {
                break;
            }
            let parent = next_level(level);
            levels.push(parent);
        }
        Ok(Self { levels })
    }

    /// Rebuild a tree from a persisted level list and check it node by node.
    ///
    /// The leaves (`levels[0]`) are authoritative. Any disagreement between
    /// the persisted upper levels and the rebuilt ones is reported as an
    /// error, never repaired.
    pub fn from_levels(levels: Vec<Vec<HashDigest>>) -> Result<Self, MerkleError> {
        let leaves = levels.first().cloned().ok_or(MerkleError::EmptyInput)?;
        let rebuilt = Self::build(leaves)?;

        if rebuilt.levels.len() != levels.len() {
            return Err(MerkleError::LevelCountMismatch {
                expected: rebuilt.levels.len(),
                actual: levels.len(),
            });
        }
        for (level_idx, (persisted, expected)) in levels.iter().zip(&rebuilt.levels).enumerate() {
            if persisted.len() != expected.len() {
                return Err(MerkleError::StructureMismatch {
                    level: level_idx,
                    index: persisted.len().min(expected.len()),
                });
            }
            if let Some(index) = persisted.iter().zip(expected).position(|(a, b)| a != b) {
                return Err(MerkleError::StructureMismatch {
                    level: level_idx,
                    index,
                });
            }
        }
        Ok(rebuilt)
    }

    /// The apex digest.
    pub fn root(&self) -> HashDigest {
        // The last level holds exactly one node by construction.
        self.levels[self.levels.len() - 1][0]
    }

    /// The ordered leaves.
    pub fn leaves(&self) -> &[HashDigest] {
        &self.levels[0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// All levels, leaves first.
    pub fn levels(&self) -> &[Vec<HashDigest>] {
        &self.levels
    }

    /// Index of the first leaf equal to `leaf`.
    pub fn index_of(&self, leaf: &HashDigest) -> Option<usize> {
        self.leaves().iter().position(|l| l == leaf)
    }

    /// Inclusion proof for `leaf`. With duplicate leaves the first
    /// occurrence is proven.
    pub fn prove(&self, leaf: &HashDigest) -> Result<Vec<ProofStep>, MerkleError> {
        let index = self
            .index_of(leaf)
            .ok_or(MerkleError::LeafNotFound(*leaf))?;
        self.prove_index(index)
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn prove_index(&self, index: usize) -> Result<Vec<ProofStep>, MerkleError> {
        let len = self.leaf_count();
        if index >= len {
            return Err(MerkleError::IndexOutOfRange { index, len });
        }

        let mut path = Vec::with_capacity(self.levels.len() - 1);
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let (sibling_idx, side) = if idx % 2 == 1 {
                (idx - 1, Side::Left)
            } else {
                (idx + 1, Side::Right)
            };
            let sibling = level.get(sibling_idx).copied().unwrap_or(level[idx]);
            path.push(ProofStep { sibling, side });
            idx /= 2;
        }
        Ok(path)
    }
}
