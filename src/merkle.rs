//! Merkle tree over one-time signing leaves.
//!
//! Each leaf holds the address and expanded private key for one channel
//! index. Consecutive nodes pair up bottom-up; an unpaired node at the end
//! of a level promotes its address unchanged. The root address identifies
//! the whole window of keys, and a sibling path lets a reader rebuild it
//! from a single leaf.

use crate::curl::{Curl, HASH_LENGTH};
use crate::sign;
use crate::trits::Trit;
use zeroize::Zeroize;

struct Node {
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
    address: Vec<Trit>,
    key: Option<Vec<Trit>>,
    size: usize,
}

impl Drop for Node {
    fn drop(&mut self) {
        if let Some(key) = self.key.as_mut() {
            key.zeroize();
        }
    }
}

impl Node {
    fn leaf(seed: &[Trit], index: u64, security: u8) -> Node {
        let mut subseed = sign::subseed(seed, index);
        let key = sign::private_key(&subseed, security);
        let digest = sign::digest_from_subseed(&subseed, security);
        subseed.zeroize();
        Node {
            left: None,
            right: None,
            address: sign::address(&digest),
            key: Some(key),
            size: 1,
        }
    }

    fn parent(left: Node, right: Option<Node>) -> Node {
        match right {
            Some(right) => {
                let mut curl = Curl::default();
                curl.absorb(&left.address);
                curl.absorb(&right.address);
                let mut address = vec![0 as Trit; HASH_LENGTH];
                curl.squeeze(&mut address);
                Node {
                    size: left.size + right.size,
                    address,
                    left: Some(Box::new(left)),
                    right: Some(Box::new(right)),
                    key: None,
                }
            }
            None => Node {
                size: left.size,
                address: left.address.clone(),
                left: Some(Box::new(left)),
                right: None,
                key: None,
            },
        }
    }
}

/// The signing key of one leaf together with its sibling path.
pub struct Subtree {
    /// Expanded one-time private key of the selected leaf.
    pub key: Vec<Trit>,
    /// Sibling addresses, ordered from the leaf level towards the root.
    pub leaves: Vec<Vec<Trit>>,
}

impl Drop for Subtree {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// A window of one-time signing keys arranged as a Merkle tree.
pub struct MerkleTree {
    root: Node,
}

impl MerkleTree {
    /// Builds the tree for `count` leaves derived from `seed` starting at
    /// leaf index `start`.
    ///
    /// # Panics
    /// Panics when `count` is zero; channel validation keeps it positive.
    pub fn new(seed: &[Trit], start: u64, count: usize, security: u8) -> Self {
        assert!(count > 0, "a Merkle window holds at least one leaf");
        let mut row: Vec<Node> = (0..count)
            .map(|i| Node::leaf(seed, start + i as u64, security))
            .collect();
        loop {
            let mut paired = Vec::with_capacity((row.len() + 1) / 2);
            let mut nodes = row.into_iter();
            while let Some(left) = nodes.next() {
                paired.push(Node::parent(left, nodes.next()));
            }
            if paired.len() == 1 {
                return MerkleTree {
                    root: paired.pop().expect("paired holds exactly one node"),
                };
            }
            row = paired;
        }
    }

    /// The root address identifying this window.
    pub fn root(&self) -> &[Trit] {
        &self.root.address
    }

    /// Number of leaves in the window.
    pub fn count(&self) -> usize {
        self.root.size
    }

    /// Extracts the signing key and sibling path for the leaf at `index`.
    ///
    /// Indices at or past [`MerkleTree::count`] return an empty key and no
    /// usable path.
    pub fn subtree(&self, index: usize) -> Subtree {
        if self.root.size == 1 {
            let key = self
                .root
                .left
                .as_ref()
                .and_then(|leaf| leaf.key.clone())
                .unwrap_or_default();
            return Subtree {
                key,
                leaves: Vec::new(),
            };
        }
        let mut index = index;
        let mut leaves = Vec::new();
        let mut key = Vec::new();
        let mut node = Some(&self.root);
        while let Some(current) = node {
            let left = match current.left.as_deref() {
                Some(left) => left,
                None => {
                    key = current.key.clone().unwrap_or_default();
                    break;
                }
            };
            if index < left.size {
                leaves.push(match current.right.as_deref() {
                    Some(right) => right.address.clone(),
                    None => left.address.clone(),
                });
                node = Some(left);
            } else {
                leaves.push(left.address.clone());
                index -= left.size;
                node = current.right.as_deref();
            }
        }
        leaves.reverse();
        Subtree { key, leaves }
    }
}

/// Rebuilds a root address from a leaf address and its sibling path.
///
/// `siblings` is the concatenation of rate-sized sibling addresses ordered
/// from the leaf level up; `index` selects the absorb order at each level
/// through its bits.
pub fn root_from_siblings(address: &[Trit], siblings: &[Trit], index: usize) -> Vec<Trit> {
    let mut curl = Curl::default();
    let mut rate = address.to_vec();
    let mut cursor: usize = 1;
    for sibling in siblings.chunks(HASH_LENGTH) {
        curl.reset();
        if cursor & index == 0 {
            curl.absorb(&rate);
            curl.absorb(sibling);
        } else {
            curl.absorb(sibling);
            curl.absorb(&rate);
        }
        rate.copy_from_slice(curl.rate());
        cursor = cursor.wrapping_shl(1);
    }
    rate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_seed() -> Vec<Trit> {
        (0..HASH_LENGTH).map(|i| ((i * i) % 3) as Trit - 1).collect()
    }

    fn flatten(leaves: &[Vec<Trit>]) -> Vec<Trit> {
        leaves.iter().flatten().copied().collect()
    }

    #[test]
    fn roots_are_deterministic() {
        let seed = test_seed();
        let a = MerkleTree::new(&seed, 5, 2, 1);
        let b = MerkleTree::new(&seed, 5, 2, 1);
        assert_eq!(a.root(), b.root());
        assert_eq!(a.count(), 2);
    }

    #[test]
    fn windows_at_different_offsets_diverge() {
        let seed = test_seed();
        let a = MerkleTree::new(&seed, 0, 1, 1);
        let b = MerkleTree::new(&seed, 1, 1, 1);
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn single_leaf_window_has_empty_path() {
        let seed = test_seed();
        let tree = MerkleTree::new(&seed, 0, 1, 1);
        let subtree = tree.subtree(0);
        assert!(subtree.leaves.is_empty());
        assert_eq!(subtree.key.len(), sign::KEY_FRAGMENT_LENGTH);
        // With no siblings the leaf address is the root itself.
        let sub = sign::subseed(&seed, 0);
        let digest = sign::digest_from_subseed(&sub, 1);
        assert_eq!(sign::address(&digest), tree.root());
    }

    #[test]
    fn every_leaf_rebuilds_the_root() {
        let seed = test_seed();
        for &count in &[2usize, 4] {
            let tree = MerkleTree::new(&seed, 3, count, 1);
            for index in 0..count {
                let subtree = tree.subtree(index);
                let sub = sign::subseed(&seed, 3 + index as u64);
                let leaf_address = sign::address(&sign::digest_from_subseed(&sub, 1));
                let rebuilt =
                    root_from_siblings(&leaf_address, &flatten(&subtree.leaves), index);
                assert_eq!(rebuilt, tree.root(), "leaf {} of {}", index, count);
            }
        }
    }

    #[test]
    fn wrong_index_misses_the_root() {
        let seed = test_seed();
        let tree = MerkleTree::new(&seed, 0, 4, 1);
        let subtree = tree.subtree(2);
        let sub = sign::subseed(&seed, 2);
        let leaf_address = sign::address(&sign::digest_from_subseed(&sub, 1));
        let rebuilt = root_from_siblings(&leaf_address, &flatten(&subtree.leaves), 3);
        assert_ne!(rebuilt, tree.root());
    }

    #[test]
    fn orphan_levels_promote_addresses() {
        let seed = test_seed();
        let pair = MerkleTree::new(&seed, 0, 2, 1);
        let triple = MerkleTree::new(&seed, 0, 3, 1);
        // With three leaves the third is promoted unchanged, so the root is
        // the hash of the first pair's root and the third leaf's address.
        let third = sign::address(&sign::digest_from_subseed(&sign::subseed(&seed, 2), 1));
        let mut curl = Curl::default();
        curl.absorb(pair.root());
        curl.absorb(&third);
        assert_eq!(triple.root(), curl.rate());
    }
}
