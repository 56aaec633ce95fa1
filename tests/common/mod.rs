//! Shared helpers for the integration tests.
//!
//! The helpers only use the public API, so they double as a check that the
//! accessors expose enough to reconstruct and validate a tree.

#![allow(dead_code)]

use rand::{rngs::StdRng, Rng, SeedableRng};
use sprig::{Key, Node, Side, Stats, Tree};
use std::collections::HashSet;

/// The insertion sequence used throughout the crate's documentation.
pub const REFERENCE_KEYS: [Key; 6] = [12, 11, 90, 82, 7, 9];

/// Rendering of [`REFERENCE_KEYS`] for both tree variants.
pub const REFERENCE_TREE: &str = "ROOT[12(12)]
└── LEFT[11(11)]
│   ├── LEFT[7(7)]
│       └── RIGHT[9(9)]
└── RIGHT[90(90)]
    └── LEFT[82(82)]
";

/// Generate `count` distinct keys below `bound` using a seeded RNG.
pub fn unique_keys(count: usize, bound: Key, seed: u64) -> Vec<Key> {
	let mut rng = StdRng::seed_from_u64(seed);
	let mut seen = HashSet::with_capacity(count);
	let mut keys = Vec::with_capacity(count);
	while keys.len() < count {
		let key = rng.random_range(0..bound);
		if seen.insert(key) {
			keys.push(key);
		}
	}
	keys
}

/// Walks a per-node subtree and panics if ordering, depth or side links are
/// broken. Returns the keys in ascending (in-order) order.
pub fn assert_node_invariants<V>(root: &Node<V>) -> Vec<Key> {
	let mut keys = Vec::new();
	// (node, exclusive lower bound, exclusive upper bound)
	let mut pending: Vec<(&Node<V>, Option<Key>, Option<Key>)> = vec![(root, None, None)];
	while let Some((node, lower, upper)) = pending.pop() {
		if let Some(lower) = lower {
			assert!(node.key() > lower, "key {} should be above {}", node.key(), lower);
		}
		if let Some(upper) = upper {
			assert!(node.key() < upper, "key {} should be below {}", node.key(), upper);
		}
		if let Some(left) = node.left() {
			assert_eq!(left.side(), Side::Left, "wrong side on key {}", left.key());
			assert_eq!(left.depth(), node.depth() + 1, "wrong depth on key {}", left.key());
			pending.push((left, lower, Some(node.key())));
		}
		if let Some(right) = node.right() {
			assert_eq!(right.side(), Side::Right, "wrong side on key {}", right.key());
			assert_eq!(right.depth(), node.depth() + 1, "wrong depth on key {}", right.key());
			pending.push((right, Some(node.key()), upper));
		}
		keys.push(node.key());
	}
	keys.sort_unstable();
	keys
}

/// Computes a subtree's metadata from scratch by walking a per-node tree.
pub fn subtree_stats<V>(node: &Node<V>) -> Stats {
	let mut stats = Stats {
		count: 1,
		lowest_key: node.key(),
		highest_key: node.key(),
		depth_max: node.depth(),
		..Stats::default()
	};
	if let Some(left) = node.left() {
		let sub = subtree_stats(left);
		stats.count += sub.count;
		stats.count_left = sub.count;
		stats.depth_max_left = sub.depth_max;
		stats.lowest_key = sub.lowest_key;
		stats.depth_max = stats.depth_max.max(sub.depth_max);
	}
	if let Some(right) = node.right() {
		let sub = subtree_stats(right);
		stats.count += sub.count;
		stats.count_right = sub.count;
		stats.depth_max_right = sub.depth_max;
		stats.highest_key = sub.highest_key;
		stats.depth_max = stats.depth_max.max(sub.depth_max);
	}
	stats
}

/// Checks every node's incrementally maintained metadata in `tree` against a
/// per-node tree built from the same insertion sequence.
pub fn assert_metadata_matches<V>(tree: &Tree<V>, mirror: &Node<V>) {
	let mut pending = vec![mirror];
	while let Some(node) = pending.pop() {
		assert_eq!(
			tree.stats_of(node.key()),
			Some(subtree_stats(node)),
			"metadata mismatch under key {}",
			node.key()
		);
		pending.extend(node.left());
		pending.extend(node.right());
	}
	assert_eq!(tree.stats(), subtree_stats(mirror));
}

/// Pre-order (key, depth, side) listing of a whole-tree wrapper.
pub fn shape<V>(tree: &Tree<V>) -> Vec<(Key, usize, Side)> {
	let mut out = Vec::new();
	tree.for_each(|entry| {
		out.push((entry.key(), entry.depth(), entry.side()));
		true
	});
	out
}

/// Pre-order (key, depth, side) listing of a per-node tree.
pub fn node_shape<V>(root: &Node<V>) -> Vec<(Key, usize, Side)> {
	let mut out = Vec::new();
	let mut pending = vec![root];
	while let Some(node) = pending.pop() {
		out.push((node.key(), node.depth(), node.side()));
		pending.extend(node.right());
		pending.extend(node.left());
	}
	out
}
