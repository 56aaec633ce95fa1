//! # Sprig: In-Memory Keyed Binary Search Trees
//!
//! This crate provides an unbalanced binary search tree keyed by unsigned
//! integers, in two flavours that share the same ordering rules and node
//! model but lock at different granularities.
//!
//! ## Design Overview
//!
//! **Per-node locking** ([`Node`]): every node owns a mutex. Walks lock one
//! node at a time on the way down, so readers and writers working in disjoint
//! subtrees proceed in parallel. Traversals ([`Node::search_func`],
//! [`Node::deepest_node`]) fork one scoped thread per child branch and join
//! before returning.
//!
//! **Whole-tree locking** ([`Tree`]): one reader/writer lock guards the whole
//! structure. In exchange for coarser concurrency, every node carries
//! aggregate metadata ([`Stats`]: counts, key bounds, depth maxima per
//! branch), maintained incrementally on insert. Lookups use the root's key
//! bounds to reject out-of-range keys without descending.
//!
//! ### Ordering
//!
//! ```text
//!               12              keys: 12, 11, 90, 82, 7, 9 (in that order)
//!             /    \
//!           11      90          left  < node < right
//!          /       /
//!         7      82             depth(root) = 0
//!          \                    depth(child) = depth(parent) + 1
//!           9
//! ```
//!
//! Inserting an existing key overwrites its value and never changes the shape.
//! There is no rebalancing and no deletion: insertion order alone decides the
//! shape, and sorted input degrades the tree into a list.
//!
//! ## Basic Usage
//!
//! ```
//! use sprig::{Node, Tree};
//!
//! // Per-node locking
//! let root = Node::<u64>::with_keys(&[12, 11, 90, 82, 7, 9]).unwrap();
//! assert_eq!(root.deepest_node().key(), 9);
//! assert!(root.get(82).is_some());
//!
//! // Whole-tree locking with metadata
//! let tree: Tree<u64> = Tree::with_keys(&[12, 11, 90, 82, 7, 9]);
//! assert_eq!(tree.count(), 6);
//! assert_eq!(tree.depth_max(), 3);
//!
//! print!("{}", tree.string_tree());
//! ```
//!
//! ## Thread Safety
//!
//! Both trees are `Send + Sync` when the value type is, and can be shared
//! across threads via `Arc`. Visitors passed to [`Node::search_func`] run
//! with the visited node locked; see its documentation for what they may
//! not call.

pub mod error;
pub mod node;
pub mod render;
pub mod side;
pub mod tree;

mod sync;

pub use error::{Error, Result};
pub use node::{Node, Visit};
pub use side::Side;
pub use tree::{Entry, Stats, Tree};

/// Key type shared by both tree variants.
pub type Key = u64;
