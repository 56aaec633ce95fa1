//! # Whole-Tree Locking Wrapper
//!
//! [`Tree`] guards an entire binary search tree with one reader/writer lock
//! and keeps aggregate metadata on every node, updated incrementally as
//! leaves are attached.
//!
//! ## Storage
//!
//! Nodes live in an index arena. Children are owned through their slot
//! indices and each node remembers its parent's index, which is only ever
//! used to walk back up and widen the ancestors' metadata after an insert.
//!
//! ```text
//! slots: [ 12 | 11 | 90 | 82 |  7 |  9 ]
//!          ^root
//!
//! 12 ─┬─ left  ─> 11 ─ left ─> 7 ─ right ─> 9
//!     └─ right ─> 90 ─ left ─> 82
//! ```
//!
//! Slot 0 is the root whenever the tree is non-empty. Slots are appended and
//! never removed: there is no deletion.

use std::fmt;

use tracing::trace;

use crate::node::label;
use crate::render::TextTree;
use crate::side::Side;
use crate::sync::RwLock;
use crate::Key;

const ROOT: usize = 0;

/// Aggregate metadata describing a subtree.
///
/// Every field is zero for an empty tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Stats {
	/// Nodes in the subtree, including its root.
	pub count: usize,
	/// Nodes in the left child's subtree.
	pub count_left: usize,
	/// Nodes in the right child's subtree.
	pub count_right: usize,
	/// Smallest key in the subtree.
	pub lowest_key: Key,
	/// Largest key in the subtree.
	pub highest_key: Key,
	/// Greatest depth reached by any node in the subtree.
	pub depth_max: usize,
	/// Greatest depth reached under the left child, or zero.
	pub depth_max_left: usize,
	/// Greatest depth reached under the right child, or zero.
	pub depth_max_right: usize,
}

impl Stats {
	fn leaf(key: Key, depth: usize) -> Self {
		Stats {
			count: 1,
			lowest_key: key,
			highest_key: key,
			depth_max: depth,
			..Stats::default()
		}
	}

	/// Returns `true` if `key` lies in `[lowest_key, highest_key]`.
	#[inline]
	pub fn covers(&self, key: Key) -> bool {
		self.count > 0 && key >= self.lowest_key && key <= self.highest_key
	}
}

/// A snapshot of one node, as returned by lookups on a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry<V> {
	key: Key,
	value: V,
	depth: usize,
	side: Side,
}

impl<V> Entry<V> {
	#[inline]
	pub fn key(&self) -> Key {
		self.key
	}

	#[inline]
	pub fn value(&self) -> &V {
		&self.value
	}

	#[inline]
	pub fn depth(&self) -> usize {
		self.depth
	}

	#[inline]
	pub fn side(&self) -> Side {
		self.side
	}

	pub fn into_value(self) -> V {
		self.value
	}
}

struct Slot<V> {
	key: Key,
	value: V,
	depth: usize,
	side: Side,
	parent: Option<usize>,
	left: Option<usize>,
	right: Option<usize>,
	stats: Stats,
}

impl<V> Slot<V> {
	fn entry(&self) -> Entry<&V> {
		Entry {
			key: self.key,
			value: &self.value,
			depth: self.depth,
			side: self.side,
		}
	}
}

impl<V> fmt::Debug for Slot<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Slot")
			.field("key", &self.key)
			.field("side", &self.side)
			.field("depth", &self.depth)
			.field("parent", &self.parent)
			.field("left", &self.left)
			.field("right", &self.right)
			.field("stats", &self.stats)
			.finish()
	}
}

struct Arena<V> {
	slots: Vec<Slot<V>>,
}

impl<V> Arena<V> {
	fn root(&self) -> Option<&Slot<V>> {
		self.slots.first()
	}

	fn stats(&self) -> Stats {
		self.root().map(|root| root.stats).unwrap_or_default()
	}

	/// Fast-fails on an empty tree or a key outside the root's key range.
	fn in_range(&self, key: Key) -> bool {
		self.root().is_some_and(|root| root.stats.covers(key))
	}

	fn find(&self, key: Key) -> Option<usize> {
		if !self.in_range(key) {
			return None;
		}
		let mut index = ROOT;
		loop {
			let slot = &self.slots[index];
			index = if slot.key == key {
				return Some(index);
			} else if key < slot.key {
				slot.left?
			} else {
				slot.right?
			};
		}
	}

	fn find_recurse(&self, key: Key) -> Option<usize> {
		if !self.in_range(key) {
			return None;
		}
		self.find_from(ROOT, key)
	}

	fn find_from(&self, index: usize, key: Key) -> Option<usize> {
		let slot = &self.slots[index];
		if slot.key == key {
			Some(index)
		} else if key < slot.key {
			self.find_from(slot.left?, key)
		} else {
			self.find_from(slot.right?, key)
		}
	}

	fn put(&mut self, key: Key, value: V) {
		if self.slots.is_empty() {
			self.push_root(key, value);
			return;
		}
		let mut index = ROOT;
		loop {
			let slot = &mut self.slots[index];
			if slot.key == key {
				slot.value = value;
				return;
			}
			let (side, next) = if key < slot.key {
				(Side::Left, slot.left)
			} else {
				(Side::Right, slot.right)
			};
			match next {
				Some(next) => index = next,
				None => {
					self.attach(index, side, key, value);
					return;
				}
			}
		}
	}

	fn put_recurse(&mut self, key: Key, value: V) {
		if self.slots.is_empty() {
			self.push_root(key, value);
		} else {
			self.put_at(ROOT, key, value);
		}
	}

	fn put_at(&mut self, index: usize, key: Key, value: V) {
		let slot = &mut self.slots[index];
		if slot.key == key {
			slot.value = value;
			return;
		}
		let (side, next) = if key < slot.key {
			(Side::Left, slot.left)
		} else {
			(Side::Right, slot.right)
		};
		match next {
			Some(next) => self.put_at(next, key, value),
			None => self.attach(index, side, key, value),
		}
	}

	fn push_root(&mut self, key: Key, value: V) {
		self.slots.push(Slot {
			key,
			value,
			depth: 0,
			side: Side::Root,
			parent: None,
			left: None,
			right: None,
			stats: Stats::leaf(key, 0),
		});
		trace!(key, "attached root");
	}

	/// Appends a leaf under `parent` and widens every ancestor's stats.
	fn attach(&mut self, parent: usize, side: Side, key: Key, value: V) {
		let depth = self.slots[parent].depth + 1;
		let index = self.slots.len();
		self.slots.push(Slot {
			key,
			value,
			depth,
			side,
			parent: Some(parent),
			left: None,
			right: None,
			stats: Stats::leaf(key, depth),
		});
		let link = &mut self.slots[parent];
		if side.is_left() {
			link.left = Some(index);
		} else {
			link.right = Some(index);
		}
		trace!(key, depth, %side, parent = link.key, "attached node");
		self.propagate(index);
	}

	fn propagate(&mut self, index: usize) {
		let (key, depth) = (self.slots[index].key, self.slots[index].depth);
		let mut child = index;
		while let Some(parent) = self.slots[child].parent {
			let side = self.slots[child].side;
			let stats = &mut self.slots[parent].stats;
			stats.count += 1;
			match side {
				Side::Left => {
					stats.count_left += 1;
					stats.depth_max_left = stats.depth_max_left.max(depth);
				}
				Side::Right => {
					stats.count_right += 1;
					stats.depth_max_right = stats.depth_max_right.max(depth);
				}
				Side::Root => {}
			}
			stats.depth_max = stats.depth_max.max(depth);
			stats.lowest_key = stats.lowest_key.min(key);
			stats.highest_key = stats.highest_key.max(key);
			child = parent;
		}
	}

	fn text_tree(&self, index: usize) -> TextTree
	where
		V: fmt::Display,
	{
		TextTree::build(index, |index| {
			let slot = &self.slots[index];
			let children = [slot.left, slot.right].into_iter().flatten().collect();
			(label(slot.side, slot.key, &slot.value), children)
		})
	}
}

/// A binary search tree guarded by a single reader/writer lock, with
/// per-node aggregate metadata.
///
/// Lookups and statistics take the read lock and may run concurrently with
/// each other; inserts take the write lock and are serialized.
///
/// # Example
///
/// ```
/// use sprig::Tree;
///
/// let tree: Tree<u64> = Tree::with_keys(&[12, 11, 90, 82, 7, 9]);
/// assert_eq!(tree.count(), 6);
/// assert_eq!((tree.count_left(), tree.count_right()), (3, 2));
/// assert_eq!((tree.lowest_key(), tree.highest_key()), (7, 90));
/// assert_eq!(tree.depth_max(), 3);
///
/// // Outside [7, 90]: answered from the root's bounds alone.
/// assert!(tree.get(100).is_none());
/// assert_eq!(tree.get(9).map(|e| e.depth()), Some(3));
/// ```
pub struct Tree<V> {
	arena: RwLock<Arena<V>>,
}

impl<V> Default for Tree<V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<V> Tree<V> {
	// -----------------------------------------------------------------------
	// Construction
	// -----------------------------------------------------------------------

	/// Creates an empty tree.
	pub fn new() -> Self {
		Tree {
			arena: RwLock::new(Arena {
				slots: Vec::new(),
			}),
		}
	}

	/// Builds a tree by inserting `keys` in order, each valued with its own key.
	///
	/// Insertion order decides the shape: the same keys in a different order
	/// give a different tree and different depth statistics.
	pub fn with_keys(keys: &[Key]) -> Self
	where
		V: From<Key>,
	{
		let tree = Tree::new();
		{
			let mut arena = tree.arena.write();
			for &key in keys {
				arena.put(key, V::from(key));
			}
		}
		tree
	}

	// -----------------------------------------------------------------------
	// Insertion
	// -----------------------------------------------------------------------

	/// Inserts `key`, or overwrites its value if it is already present.
	///
	/// Overwriting never touches the metadata: the shape is unchanged.
	pub fn put(&self, key: Key, value: V) {
		self.arena.write().put(key, value);
	}

	/// Recursive form of [`Tree::put`]. Produces the same shape.
	///
	/// Recursion depth equals the depth of the insertion point.
	pub fn put_recurse(&self, key: Key, value: V) {
		self.arena.write().put_recurse(key, value);
	}

	/// Inserts `key` valued with itself.
	pub fn put_key(&self, key: Key)
	where
		V: From<Key>,
	{
		self.put(key, V::from(key));
	}

	// -----------------------------------------------------------------------
	// Lookup
	// -----------------------------------------------------------------------

	/// Returns a snapshot of the node holding `key`.
	///
	/// Empty trees and keys outside the root's `[lowest, highest]` range are
	/// rejected without descending.
	pub fn get(&self, key: Key) -> Option<Entry<V>>
	where
		V: Clone,
	{
		let arena = self.arena.read();
		arena.find(key).map(|index| owned(arena.slots[index].entry()))
	}

	/// Recursive form of [`Tree::get`]; always agrees with it.
	///
	/// Recursion depth equals the depth of the target.
	pub fn get_recurse(&self, key: Key) -> Option<Entry<V>>
	where
		V: Clone,
	{
		let arena = self.arena.read();
		arena.find_recurse(key).map(|index| owned(arena.slots[index].entry()))
	}

	/// Runs `f` on the node holding `key` while the read lock is held.
	///
	/// ```
	/// use sprig::Tree;
	///
	/// let tree = Tree::new();
	/// tree.put(1, String::from("one"));
	/// assert_eq!(tree.lookup(1, |entry| entry.value().len()), Some(3));
	/// assert_eq!(tree.lookup(2, |entry| entry.value().len()), None);
	/// ```
	pub fn lookup<R, F>(&self, key: Key, f: F) -> Option<R>
	where
		F: FnOnce(&Entry<&V>) -> R,
	{
		let arena = self.arena.read();
		arena.find(key).map(|index| f(&arena.slots[index].entry()))
	}

	/// Returns `true` if `key` is present.
	pub fn contains_key(&self, key: Key) -> bool {
		self.arena.read().find(key).is_some()
	}

	// -----------------------------------------------------------------------
	// Metadata
	// -----------------------------------------------------------------------

	/// Metadata of the whole tree; all zero when empty.
	pub fn stats(&self) -> Stats {
		self.arena.read().stats()
	}

	/// Metadata of the subtree rooted at `key`, if present.
	pub fn stats_of(&self, key: Key) -> Option<Stats> {
		let arena = self.arena.read();
		arena.find(key).map(|index| arena.slots[index].stats)
	}

	pub fn is_empty(&self) -> bool {
		self.arena.read().slots.is_empty()
	}

	/// Total number of nodes.
	pub fn count(&self) -> usize {
		self.stats().count
	}

	/// Number of nodes in the root's left subtree.
	pub fn count_left(&self) -> usize {
		self.stats().count_left
	}

	/// Number of nodes in the root's right subtree.
	pub fn count_right(&self) -> usize {
		self.stats().count_right
	}

	/// Smallest key in the tree.
	pub fn lowest_key(&self) -> Key {
		self.stats().lowest_key
	}

	/// Largest key in the tree.
	pub fn highest_key(&self) -> Key {
		self.stats().highest_key
	}

	/// Depth of the deepest node.
	pub fn depth_max(&self) -> usize {
		self.stats().depth_max
	}

	/// Depth of the deepest node in the root's left subtree.
	pub fn depth_max_left(&self) -> usize {
		self.stats().depth_max_left
	}

	/// Depth of the deepest node in the root's right subtree.
	pub fn depth_max_right(&self) -> usize {
		self.stats().depth_max_right
	}

	// -----------------------------------------------------------------------
	// Traversal and Rendering
	// -----------------------------------------------------------------------

	/// Visits nodes in pre-order (node, left subtree, right subtree) until
	/// `visit` returns `false`.
	///
	/// The read lock is held for the whole walk, so `visit` must not insert
	/// into this tree.
	pub fn for_each<F>(&self, mut visit: F)
	where
		F: FnMut(&Entry<&V>) -> bool,
	{
		let arena = self.arena.read();
		if arena.slots.is_empty() {
			return;
		}
		let mut pending = vec![ROOT];
		while let Some(index) = pending.pop() {
			let slot = &arena.slots[index];
			if !visit(&slot.entry()) {
				return;
			}
			pending.extend(slot.right);
			pending.extend(slot.left);
		}
	}

	/// Renders the whole tree, one `SIDE[key(value)]` line per node.
	///
	/// An empty tree renders as the empty string.
	pub fn string_tree(&self) -> String
	where
		V: fmt::Display,
	{
		let arena = self.arena.read();
		if arena.slots.is_empty() {
			return String::new();
		}
		arena.text_tree(ROOT).print()
	}
}

fn owned<V: Clone>(entry: Entry<&V>) -> Entry<V> {
	Entry {
		key: entry.key,
		value: entry.value.clone(),
		depth: entry.depth,
		side: entry.side,
	}
}

impl<V> fmt::Debug for Tree<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Tree").field("stats", &self.stats()).finish()
	}
}
