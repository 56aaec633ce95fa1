//! # Per-Node Locking Tree
//!
//! A [`Node`] is both a tree position and the root of its own subtree. Every
//! node carries its own mutex, so writers and readers working on disjoint
//! subtrees never contend.
//!
//! ## Locking Discipline
//!
//! ```text
//!            ┌──────────────┐
//!            │ key, depth,  │  <- immutable after creation, read without locking
//!            │ side         │
//!            ├──────────────┤
//!            │ Mutex<V>     │  <- guards the value and serializes child attachment
//!            ├──────┬───────┤
//!            │ left │ right │  <- OnceLock: vacant -> occupied exactly once
//!            └──┬───┴───┬───┘
//!               ▼       ▼
//!             Node     Node
//! ```
//!
//! Locks are only ever taken top-down. The recursive variants hold an
//! ancestor's lock while locking a descendant, but never the other way round,
//! so lock ordering cannot invert. Traversals lock one node at a time and keep
//! their pending nodes on a heap stack, so list-shaped trees don't exhaust the
//! thread stack.
//!
//! A child slot is only filled while the parent's lock is held, and a filled
//! slot is never emptied, which is what lets accessors hand out plain
//! references to children.

use std::fmt;
use std::sync::OnceLock;
use std::thread;

use tracing::{debug, trace};

use crate::render::TextTree;
use crate::side::Side;
use crate::sync::{AtomicBool, Mutex, Ordering};
use crate::Key;

type Child<V> = OnceLock<Box<Node<V>>>;

/// A node in a per-node locking binary search tree.
///
/// The node returned by one of the constructors is the tree's root; every
/// other node is reached through [`Node::get`], [`Node::left`],
/// [`Node::right`] or a traversal.
pub struct Node<V> {
	key: Key,
	depth: usize,
	side: Side,
	value: Mutex<V>,
	left: Child<V>,
	right: Child<V>,
}

/// The view of a node handed to a [`Node::search_func`] visitor.
///
/// The node's lock is held while the visitor runs, so the value is exposed
/// directly. Calling a locking accessor on [`Visit::node`] (`value`,
/// `with_value`, `left`, `right`, `get`, `put`, ...) from inside the visitor
/// deadlocks.
pub struct Visit<'a, V> {
	node: &'a Node<V>,
	value: &'a V,
}

impl<'a, V> Visit<'a, V> {
	#[inline]
	pub fn key(&self) -> Key {
		self.node.key
	}

	#[inline]
	pub fn depth(&self) -> usize {
		self.node.depth
	}

	#[inline]
	pub fn side(&self) -> Side {
		self.node.side
	}

	/// The node's value, read under the lock the traversal already holds.
	#[inline]
	pub fn value(&self) -> &'a V {
		self.value
	}

	/// The visited node. Only its lock-free accessors are safe to call here.
	#[inline]
	pub fn node(&self) -> &'a Node<V> {
		self.node
	}
}

impl<V> Node<V> {
	// -----------------------------------------------------------------------
	// Construction
	// -----------------------------------------------------------------------

	/// Creates a root node.
	///
	/// # Example
	///
	/// ```
	/// use sprig::{Node, Side};
	///
	/// let root = Node::new(12, "twelve");
	/// assert_eq!(root.key(), 12);
	/// assert_eq!(root.depth(), 0);
	/// assert_eq!(root.side(), Side::Root);
	/// ```
	pub fn new(key: Key, value: V) -> Self {
		Node::attached(key, value, 0, Side::Root)
	}

	/// Creates a root node whose value is its own key.
	pub fn with_key(key: Key) -> Self
	where
		V: From<Key>,
	{
		Node::new(key, V::from(key))
	}

	/// Builds a tree by inserting `keys` in order, each valued with its own key.
	///
	/// The first key becomes the root. Returns `None` for an empty slice.
	///
	/// ```
	/// use sprig::Node;
	///
	/// let root = Node::<u64>::with_keys(&[12, 11, 90]).unwrap();
	/// assert_eq!(root.key(), 12);
	/// assert_eq!(root.count(), 3);
	/// assert!(Node::<u64>::with_keys(&[]).is_none());
	/// ```
	pub fn with_keys(keys: &[Key]) -> Option<Self>
	where
		V: From<Key>,
	{
		let (first, rest) = keys.split_first()?;
		let root = Node::with_key(*first);
		for &key in rest {
			root.put_key(key);
		}
		Some(root)
	}

	fn attached(key: Key, value: V, depth: usize, side: Side) -> Self {
		Node {
			key,
			depth,
			side,
			value: Mutex::new(value),
			left: OnceLock::new(),
			right: OnceLock::new(),
		}
	}

	// -----------------------------------------------------------------------
	// Accessors
	// -----------------------------------------------------------------------

	#[inline]
	pub fn key(&self) -> Key {
		self.key
	}

	/// Distance from the root of the tree this node was inserted into.
	#[inline]
	pub fn depth(&self) -> usize {
		self.depth
	}

	#[inline]
	pub fn side(&self) -> Side {
		self.side
	}

	/// Returns a copy of the value, taken under the node's lock.
	pub fn value(&self) -> V
	where
		V: Clone,
	{
		self.value.lock().clone()
	}

	/// Runs `f` against the value while holding the node's lock.
	pub fn with_value<R>(&self, f: impl FnOnce(&V) -> R) -> R {
		f(&self.value.lock())
	}

	/// The left child, if one has been attached.
	pub fn left(&self) -> Option<&Node<V>> {
		let _guard = self.value.lock();
		self.left.get().map(Box::as_ref)
	}

	/// The right child, if one has been attached.
	pub fn right(&self) -> Option<&Node<V>> {
		let _guard = self.value.lock();
		self.right.get().map(Box::as_ref)
	}

	/// Returns `true` if the node has no children.
	pub fn is_leaf(&self) -> bool {
		self.left().is_none() && self.right().is_none()
	}

	/// The smallest key in this subtree.
	pub fn smallest_key(&self) -> Key {
		let mut node = self;
		while let Some(left) = node.left() {
			node = left;
		}
		node.key
	}

	/// The largest key in this subtree.
	pub fn largest_key(&self) -> Key {
		let mut node = self;
		while let Some(right) = node.right() {
			node = right;
		}
		node.key
	}

	/// Number of nodes in this subtree, including this one.
	///
	/// The per-node variant keeps no aggregates, so this walks the subtree.
	pub fn count(&self) -> usize {
		let mut total = 0;
		let mut pending = vec![self];
		while let Some(node) = pending.pop() {
			total += 1;
			pending.extend(node.left());
			pending.extend(node.right());
		}
		total
	}

	// -----------------------------------------------------------------------
	// Lookup
	// -----------------------------------------------------------------------

	/// Finds the node holding `key` by walking down from this node.
	///
	/// Each node's lock is released before its child is locked.
	pub fn get(&self, key: Key) -> Option<&Node<V>> {
		let mut node = self;
		loop {
			let next = {
				let _guard = node.value.lock();
				if node.key == key {
					return Some(node);
				} else if key < node.key {
					node.left.get().map(Box::as_ref)
				} else {
					node.right.get().map(Box::as_ref)
				}
			};
			node = next?;
		}
	}

	/// Recursive form of [`Node::get`]; holds each lock on the path while descending.
	///
	/// Recursion depth equals the depth of the target, so prefer [`Node::get`]
	/// on degenerate trees.
	pub fn get_recurse(&self, key: Key) -> Option<&Node<V>> {
		let _guard = self.value.lock();
		if self.key == key {
			Some(self)
		} else if key < self.key {
			self.left.get()?.get_recurse(key)
		} else {
			self.right.get()?.get_recurse(key)
		}
	}

	// -----------------------------------------------------------------------
	// Insertion
	// -----------------------------------------------------------------------

	/// Inserts `key`, or overwrites its value if it is already present.
	///
	/// New nodes are attached as leaves; nothing is ever rebalanced, so the
	/// insertion order decides the shape of the tree.
	///
	/// ```
	/// use sprig::Node;
	///
	/// let root = Node::new(10, "ten");
	/// root.put(5, "five");
	/// root.put(5, "cinq");
	/// assert_eq!(root.get(5).map(|n| n.value()), Some("cinq"));
	/// assert_eq!(root.count(), 2);
	/// ```
	pub fn put(&self, key: Key, value: V) {
		let mut node = self;
		loop {
			let mut guard = node.value.lock();
			let next = if node.key == key {
				*guard = value;
				return;
			} else if key < node.key {
				match node.left.get() {
					Some(child) => &**child,
					None => {
						node.attach(&node.left, Side::Left, key, value);
						return;
					}
				}
			} else {
				match node.right.get() {
					Some(child) => &**child,
					None => {
						node.attach(&node.right, Side::Right, key, value);
						return;
					}
				}
			};
			drop(guard);
			node = next;
		}
	}

	/// Recursive form of [`Node::put`]; holds each lock on the path while descending.
	///
	/// Produces exactly the same shape as [`Node::put`] for the same sequence.
	/// Recursion depth equals the depth of the insertion point.
	pub fn put_recurse(&self, key: Key, value: V) {
		let mut guard = self.value.lock();
		if self.key == key {
			*guard = value;
		} else if key < self.key {
			match self.left.get() {
				Some(child) => child.put_recurse(key, value),
				None => self.attach(&self.left, Side::Left, key, value),
			}
		} else {
			match self.right.get() {
				Some(child) => child.put_recurse(key, value),
				None => self.attach(&self.right, Side::Right, key, value),
			}
		}
	}

	/// Inserts `key` valued with itself.
	pub fn put_key(&self, key: Key)
	where
		V: From<Key>,
	{
		self.put(key, V::from(key));
	}

	/// Fills a vacant child slot. The caller must hold this node's lock.
	fn attach(&self, slot: &Child<V>, side: Side, key: Key, value: V) {
		let depth = self.depth + 1;
		slot.get_or_init(|| Box::new(Node::attached(key, value, depth, side)));
		trace!(key, depth, %side, parent = self.key, "attached node");
	}

	// -----------------------------------------------------------------------
	// Traversal
	// -----------------------------------------------------------------------

	/// Visits every node in this subtree until `visit` returns `false`.
	///
	/// This node is locked and visited first. If the visitor asks to continue,
	/// each existing child subtree is walked on its own scoped thread and this
	/// call returns once both have finished. The walkers share a stop flag that
	/// is checked before each node is locked: once any visit returns `false`,
	/// nodes not yet reached are skipped. Visits already past that check still
	/// complete, so apart from the node that stopped the search nothing is
	/// guaranteed about which nodes were seen.
	///
	/// # Deadlocks
	///
	/// The visited node is locked while the visitor runs. Read the value
	/// through [`Visit::value`]; calling a locking accessor on the visited node
	/// from inside the visitor deadlocks.
	///
	/// ```
	/// use std::sync::Mutex;
	/// use sprig::Node;
	///
	/// let root = Node::<u64>::with_keys(&[12, 11, 90, 82, 7, 9]).unwrap();
	/// let seen = Mutex::new(Vec::new());
	/// root.search_func(|visit| {
	/// 	seen.lock().unwrap().push(*visit.value());
	/// 	true
	/// });
	/// let mut seen = seen.into_inner().unwrap();
	/// seen.sort();
	/// assert_eq!(seen, vec![7, 9, 11, 12, 82, 90]);
	/// ```
	pub fn search_func<F>(&self, visit: F)
	where
		F: Fn(&Visit<'_, V>) -> bool + Sync,
		V: Send + Sync,
	{
		let (left, right) = {
			let guard = self.value.lock();
			if !visit(&Visit {
				node: self,
				value: &*guard,
			}) {
				debug!(key = self.key, "search stopped at starting node");
				return;
			}
			(self.left.get(), self.right.get())
		};

		let stop = AtomicBool::new(false);
		let (visit, stop) = (&visit, &stop);
		thread::scope(|scope| {
			if let Some(left) = left {
				scope.spawn(move || left.search(visit, stop));
			}
			if let Some(right) = right {
				scope.spawn(move || right.search(visit, stop));
			}
		});
	}

	/// Sequential walk used by each [`Node::search_func`] worker.
	fn search<F>(&self, visit: &F, stop: &AtomicBool)
	where
		F: Fn(&Visit<'_, V>) -> bool,
	{
		let mut pending = vec![self];
		while let Some(node) = pending.pop() {
			if stop.load(Ordering::Acquire) {
				return;
			}

			let guard = node.value.lock();
			if !visit(&Visit {
				node,
				value: &*guard,
			}) {
				stop.store(true, Ordering::Release);
				debug!(key = node.key, depth = node.depth, "search stopped by visitor");
				return;
			}
			// Right first so the left subtree is walked first.
			pending.extend(node.right.get().map(Box::as_ref));
			pending.extend(node.left.get().map(Box::as_ref));
		}
	}

	/// Returns a node of maximum depth in this subtree.
	///
	/// Each child subtree of this node is searched on its own scoped thread.
	/// When both subtrees reach the same depth the right one wins.
	///
	/// ```
	/// use sprig::Node;
	///
	/// let root = Node::<u64>::with_keys(&[12, 11, 90, 82, 7, 9]).unwrap();
	/// let deepest = root.deepest_node();
	/// assert_eq!((deepest.key(), deepest.depth()), (9, 3));
	/// ```
	pub fn deepest_node(&self) -> &Node<V>
	where
		V: Send + Sync,
	{
		let (left, right) = {
			let _guard = self.value.lock();
			(self.left.get(), self.right.get())
		};
		let (left, right) = thread::scope(|scope| {
			let left = left.map(|child| scope.spawn(move || child.deepest()));
			let right = right.map(|child| scope.spawn(move || child.deepest()));
			(left.map(join), right.map(join))
		});
		self.deeper(left, right)
	}

	/// Sequential form of [`Node::deepest_node`].
	fn deepest(&self) -> &Node<V> {
		let mut deepest = self;
		let mut pending = vec![self];
		while let Some(node) = pending.pop() {
			// Pre-order meets equally deep nodes left to right, so the last one wins.
			if node.depth >= deepest.depth {
				deepest = node;
			}
			let _guard = node.value.lock();
			pending.extend(node.right.get().map(Box::as_ref));
			pending.extend(node.left.get().map(Box::as_ref));
		}
		deepest
	}

	fn deeper<'a>(&'a self, left: Option<&'a Node<V>>, right: Option<&'a Node<V>>) -> &'a Node<V> {
		match (left, right) {
			(Some(left), Some(right)) => {
				if left.depth > right.depth {
					left
				} else {
					right
				}
			}
			(Some(only), None) | (None, Some(only)) => only,
			(None, None) => self,
		}
	}

	// -----------------------------------------------------------------------
	// Rendering
	// -----------------------------------------------------------------------

	/// Renders this subtree, one `SIDE[key(value)]` line per node.
	///
	/// ```
	/// use sprig::Node;
	///
	/// let root = Node::<u64>::with_keys(&[2, 1, 3]).unwrap();
	/// assert_eq!(root.string_tree(), "ROOT[2(2)]\n└── LEFT[1(1)]\n└── RIGHT[3(3)]\n");
	/// ```
	pub fn string_tree(&self) -> String
	where
		V: fmt::Display,
	{
		self.text_tree().print()
	}

	fn text_tree(&self) -> TextTree
	where
		V: fmt::Display,
	{
		TextTree::build(self, |node| {
			let guard = node.value.lock();
			let children = [node.left.get(), node.right.get()]
				.into_iter()
				.flatten()
				.map(Box::as_ref)
				.collect();
			(label(node.side, node.key, &*guard), children)
		})
	}
}

/// Joins a scoped worker, re-raising its panic on the calling thread.
fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
	handle.join().unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}

/// Formats a node as `SIDE[key(value)]`.
pub(crate) fn label<V: fmt::Display>(side: Side, key: Key, value: &V) -> String {
	format!("{}[{}({})]", side, key, value)
}

impl<V: fmt::Display> fmt::Display for Node<V> {
	/// Takes the node's lock; do not use on a node handed to a visitor.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&label(self.side, self.key, &*self.value.lock()))
	}
}

impl<V: fmt::Debug> fmt::Debug for Node<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Node")
			.field("key", &self.key)
			.field("depth", &self.depth)
			.field("side", &self.side)
			.field("value", &*self.value.lock())
			.finish_non_exhaustive()
	}
}

impl<V> Drop for Node<V> {
	// Unlinks descendants onto a heap stack so degenerate, list-shaped trees
	// don't overflow the call stack when dropped.
	fn drop(&mut self) {
		let mut pending: Vec<Box<Node<V>>> = Vec::new();
		pending.extend(self.left.take());
		pending.extend(self.right.take());
		while let Some(mut node) = pending.pop() {
			pending.extend(node.left.take());
			pending.extend(node.right.take());
		}
	}
}
