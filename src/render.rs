//! Box-drawing renderer for labeled n-ary trees.
//!
//! The renderer knows nothing about binary search trees. It works on anything
//! implementing [`Labeled`]: a node with a single-line label and an ordered list
//! of children. Both tree variants build a [`TextTree`] mirroring their shape
//! and hand it to [`print`].
//!
//! ## Output Format
//!
//! ```text
//! ROOT[12(12)]
//! └── LEFT[11(11)]
//! │   ├── LEFT[7(7)]
//! │       └── RIGHT[9(9)]
//! └── RIGHT[90(90)]
//!     └── LEFT[82(82)]
//! ```
//!
//! The first line is the root label. Every other line is a prefix, a connector
//! and the label, terminated by `\n`:
//!
//! - The prefix holds one 4-column segment per ancestor between the root and
//!   the item: blank when that ancestor closes its sibling list, `│` otherwise.
//! - The connector is `└── ` when the item's parent is the root or closes its
//!   own sibling list, and `├── ` otherwise. It follows the parent's position,
//!   not the item's, which is why `LEFT[11(11)]` above gets `└── `.
//!
//! Building, printing and dropping a [`TextTree`] never recurse, so trees
//! shaped like long chains render on any thread stack.

const NEW_LINE: &str = "\n";
const EMPTY_SPACE: &str = "    ";
const MIDDLE_ITEM: &str = "├── ";
const CONTINUE_ITEM: &str = "│   ";
const LAST_ITEM: &str = "└── ";

/// Capability required by the renderer: a label and zero or more children.
pub trait Labeled: Sized {
	/// The single-line label printed for this node.
	fn text(&self) -> &str;

	/// Children in the order they are printed.
	fn items(&self) -> &[Self];
}

/// An owned labeled tree, built top-down and printed with [`TextTree::print`].
#[derive(Debug)]
pub struct TextTree {
	text: String,
	items: Vec<TextTree>,
}

impl TextTree {
	/// Creates a tree with a single node.
	pub fn new(text: impl Into<String>) -> Self {
		TextTree {
			text: text.into(),
			items: Vec::new(),
		}
	}

	/// Builds a tree from `root` without recursing.
	///
	/// `expand` returns a node's label and its children in print order. It is
	/// called once per node, parents before children.
	pub fn build<N>(root: N, mut expand: impl FnMut(N) -> (String, Vec<N>)) -> TextTree {
		enum Step<N> {
			Enter(N),
			Leave(String, usize),
		}

		let mut steps = vec![Step::Enter(root)];
		let mut built: Vec<TextTree> = Vec::new();
		while let Some(step) = steps.pop() {
			match step {
				Step::Enter(node) => {
					let (text, children) = expand(node);
					steps.push(Step::Leave(text, children.len()));
					steps.extend(children.into_iter().rev().map(Step::Enter));
				}
				Step::Leave(text, count) => {
					let items = built.split_off(built.len() - count);
					let tree = TextTree {
						text,
						items,
					};
					// The root's step sits at the bottom of the stack.
					if steps.is_empty() {
						return tree;
					}
					built.push(tree);
				}
			}
		}
		unreachable!("the root step is always finished last")
	}

	/// Appends a leaf with `text` and returns it so it can be extended.
	pub fn add(&mut self, text: impl Into<String>) -> &mut TextTree {
		self.items.push(TextTree::new(text));
		let last = self.items.len() - 1;
		&mut self.items[last]
	}

	/// Appends an already built subtree.
	pub fn add_tree(&mut self, tree: TextTree) {
		self.items.push(tree);
	}

	/// Renders the tree as described in the [module docs](self).
	pub fn print(&self) -> String {
		print(self)
	}
}

impl Drop for TextTree {
	fn drop(&mut self) {
		let mut pending = std::mem::take(&mut self.items);
		while let Some(mut tree) = pending.pop() {
			pending.append(&mut tree.items);
		}
	}
}

impl Labeled for TextTree {
	fn text(&self) -> &str {
		&self.text
	}

	fn items(&self) -> &[Self] {
		&self.items
	}
}

/// Renders any [`Labeled`] tree.
pub fn print<T: Labeled>(tree: &T) -> String {
	let mut out = String::new();
	out.push_str(tree.text());
	out.push_str(NEW_LINE);

	// `closes[i]` records whether the ancestor at level `i + 1` was the last of its siblings.
	let mut closes: Vec<bool> = Vec::new();
	// One (siblings, next index) cursor per level being printed.
	let mut levels: Vec<(&[T], usize)> = vec![(tree.items(), 0)];
	while let Some(level) = levels.last_mut() {
		let (items, index) = *level;
		if index == items.len() {
			levels.pop();
			closes.pop();
			continue;
		}
		level.1 += 1;

		let item = &items[index];
		for &closed in closes.iter() {
			out.push_str(if closed {
				EMPTY_SPACE
			} else {
				CONTINUE_ITEM
			});
		}
		out.push_str(if closes.last().copied().unwrap_or(true) {
			LAST_ITEM
		} else {
			MIDDLE_ITEM
		});
		out.push_str(item.text());
		out.push_str(NEW_LINE);

		if !item.items().is_empty() {
			closes.push(index + 1 == items.len());
			levels.push((item.items(), 0));
		}
	}
	out
}
