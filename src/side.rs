//! Position of a node relative to its immediate parent.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Where a node hangs off its parent.
///
/// Only the root of a tree carries [`Side::Root`]; every other node is the
/// left or right child of exactly one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
	/// The node has no parent.
	Root = 1,
	/// The node is its parent's left child (smaller key).
	Left = 2,
	/// The node is its parent's right child (larger key).
	Right = 3,
}

impl Side {
	/// Returns `true` if the node has no parent.
	#[inline]
	pub fn is_root(self) -> bool {
		self == Side::Root
	}

	/// Returns `true` if the node is on the left of its parent.
	#[inline]
	pub fn is_left(self) -> bool {
		self == Side::Left
	}

	/// Returns `true` if the node is on the right of its parent.
	#[inline]
	pub fn is_right(self) -> bool {
		self == Side::Right
	}

	/// The upper-case label used when rendering a tree.
	pub fn as_str(self) -> &'static str {
		match self {
			Side::Root => "ROOT",
			Side::Left => "LEFT",
			Side::Right => "RIGHT",
		}
	}
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Parses the labels written by [`Side`]'s `Display`, so a line of a
/// rendered tree (`LEFT[7(7)]`) can be read back.
impl FromStr for Side {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"ROOT" => Ok(Side::Root),
			"LEFT" => Ok(Side::Left),
			"RIGHT" => Ok(Side::Right),
			other => Err(Error::UnknownSide(other.to_string())),
		}
	}
}

/// Decodes the `#[repr(u8)]` tag produced by `u8::from(side)`, for callers
/// that store sides compactly outside the tree.
impl TryFrom<u8> for Side {
	type Error = Error;

	fn try_from(tag: u8) -> Result<Self> {
		match tag {
			1 => Ok(Side::Root),
			2 => Ok(Side::Left),
			3 => Ok(Side::Right),
			other => Err(Error::UnknownSideTag(other)),
		}
	}
}

impl From<Side> for u8 {
	fn from(side: Side) -> u8 {
		side as u8
	}
}
