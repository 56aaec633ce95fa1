//! # Error Types
//!
//! Tree operations themselves never fail: a missing key, an empty tree or a
//! leaf without children are all reported through `Option` or zero values.
//! The errors in this module cover the few places where the crate accepts
//! input it cannot interpret: reading a [`Side`](crate::Side) back from a
//! rendered label or from its stored numeric tag.

use thiserror::Error;

/// Errors produced when decoding values handed to the crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// The text does not name a side.
	///
	/// Only `ROOT`, `LEFT` and `RIGHT` are recognised, matching the labels
	/// produced by the renderer.
	#[error("unknown node side {0:?}")]
	UnknownSide(String),

	/// The numeric tag does not correspond to a side.
	///
	/// Valid tags are 1 (root), 2 (left) and 3 (right).
	#[error("unknown node side tag {0}")]
	UnknownSideTag(u8),
}

/// A Result type alias using our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;
