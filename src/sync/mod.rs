//! Synchronization primitives with loom support.
//!
//! Under normal compilation, re-exports from std and parking_lot.
//! Under `cfg(loom)`, uses loom's equivalents for deterministic testing.
//!
//! # Usage
//!
//! Instead of importing directly from `std::sync::atomic` or `parking_lot`,
//! import from this module:
//!
//! ```ignore
//! use crate::sync::{AtomicBool, Mutex, Ordering, RwLock};
//! ```
//!
//! # Loom Integration
//!
//! When compiled with `--cfg loom`, the per-node [`Mutex`] and the whole-tree
//! [`RwLock`] come from loom, so insertions and lookups can be model checked
//! across every interleaving. Traversals that fork scoped OS threads
//! (`search_func`, `deepest_node`) are not loom-aware and must not be called
//! inside `loom::model`.

// Allow unused items - some are only used under loom cfg
#![allow(unused)]

// ===========================================================================
// Atomic Primitives
// ===========================================================================

#[cfg(not(loom))]
pub use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(loom)]
pub use loom::sync::atomic::{AtomicBool, Ordering};

// ===========================================================================
// Mutex and RwLock
// ===========================================================================

// Note: parking_lot's locks and loom's locks have different APIs.
// parking_lot uses RAII guards without Result wrapping, while loom uses
// Result-returning methods. We need wrapper types to unify them.

#[cfg(not(loom))]
pub use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(loom)]
mod loom_locks {
	//! Wrapper types for loom's locks to match parking_lot's API.

	use loom::sync::{
		Mutex as LoomMutex, MutexGuard as LoomMutexGuard, RwLock as LoomRwLock,
		RwLockReadGuard as LoomReadGuard, RwLockWriteGuard as LoomWriteGuard,
	};

	/// A wrapper around loom's Mutex that provides a parking_lot-compatible API.
	pub struct Mutex<T>(LoomMutex<T>);

	impl<T> Mutex<T> {
		/// Creates a new Mutex.
		pub fn new(value: T) -> Self {
			Mutex(LoomMutex::new(value))
		}

		/// Acquires the lock, blocking until available.
		pub fn lock(&self) -> MutexGuard<'_, T> {
			MutexGuard(self.0.lock().unwrap())
		}
	}

	/// Wrapper around loom's mutex guard.
	pub struct MutexGuard<'a, T>(LoomMutexGuard<'a, T>);

	impl<'a, T> std::ops::Deref for MutexGuard<'a, T> {
		type Target = T;
		fn deref(&self) -> &T {
			&self.0
		}
	}

	impl<'a, T> std::ops::DerefMut for MutexGuard<'a, T> {
		fn deref_mut(&mut self) -> &mut T {
			&mut self.0
		}
	}

	/// A wrapper around loom's RwLock that provides a parking_lot-compatible API.
	pub struct RwLock<T>(LoomRwLock<T>);

	impl<T> RwLock<T> {
		/// Creates a new RwLock.
		pub fn new(value: T) -> Self {
			RwLock(LoomRwLock::new(value))
		}

		/// Acquires a read lock, blocking until available.
		pub fn read(&self) -> RwLockReadGuard<'_, T> {
			RwLockReadGuard(self.0.read().unwrap())
		}

		/// Acquires a write lock, blocking until available.
		pub fn write(&self) -> RwLockWriteGuard<'_, T> {
			RwLockWriteGuard(self.0.write().unwrap())
		}
	}

	/// Wrapper around loom's read guard.
	pub struct RwLockReadGuard<'a, T>(LoomReadGuard<'a, T>);

	impl<'a, T> std::ops::Deref for RwLockReadGuard<'a, T> {
		type Target = T;
		fn deref(&self) -> &T {
			&self.0
		}
	}

	/// Wrapper around loom's write guard.
	pub struct RwLockWriteGuard<'a, T>(LoomWriteGuard<'a, T>);

	impl<'a, T> std::ops::Deref for RwLockWriteGuard<'a, T> {
		type Target = T;
		fn deref(&self) -> &T {
			&self.0
		}
	}

	impl<'a, T> std::ops::DerefMut for RwLockWriteGuard<'a, T> {
		fn deref_mut(&mut self) -> &mut T {
			&mut self.0
		}
	}
}

#[cfg(loom)]
pub use loom_locks::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
