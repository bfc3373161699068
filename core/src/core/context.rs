// duka-flow/src/core/context.rs

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lock-protected data for one flow run.
///
/// Every handler receives a clone of the same `FlowContext`, so writes made by
/// one step are visible to the next. The lock is a blocking `parking_lot`
/// lock: guards MUST be dropped before any `.await` point. Prefer
/// [`FlowContext::update`] and [`FlowContext::snapshot`], which cannot leak a
/// guard across a suspension point.
#[derive(Debug)]
pub struct FlowContext<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> FlowContext<T> {
  pub fn new(data: T) -> Self {
    FlowContext(Arc::new(RwLock::new(data)))
  }

  /// Acquires a read lock. Drop the guard before awaiting.
  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  /// Acquires a write lock. Drop the guard before awaiting.
  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Runs `f` under the write lock and returns its result.
  pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
    let mut guard = self.0.write();
    f(&mut guard)
  }

  /// Reads a value out of the context under the read lock.
  pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
    let guard = self.0.read();
    f(&guard)
  }

  /// Clones the whole context data.
  pub fn snapshot(&self) -> T
  where
    T: Clone,
  {
    self.0.read().clone()
  }
}

impl<T: Send + Sync + 'static> Clone for FlowContext<T> {
  fn clone(&self) -> Self {
    FlowContext(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + 'static + Default> Default for FlowContext<T> {
  fn default() -> Self {
    Self::new(Default::default())
  }
}
