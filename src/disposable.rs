//! Releasable subscription resources.
//!
//! Every subscription hands back a [`Disposable`]; disposing it is the one
//! and only cancellation mechanism in the runtime. All flavors share two
//! guarantees: `dispose` is idempotent (the underlying release runs at most
//! once, however many callers race on it), and user teardown always runs
//! outside the internal state lock, so disposing reentrantly from inside a
//! notification callback cannot deadlock.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Mutex,
};

mod composite;
mod serial;
mod single_assignment;
pub use composite::CompositeDisposable;
pub use serial::SerialDisposable;
pub use single_assignment::SingleAssignmentDisposable;

/// A releasable resource. `dispose` never panics on repeat calls and is safe
/// to invoke concurrently from any thread.
pub trait DisposableLike: Send + Sync {
  fn dispose(&self);

  fn is_disposed(&self) -> bool;
}

/// Clonable handle to a releasable resource. Clones share the underlying
/// resource: disposing any of them releases it for all.
#[derive(Clone)]
pub struct Disposable(Arc<dyn DisposableLike>);

impl Disposable {
  /// A disposable that runs `teardown` exactly once, on whichever `dispose`
  /// call arrives first.
  pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
    Self(Arc::new(Teardown {
      action: Mutex::new(Some(Box::new(teardown))),
    }))
  }

  /// A disposable with no teardown; only tracks the disposed bit.
  pub fn empty() -> Self { Self(Arc::new(Flag(AtomicBool::new(false)))) }

  #[inline]
  pub fn dispose(&self) { self.0.dispose() }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.0.is_disposed() }

  /// Identity comparison; used by [`CompositeDisposable::remove`].
  pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }

  pub(crate) fn from_like(inner: Arc<dyn DisposableLike>) -> Self {
    Self(inner)
  }
}

impl DisposableLike for Disposable {
  #[inline]
  fn dispose(&self) { self.0.dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.is_disposed() }
}

struct Teardown {
  action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl DisposableLike for Teardown {
  fn dispose(&self) {
    let action = self.action.lock().unwrap().take();
    if let Some(action) = action {
      action();
    }
  }

  fn is_disposed(&self) -> bool { self.action.lock().unwrap().is_none() }
}

struct Flag(AtomicBool);

impl DisposableLike for Flag {
  fn dispose(&self) { self.0.store(true, Ordering::Release); }

  fn is_disposed(&self) -> bool { self.0.load(Ordering::Acquire) }
}
