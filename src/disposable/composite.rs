use std::sync::{Arc, Mutex};

use smallvec::SmallVec;

use super::{Disposable, DisposableLike};

/// Owns a dynamic set of child disposables and releases them as one unit.
///
/// Adding a child to an already-disposed composite disposes that child on
/// the spot instead of storing it; removing a child disposes it and drops it
/// from the set.
#[derive(Clone, Default)]
pub struct CompositeDisposable(Arc<Inner>);

#[derive(Default)]
struct Inner {
  state: Mutex<State>,
}

#[derive(Default)]
struct State {
  disposed: bool,
  children: SmallVec<[Disposable; 2]>,
}

impl CompositeDisposable {
  pub fn new() -> Self { Self::default() }

  /// Builds a composite already holding `children`.
  pub fn of(children: impl IntoIterator<Item = Disposable>) -> Self {
    let composite = Self::new();
    for child in children {
      composite.add(child);
    }
    composite
  }

  pub fn add(&self, disposable: impl Into<Disposable>) {
    let disposable = disposable.into();
    let stored = {
      let mut state = self.0.state.lock().unwrap();
      if state.disposed {
        false
      } else {
        state.children.push(disposable.clone());
        true
      }
    };
    if !stored {
      disposable.dispose();
    }
  }

  /// Removes `disposable` from the set and disposes it. Returns whether it
  /// was found.
  pub fn remove(&self, disposable: &Disposable) -> bool {
    let removed = {
      let mut state = self.0.state.lock().unwrap();
      state
        .children
        .iter()
        .position(|child| child.ptr_eq(disposable))
        .map(|at| state.children.remove(at))
    };
    match removed {
      Some(child) => {
        child.dispose();
        true
      }
      None => false,
    }
  }

  pub fn len(&self) -> usize { self.0.state.lock().unwrap().children.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  #[inline]
  pub fn dispose(&self) { self.0.dispose() }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.0.is_disposed() }
}

impl DisposableLike for Inner {
  fn dispose(&self) {
    let children = {
      let mut state = self.state.lock().unwrap();
      if state.disposed {
        return;
      }
      state.disposed = true;
      std::mem::take(&mut state.children)
    };
    for child in children {
      child.dispose();
    }
  }

  fn is_disposed(&self) -> bool { self.state.lock().unwrap().disposed }
}

impl From<CompositeDisposable> for Disposable {
  fn from(composite: CompositeDisposable) -> Self {
    Disposable::from_like(composite.0)
  }
}
