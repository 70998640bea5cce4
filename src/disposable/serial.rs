use std::sync::{Arc, Mutex};

use super::{Disposable, DisposableLike};

/// Single mutable slot: assigning a replacement disposes the previous
/// occupant. Once the slot itself is disposed, every later assignment is
/// disposed immediately instead of being held.
#[derive(Clone, Default)]
pub struct SerialDisposable(Arc<Inner>);

#[derive(Default)]
struct Inner {
  state: Mutex<State>,
}

#[derive(Default)]
struct State {
  disposed: bool,
  current: Option<Disposable>,
}

impl SerialDisposable {
  pub fn new() -> Self { Self::default() }

  /// Replaces the slot's occupant.
  pub fn set(&self, disposable: Disposable) {
    let (previous, rejected) = {
      let mut state = self.0.state.lock().unwrap();
      if state.disposed {
        (None, true)
      } else {
        (state.current.replace(disposable.clone()), false)
      }
    };
    if rejected {
      disposable.dispose();
    }
    if let Some(previous) = previous {
      previous.dispose();
    }
  }

  #[inline]
  pub fn dispose(&self) { self.0.dispose() }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.0.is_disposed() }
}

impl DisposableLike for Inner {
  fn dispose(&self) {
    let current = {
      let mut state = self.state.lock().unwrap();
      if state.disposed {
        return;
      }
      state.disposed = true;
      state.current.take()
    };
    if let Some(current) = current {
      current.dispose();
    }
  }

  fn is_disposed(&self) -> bool { self.state.lock().unwrap().disposed }
}

impl From<SerialDisposable> for Disposable {
  fn from(serial: SerialDisposable) -> Self { Disposable::from_like(serial.0) }
}
