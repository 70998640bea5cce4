use std::sync::{Arc, Mutex};

use super::{Disposable, DisposableLike};

/// Slot assignable exactly once. Disposing before the assignment arrives
/// wins the race: the eventual occupant is disposed on arrival. Assigning
/// twice is a usage fault and panics.
#[derive(Clone, Default)]
pub struct SingleAssignmentDisposable(Arc<Inner>);

#[derive(Default)]
struct Inner {
  state: Mutex<State>,
}

#[derive(Default)]
struct State {
  disposed: bool,
  assigned: bool,
  current: Option<Disposable>,
}

impl SingleAssignmentDisposable {
  pub fn new() -> Self { Self::default() }

  /// Fills the slot.
  ///
  /// # Panics
  ///
  /// Panics if the slot was already assigned.
  pub fn set(&self, disposable: Disposable) {
    let dispose_now = {
      let mut state = self.0.state.lock().unwrap();
      assert!(
        !state.assigned,
        "SingleAssignmentDisposable assigned twice"
      );
      state.assigned = true;
      if state.disposed {
        true
      } else {
        state.current = Some(disposable.clone());
        false
      }
    };
    if dispose_now {
      disposable.dispose();
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

impl From<SingleAssignmentDisposable> for Disposable {
  fn from(slot: SingleAssignmentDisposable) -> Self {
    Disposable::from_like(slot.0)
  }
}
