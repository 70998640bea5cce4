use std::sync::Mutex;

use crate::{
  disposable::SingleAssignmentDisposable,
  error::{rx_error, OutOfRangeError, RxError},
  observable::Observable,
  observer::{Observer, SharedObserver},
};

impl<Item: Clone + Send + Sync + 'static> Observable<Item> {
  /// Emits the value at `index` (0-based), follows it with a synthetic
  /// completion, and drops the upstream subscription.
  ///
  /// If the source completes first, `default` is emitted instead when
  /// present; otherwise the subscription fails with [`OutOfRangeError`].
  pub fn element_at_or_default(
    &self,
    index: usize,
    default: Option<Item>,
  ) -> Observable<Item> {
    let source = self.clone();
    Observable::new(move |observer, scheduler| {
      let upstream = SingleAssignmentDisposable::new();
      let inner = ElementAtObserver {
        downstream: SharedObserver::new(observer),
        // The lock guards only the compare-and-decrement; forwarding
        // happens after it is released.
        remaining: Mutex::new(index),
        index,
        default: default.clone(),
        upstream: upstream.clone(),
      };
      upstream.set(source.subscribe_with(inner, scheduler));
      upstream.into()
    })
  }
}

struct ElementAtObserver<Item> {
  downstream: SharedObserver<Item>,
  remaining: Mutex<usize>,
  index: usize,
  default: Option<Item>,
  upstream: SingleAssignmentDisposable,
}

impl<Item: Send + 'static> Observer<Item> for ElementAtObserver<Item> {
  fn on_next(&mut self, value: Item) {
    let found = {
      let mut remaining = self.remaining.lock().unwrap();
      if *remaining > 0 {
        *remaining -= 1;
        false
      } else {
        true
      }
    };
    if found {
      self.downstream.on_next(value);
      self.downstream.on_completed();
      // Done with the source; release it rather than riding it out.
      self.upstream.dispose();
    }
  }

  fn on_error(&mut self, err: RxError) { self.downstream.on_error(err) }

  fn on_completed(&mut self) {
    match self.default.take() {
      Some(value) => {
        self.downstream.on_next(value);
        self.downstream.on_completed();
      }
      None => {
        self.downstream.on_error(rx_error(OutOfRangeError(self.index)))
      }
    }
  }

  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}
