use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use crate::{
  disposable::{CompositeDisposable, SingleAssignmentDisposable},
  error::RxError,
  observable::Observable,
  observer::{Observer, SharedObserver},
};

impl<Item: Send + 'static> Observable<Item> {
  /// Suppresses values until `gate` emits its first value.
  ///
  /// The latch is monotonic: once open it never closes, whatever the gate
  /// does afterwards. The gate subscription is dropped on that first value,
  /// and on gate completion; a gate that completes without ever emitting
  /// leaves the latch closed for the rest of the primary's life. Primary
  /// values and completion are swallowed while closed, but primary errors
  /// always propagate, and a gate error propagates as well.
  pub fn skip_until<Gate: Send + 'static>(
    &self,
    gate: Observable<Gate>,
  ) -> Observable<Item> {
    let source = self.clone();
    Observable::new(move |observer, scheduler| {
      let downstream = SharedObserver::new(observer);
      let is_open = Arc::new(AtomicBool::new(false));

      let subscriptions = CompositeDisposable::new();
      subscriptions.add(source.subscribe_with(
        SkipUntilPrimaryObserver {
          downstream: downstream.clone(),
          is_open: is_open.clone(),
        },
        scheduler.clone(),
      ));

      let gate_subscription = SingleAssignmentDisposable::new();
      subscriptions.add(gate_subscription.clone());
      gate_subscription.set(gate.subscribe_with(
        SkipUntilGateObserver {
          downstream: downstream.clone(),
          is_open: is_open.clone(),
          subscription: gate_subscription.clone(),
        },
        scheduler.clone(),
      ));

      subscriptions.into()
    })
  }
}

struct SkipUntilPrimaryObserver<Item> {
  downstream: SharedObserver<Item>,
  is_open: Arc<AtomicBool>,
}

impl<Item> Observer<Item> for SkipUntilPrimaryObserver<Item> {
  fn on_next(&mut self, value: Item) {
    if self.is_open.load(Ordering::Acquire) {
      self.downstream.on_next(value);
    }
  }

  fn on_error(&mut self, err: RxError) { self.downstream.on_error(err) }

  fn on_completed(&mut self) {
    if self.is_open.load(Ordering::Acquire) {
      self.downstream.on_completed();
    }
  }

  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}

struct SkipUntilGateObserver<Item> {
  downstream: SharedObserver<Item>,
  is_open: Arc<AtomicBool>,
  subscription: SingleAssignmentDisposable,
}

impl<Item, Gate> Observer<Gate> for SkipUntilGateObserver<Item> {
  fn on_next(&mut self, _: Gate) {
    self.is_open.store(true, Ordering::Release);
    // No further interest in the gate once open.
    self.subscription.dispose();
  }

  fn on_error(&mut self, err: RxError) { self.downstream.on_error(err) }

  fn on_completed(&mut self) { self.subscription.dispose() }

  fn is_closed(&self) -> bool {
    self.is_open.load(Ordering::Acquire) || self.downstream.is_closed()
  }
}
