//! The producer side of the subscription contract.
//!
//! An [`Observable`] is an immutable description of a producer: building
//! one performs no work, and each `subscribe` call starts an independent
//! run. The returned [`Disposable`] is the subscription handle; disposing
//! it prevents any further notification from reaching the observer, even
//! if the underlying producer keeps emitting.

use std::sync::Arc;

use crate::{
  disposable::Disposable,
  error::RxError,
  observer::{BoxedObserver, CallbackObserver, Observer},
  scheduler::ArcScheduler,
  subscriber::Subscriber,
};

mod from_future;
mod from_iter;
mod of;
mod timer;
pub use from_future::{from_future, from_future_result};
pub(crate) use from_future::from_shared_future;
pub use from_iter::from_iter;
pub use of::{empty, never, of, throw};
pub use timer::timer;

type SubscribeFn<Item> =
  dyn Fn(BoxedObserver<Item>, Option<ArcScheduler>) -> Disposable
    + Send
    + Sync;

pub struct Observable<Item> {
  on_subscribe: Arc<SubscribeFn<Item>>,
}

impl<Item> Clone for Observable<Item> {
  fn clone(&self) -> Self {
    Self { on_subscribe: self.on_subscribe.clone() }
  }
}

impl<Item: 'static> Observable<Item> {
  /// Builds an observable from a raw subscribe function.
  ///
  /// `f` runs once per subscription. The observer it receives is already
  /// gated: notifications arriving after a terminal event or after disposal
  /// are discarded, so `f` may keep emitting without further checks. The
  /// scheduler argument is the subscribe-time hint, `None` when the caller
  /// did not supply one.
  pub fn new(
    f: impl Fn(BoxedObserver<Item>, Option<ArcScheduler>) -> Disposable
      + Send
      + Sync
      + 'static,
  ) -> Self {
    Self { on_subscribe: Arc::new(f) }
  }

  /// Subscribes `observer`, optionally pinning the scheduler the producer
  /// should use. Returns the subscription handle.
  pub fn subscribe_with(
    &self,
    observer: impl Observer<Item> + Send + 'static,
    scheduler: Option<ArcScheduler>,
  ) -> Disposable {
    let subscriber = Subscriber::new(observer);
    let upstream =
      (self.on_subscribe)(Box::new(subscriber.clone()), scheduler);
    Disposable::new(move || {
      subscriber.detach();
      upstream.dispose();
    })
  }

  /// Subscribes with a value callback only; errors and completion are
  /// ignored.
  pub fn subscribe(
    &self,
    next: impl FnMut(Item) + Send + 'static,
  ) -> Disposable {
    self.subscribe_all(next, |_| {}, || {})
  }

  /// Subscribes with one callback per notification channel.
  pub fn subscribe_all(
    &self,
    next: impl FnMut(Item) + Send + 'static,
    error: impl FnMut(RxError) + Send + 'static,
    complete: impl FnMut() + Send + 'static,
  ) -> Disposable {
    self.subscribe_with(CallbackObserver::new(next, error, complete), None)
  }
}
