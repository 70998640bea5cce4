//! The consumer side of the subscription contract.
//!
//! An observer receives values through `on_next` and at most one terminal
//! notification: `on_error` or `on_completed`, always last. The runtime does
//! not police that ordering inside the trait itself; operators preserve it,
//! and the [`Subscriber`](crate::subscriber::Subscriber) gate enforces it at
//! every subscription boundary.

use std::sync::{Arc, Mutex};

use crate::error::RxError;

/// The sink for one subscription's notifications.
pub trait Observer<Item> {
  fn on_next(&mut self, value: Item);

  fn on_error(&mut self, err: RxError);

  fn on_completed(&mut self);

  /// Whether this observer will accept further notifications. Synchronous
  /// sources use this to stop emitting early.
  fn is_closed(&self) -> bool;
}

/// Type-erased observer, the currency handed to raw subscribe functions.
pub type BoxedObserver<Item> = Box<dyn Observer<Item> + Send>;

impl<Item, O> Observer<Item> for Box<O>
where
  O: Observer<Item> + ?Sized,
{
  #[inline]
  fn on_next(&mut self, value: Item) { (**self).on_next(value) }

  #[inline]
  fn on_error(&mut self, err: RxError) { (**self).on_error(err) }

  #[inline]
  fn on_completed(&mut self) { (**self).on_completed() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

/// Cheap-clone handle sharing one observer between the several callbacks and
/// subscriptions an operator fans out to. Clones deliver to the same sink.
pub struct SharedObserver<Item>(Arc<Mutex<BoxedObserver<Item>>>);

impl<Item> SharedObserver<Item> {
  pub fn new(observer: impl Observer<Item> + Send + 'static) -> Self {
    Self(Arc::new(Mutex::new(Box::new(observer))))
  }
}

impl<Item> Clone for SharedObserver<Item> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item> Observer<Item> for SharedObserver<Item> {
  fn on_next(&mut self, value: Item) {
    self.0.lock().unwrap().on_next(value)
  }

  fn on_error(&mut self, err: RxError) { self.0.lock().unwrap().on_error(err) }

  fn on_completed(&mut self) { self.0.lock().unwrap().on_completed() }

  fn is_closed(&self) -> bool { self.0.lock().unwrap().is_closed() }
}

/// Assembles an observer from individual callbacks; the backing type of the
/// `subscribe` / `subscribe_all` sugar.
pub struct CallbackObserver<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

impl<N, E, C> CallbackObserver<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self {
    Self { next, error, complete }
  }
}

impl<Item, N, E, C> Observer<Item> for CallbackObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnMut(RxError),
  C: FnMut(),
{
  #[inline]
  fn on_next(&mut self, value: Item) { (self.next)(value) }

  #[inline]
  fn on_error(&mut self, err: RxError) { (self.error)(err) }

  #[inline]
  fn on_completed(&mut self) { (self.complete)() }

  #[inline]
  fn is_closed(&self) -> bool { false }
}
