//! The per-subscription delivery gate.
//!
//! A [`Subscriber`] sits between a producer and the observer the caller
//! supplied. It owns the subscription's lifecycle: active while the observer
//! sits in the slot, terminated once a terminal notification consumes it,
//! disposed once [`Subscriber::detach`] clears it. Whichever comes first,
//! nothing reaches the observer afterwards — an already in-flight `on_next`
//! cannot be recalled, but no later notification is delivered.
//!
//! Delivery checks the observer out of the slot instead of holding the slot
//! lock across the call, so user callbacks may dispose the subscription
//! reentrantly without deadlocking.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Mutex,
};

use crate::{
  error::RxError,
  observer::{BoxedObserver, Observer},
};

pub struct Subscriber<Item> {
  state: Arc<State<Item>>,
}

struct State<Item> {
  stopped: AtomicBool,
  slot: Mutex<Option<BoxedObserver<Item>>>,
}

impl<Item> Subscriber<Item> {
  pub fn new(observer: impl Observer<Item> + Send + 'static) -> Self {
    Self {
      state: Arc::new(State {
        stopped: AtomicBool::new(false),
        slot: Mutex::new(Some(Box::new(observer))),
      }),
    }
  }

  /// Drops the observer without a terminal notification. Safe to call from
  /// any thread, any number of times, including from inside a callback this
  /// subscriber is currently delivering.
  pub(crate) fn detach(&self) {
    self.state.stopped.store(true, Ordering::Release);
    let dropped = self.state.slot.lock().unwrap().take();
    drop(dropped);
  }

  pub fn is_stopped(&self) -> bool {
    self.state.stopped.load(Ordering::Acquire)
  }
}

impl<Item> Clone for Subscriber<Item> {
  fn clone(&self) -> Self { Self { state: self.state.clone() } }
}

impl<Item> Observer<Item> for Subscriber<Item> {
  fn on_next(&mut self, value: Item) {
    if self.is_stopped() {
      return;
    }
    // Check the observer out so the slot lock is not held during delivery.
    let checked_out = self.state.slot.lock().unwrap().take();
    let Some(mut observer) = checked_out else { return };
    observer.on_next(value);

    let mut slot = self.state.slot.lock().unwrap();
    // The stop flag is re-read under the lock: a detach that raced with the
    // delivery above must not have its slot refilled.
    if !self.state.stopped.load(Ordering::Acquire) {
      *slot = Some(observer);
    }
  }

  fn on_error(&mut self, err: RxError) {
    if self.state.stopped.swap(true, Ordering::AcqRel) {
      return;
    }
    let taken = self.state.slot.lock().unwrap().take();
    if let Some(mut observer) = taken {
      observer.on_error(err);
    }
  }

  fn on_completed(&mut self) {
    if self.state.stopped.swap(true, Ordering::AcqRel) {
      return;
    }
    let taken = self.state.slot.lock().unwrap().take();
    if let Some(mut observer) = taken {
      observer.on_completed();
    }
  }

  fn is_closed(&self) -> bool {
    if self.is_stopped() {
      return true;
    }
    self
      .state
      .slot
      .lock()
      .unwrap()
      .as_ref()
      .is_some_and(|observer| observer.is_closed())
  }
}
