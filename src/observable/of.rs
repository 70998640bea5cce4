use crate::{
  disposable::Disposable,
  error::RxError,
  observable::Observable,
  observer::{BoxedObserver, Observer},
};

/// Emits `value` once, then completes.
pub fn of<Item>(value: Item) -> Observable<Item>
where
  Item: Clone + Send + Sync + 'static,
{
  Observable::new(move |mut observer: BoxedObserver<Item>, _| {
    observer.on_next(value.clone());
    observer.on_completed();
    Disposable::empty()
  })
}

/// Completes immediately without emitting.
pub fn empty<Item: 'static>() -> Observable<Item> {
  Observable::new(|mut observer: BoxedObserver<Item>, _| {
    observer.on_completed();
    Disposable::empty()
  })
}

/// Never emits and never terminates.
pub fn never<Item: 'static>() -> Observable<Item> {
  Observable::new(|_: BoxedObserver<Item>, _| Disposable::empty())
}

/// Fails immediately with `err`.
pub fn throw<Item: 'static>(err: RxError) -> Observable<Item> {
  Observable::new(move |mut observer: BoxedObserver<Item>, _| {
    observer.on_error(err.clone());
    Disposable::empty()
  })
}
