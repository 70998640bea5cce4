use std::{future::Future, sync::Arc};

use futures::{
  executor::block_on,
  future::{BoxFuture, FutureExt, Shared},
};

use crate::{
  disposable::Disposable,
  error::RxError,
  observable::Observable,
  observer::{Observer, SharedObserver},
  scheduler::{ArcScheduler, NewThreadScheduler, Scheduler},
};

/// Adapts a future into an observable that emits the resolved value, then
/// completes.
///
/// The future is shared, so the observable stays re-subscribable; each
/// subscription resolves it on the subscribe-time scheduler (a dedicated
/// thread when none is supplied), keeping `subscribe` itself non-blocking.
pub fn from_future<F>(future: F) -> Observable<F::Output>
where
  F: Future + Send + 'static,
  F::Output: Clone + Send + Sync + 'static,
{
  from_shared_future(future.boxed().shared())
}

/// Like [`from_future`], for futures resolving to `Result`: `Ok` emits the
/// value and completes, `Err` surfaces through `on_error`.
pub fn from_future_result<F, Item>(future: F) -> Observable<Item>
where
  F: Future<Output = Result<Item, RxError>> + Send + 'static,
  Item: Clone + Send + Sync + 'static,
{
  let shared = future.boxed().shared();
  Observable::new(move |observer, scheduler| {
    let scheduler =
      scheduler.unwrap_or_else(NewThreadScheduler::singleton);
    let future = shared.clone();
    let observer = SharedObserver::new(observer);
    scheduler.schedule(Arc::new(
      move |_: &ArcScheduler| -> Option<Disposable> {
        let mut observer = observer.clone();
        match block_on(future.clone()) {
          Ok(value) => {
            observer.on_next(value);
            observer.on_completed();
          }
          Err(err) => observer.on_error(err),
        }
        None
      },
    ))
  })
}

pub(crate) fn from_shared_future<Item>(
  future: Shared<BoxFuture<'static, Item>>,
) -> Observable<Item>
where
  Item: Clone + Send + Sync + 'static,
{
  Observable::new(move |observer, scheduler| {
    let scheduler =
      scheduler.unwrap_or_else(NewThreadScheduler::singleton);
    let future = future.clone();
    let observer = SharedObserver::new(observer);
    scheduler.schedule(Arc::new(
      move |_: &ArcScheduler| -> Option<Disposable> {
        let mut observer = observer.clone();
        let value = block_on(future.clone());
        observer.on_next(value);
        observer.on_completed();
        None
      },
    ))
  })
}
