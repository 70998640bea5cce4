use std::{sync::Arc, time::Duration};

use crate::{
  disposable::Disposable,
  observable::Observable,
  observer::{Observer, SharedObserver},
  scheduler::{ArcScheduler, NewThreadScheduler, Scheduler},
};

/// Emits a single `0` once `due` has elapsed on the subscribe-time
/// scheduler (a dedicated thread when none is supplied), then completes.
pub fn timer(due: Duration) -> Observable<u64> {
  Observable::new(move |observer, scheduler| {
    let scheduler =
      scheduler.unwrap_or_else(NewThreadScheduler::singleton);
    let observer = SharedObserver::new(observer);
    scheduler.schedule_relative(
      due,
      Arc::new(move |_: &ArcScheduler| -> Option<Disposable> {
        let mut observer = observer.clone();
        observer.on_next(0);
        observer.on_completed();
        None
      }),
    )
  })
}
