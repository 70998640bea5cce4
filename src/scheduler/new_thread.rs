use std::{
  sync::Arc,
  thread,
  time::{Duration, Instant},
};

use once_cell::sync::Lazy;

use super::{ArcScheduler, PendingTask, Scheduler, Task};
use crate::disposable::Disposable;

/// Dedicated-thread scheduler: every request gets its own worker thread,
/// which sleeps out the delay and runs the task unless it was cancelled in
/// the meantime. Workers are detached; the returned disposable is the only
/// link back to the pending work.
#[derive(Clone, Copy, Default)]
pub struct NewThreadScheduler;

impl NewThreadScheduler {
  pub fn singleton() -> ArcScheduler {
    static SINGLETON: Lazy<ArcScheduler> =
      Lazy::new(|| Arc::new(NewThreadScheduler));
    SINGLETON.clone()
  }
}

impl Scheduler for NewThreadScheduler {
  fn now(&self) -> Instant { Instant::now() }

  fn schedule_relative(
    &self,
    delay: Duration,
    task: Arc<dyn Task>,
  ) -> Disposable {
    let pending = PendingTask::new(task);
    let handle = pending.handle();

    tracing::trace!(?delay, "spawning worker thread");
    thread::spawn(move || {
      if !delay.is_zero() {
        thread::sleep(delay);
      }
      let scheduler: ArcScheduler = Arc::new(NewThreadScheduler);
      pending.execute(&scheduler);
    });
    handle
  }
}
