//! Execution policy: what runs where, and when.
//!
//! A [`Scheduler`] decouples a unit of work from the context it runs in.
//! Every schedule call returns a [`Disposable`] that cancels the pending run
//! if it fires first; cancellation never unwinds work that already started.
//! Tasks receive the scheduler they run on and may reschedule themselves,
//! which is how synchronous recursive operator chains become an iterative,
//! stack-safe loop on the trampolined current-thread scheduler.

use std::{
  cmp::Ordering as CmpOrdering,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
  time::{Duration, Instant},
};

use crate::disposable::{CompositeDisposable, Disposable, SerialDisposable};

mod current_thread;
mod new_thread;
mod virtual_time;
pub use current_thread::CurrentThreadScheduler;
pub use new_thread::NewThreadScheduler;
pub use virtual_time::VirtualTimeScheduler;

/// A unit of schedulable work.
///
/// `run` receives the scheduler executing it so the task can schedule its
/// own continuation; a returned disposable covers that continuation and is
/// folded into the disposable the original schedule call handed out.
pub trait Task: Send + Sync {
  fn run(self: Arc<Self>, scheduler: &ArcScheduler) -> Option<Disposable>;
}

impl<F> Task for F
where
  F: Fn(&ArcScheduler) -> Option<Disposable> + Send + Sync,
{
  fn run(self: Arc<Self>, scheduler: &ArcScheduler) -> Option<Disposable> {
    (*self)(scheduler)
  }
}

/// Orders work onto an execution context.
pub trait Scheduler: Send + Sync {
  /// Current point on this scheduler's clock. Monotonic.
  fn now(&self) -> Instant;

  /// Normalizes a delay to seconds, for diagnostics and trace formatting.
  fn to_seconds(&self, delay: Duration) -> f64 { delay.as_secs_f64() }

  /// Runs `task` as soon as this scheduler's policy allows.
  fn schedule(&self, task: Arc<dyn Task>) -> Disposable {
    self.schedule_relative(Duration::ZERO, task)
  }

  /// Runs `task` once `delay` has elapsed on this scheduler's clock.
  fn schedule_relative(&self, delay: Duration, task: Arc<dyn Task>)
    -> Disposable;
}

/// Shared scheduler handle, the currency operators pass around.
pub type ArcScheduler = Arc<dyn Scheduler>;

/// One accepted schedule request: the task, its cancellation flag, and the
/// slot for whatever continuation disposable the task returns.
pub(crate) struct PendingTask {
  task: Arc<dyn Task>,
  cancelled: Arc<AtomicBool>,
  continuation: SerialDisposable,
}

impl PendingTask {
  pub(crate) fn new(task: Arc<dyn Task>) -> Self {
    Self {
      task,
      cancelled: Arc::new(AtomicBool::new(false)),
      continuation: SerialDisposable::new(),
    }
  }

  /// The disposable handed back to the schedule caller: flips the
  /// cancellation flag and covers the continuation.
  pub(crate) fn handle(&self) -> Disposable {
    let cancelled = self.cancelled.clone();
    CompositeDisposable::of([
      Disposable::new(move || cancelled.store(true, Ordering::Release)),
      self.continuation.clone().into(),
    ])
    .into()
  }

  pub(crate) fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::Acquire)
  }

  /// Runs the task unless cancelled, parking any continuation disposable.
  pub(crate) fn execute(&self, scheduler: &ArcScheduler) {
    if self.is_cancelled() {
      return;
    }
    if let Some(continuation) = self.task.clone().run(scheduler) {
      self.continuation.set(continuation);
    }
  }
}

/// Queue entry ordered by `(due, seq)`; `seq` keeps same-due entries FIFO.
/// The `Ord` impl is reversed so `BinaryHeap` pops the earliest entry first.
pub(crate) struct QueuedTask<T> {
  pub(crate) due: T,
  pub(crate) seq: u64,
  pub(crate) pending: PendingTask,
}

impl<T: Ord> PartialEq for QueuedTask<T> {
  fn eq(&self, other: &Self) -> bool {
    self.due == other.due && self.seq == other.seq
  }
}

impl<T: Ord> Eq for QueuedTask<T> {}

impl<T: Ord> PartialOrd for QueuedTask<T> {
  fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
    Some(self.cmp(other))
  }
}

impl<T: Ord> Ord for QueuedTask<T> {
  fn cmp(&self, other: &Self) -> CmpOrdering {
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.seq.cmp(&self.seq))
  }
}

#[cfg(test)]
mod test {
  use float_cmp::approx_eq;

  use super::*;

  #[test]
  fn to_seconds_normalizes_durations() {
    let scheduler = CurrentThreadScheduler::singleton();
    let secs = scheduler.to_seconds(Duration::from_millis(2500));
    assert!(approx_eq!(f64, secs, 2.5, ulps = 2));
  }

  #[test]
  fn queued_tasks_pop_earliest_first_then_fifo() {
    use std::collections::BinaryHeap;

    let mut heap = BinaryHeap::new();
    for (due, seq) in [(20u64, 0u64), (10, 1), (10, 2), (30, 3)] {
      heap.push(QueuedTask {
        due,
        seq,
        pending: PendingTask::new(Arc::new(
          |_: &ArcScheduler| -> Option<Disposable> { None },
        )),
      });
    }

    let order: Vec<_> =
      std::iter::from_fn(|| heap.pop().map(|e| (e.due, e.seq))).collect();
    assert_eq!(order, vec![(10, 1), (10, 2), (20, 0), (30, 3)]);
  }

  #[test]
  fn cancelled_pending_task_does_not_run() {
    use std::sync::atomic::AtomicUsize;

    let ran = Arc::new(AtomicUsize::new(0));
    let r = ran.clone();
    let pending = PendingTask::new(Arc::new(
      move |_: &ArcScheduler| -> Option<Disposable> {
        r.fetch_add(1, Ordering::SeqCst);
        None
      },
    ));
    let handle = pending.handle();

    handle.dispose();
    let scheduler: ArcScheduler = Arc::new(CurrentThreadScheduler);
    pending.execute(&scheduler);

    assert_eq!(ran.load(Ordering::SeqCst), 0);
  }
}
