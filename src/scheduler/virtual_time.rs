use std::{
  collections::BinaryHeap,
  sync::{Arc, Mutex},
  time::{Duration, Instant},
};

use super::{ArcScheduler, PendingTask, QueuedTask, Scheduler, Task};
use crate::disposable::Disposable;

/// Virtual-clock scheduler for deterministic timing.
///
/// Nothing runs until the clock is driven: [`advance_to`] /
/// [`advance_by`] pop due entries in `(due, seq)` order, moving the clock
/// to each entry's due time before executing it, and [`run`] drains the
/// queue completely. Clones share the same clock and queue.
///
/// [`advance_to`]: VirtualTimeScheduler::advance_to
/// [`advance_by`]: VirtualTimeScheduler::advance_by
/// [`run`]: VirtualTimeScheduler::run
#[derive(Clone)]
pub struct VirtualTimeScheduler {
  inner: Arc<Inner>,
}

struct Inner {
  origin: Instant,
  state: Mutex<State>,
}

#[derive(Default)]
struct State {
  elapsed: Duration,
  next_seq: u64,
  queue: BinaryHeap<QueuedTask<Duration>>,
}

impl VirtualTimeScheduler {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Inner {
        origin: Instant::now(),
        state: Mutex::new(State::default()),
      }),
    }
  }

  /// Virtual time elapsed since the scheduler was created.
  pub fn elapsed(&self) -> Duration {
    self.inner.state.lock().unwrap().elapsed
  }

  pub fn pending_count(&self) -> usize {
    self.inner.state.lock().unwrap().queue.len()
  }

  /// Moves the clock forward to `due`, executing every entry scheduled at
  /// or before it. Tasks scheduled while draining take part if they are due
  /// in time.
  pub fn advance_to(&self, due: Duration) {
    let scheduler: ArcScheduler = Arc::new(self.clone());
    loop {
      let next = {
        let mut state = self.inner.state.lock().unwrap();
        let ready =
          state.queue.peek().is_some_and(|entry| entry.due <= due);
        if !ready {
          None
        } else {
          let entry = state.queue.pop().unwrap();
          state.elapsed = state.elapsed.max(entry.due);
          Some(entry)
        }
      };
      // Run outside the lock so the task can schedule more work.
      let Some(entry) = next else { break };
      entry.pending.execute(&scheduler);
    }

    let mut state = self.inner.state.lock().unwrap();
    state.elapsed = state.elapsed.max(due);
    tracing::trace!(elapsed = ?state.elapsed, "virtual clock advanced");
  }

  /// Moves the clock forward by `delta`.
  pub fn advance_by(&self, delta: Duration) {
    self.advance_to(self.elapsed() + delta);
  }

  /// Executes every pending entry, advancing the clock as far as needed.
  pub fn run(&self) {
    loop {
      let horizon = {
        let state = self.inner.state.lock().unwrap();
        state.queue.peek().map(|entry| entry.due)
      };
      let Some(due) = horizon else { break };
      self.advance_to(due);
    }
  }
}

impl Default for VirtualTimeScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for VirtualTimeScheduler {
  fn now(&self) -> Instant { self.inner.origin + self.elapsed() }

  fn schedule_relative(
    &self,
    delay: Duration,
    task: Arc<dyn Task>,
  ) -> Disposable {
    let pending = PendingTask::new(task);
    let handle = pending.handle();

    let mut state = self.inner.state.lock().unwrap();
    let due = state.elapsed + delay;
    let seq = state.next_seq;
    state.next_seq += 1;
    state.queue.push(QueuedTask { due, seq, pending });
    handle
  }
}

#[cfg(test)]
mod test {
  use std::sync::Mutex;

  use super::*;

  fn record(
    log: &Arc<Mutex<Vec<&'static str>>>,
    tag: &'static str,
  ) -> Arc<dyn Task> {
    let log = log.clone();
    Arc::new(move |_: &ArcScheduler| -> Option<Disposable> {
      log.lock().unwrap().push(tag);
      None
    })
  }

  #[test]
  fn nothing_runs_until_the_clock_is_driven() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let scheduler = VirtualTimeScheduler::new();

    scheduler.schedule(record(&log, "immediate"));
    scheduler
      .schedule_relative(Duration::from_millis(100), record(&log, "later"));
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(scheduler.pending_count(), 2);

    scheduler.advance_by(Duration::ZERO);
    assert_eq!(*log.lock().unwrap(), vec!["immediate"]);

    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*log.lock().unwrap(), vec!["immediate", "later"]);
  }

  #[test]
  fn entries_run_in_due_order_with_the_clock_following() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let scheduler = VirtualTimeScheduler::new();

    scheduler
      .schedule_relative(Duration::from_millis(300), record(&log, "c"));
    scheduler
      .schedule_relative(Duration::from_millis(100), record(&log, "a"));
    scheduler
      .schedule_relative(Duration::from_millis(200), record(&log, "b"));

    scheduler.run();
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    assert_eq!(scheduler.elapsed(), Duration::from_millis(300));
  }

  #[test]
  fn now_reflects_virtual_elapsed_time() {
    let scheduler = VirtualTimeScheduler::new();
    let start = scheduler.now();

    scheduler.advance_by(Duration::from_secs(7));
    assert_eq!(scheduler.now() - start, Duration::from_secs(7));
  }

  #[test]
  fn disposed_entries_are_skipped() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let scheduler = VirtualTimeScheduler::new();

    let handle = scheduler
      .schedule_relative(Duration::from_millis(50), record(&log, "gone"));
    scheduler
      .schedule_relative(Duration::from_millis(60), record(&log, "kept"));
    handle.dispose();

    scheduler.run();
    assert_eq!(*log.lock().unwrap(), vec!["kept"]);
  }

  #[test]
  fn tasks_scheduled_while_draining_take_part() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let scheduler = VirtualTimeScheduler::new();

    let l = log.clone();
    scheduler.schedule_relative(
      Duration::from_millis(10),
      Arc::new(move |scheduler: &ArcScheduler| -> Option<Disposable> {
        l.lock().unwrap().push("first");
        let nested = l.clone();
        scheduler.schedule_relative(
          Duration::from_millis(10),
          Arc::new(move |_: &ArcScheduler| -> Option<Disposable> {
            nested.lock().unwrap().push("nested");
            None
          }),
        );
        None
      }),
    );

    scheduler.advance_by(Duration::from_millis(20));
    assert_eq!(*log.lock().unwrap(), vec!["first", "nested"]);
  }
}
