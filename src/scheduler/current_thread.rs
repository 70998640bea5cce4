use std::{
  cell::RefCell,
  collections::BinaryHeap,
  sync::Arc,
  thread,
  time::{Duration, Instant},
};

use once_cell::sync::Lazy;

use super::{ArcScheduler, PendingTask, QueuedTask, Scheduler, Task};
use crate::disposable::Disposable;

/// Trampoline scheduler.
///
/// The first schedule call on an otherwise idle thread becomes the drainer:
/// it pops the thread-local queue iteratively, sleeping until each entry is
/// due, until the queue is empty. Schedule calls nested inside a running
/// task only enqueue, so a chain of tasks that keep scheduling each other
/// runs as a loop with constant stack depth instead of native recursion.
#[derive(Clone, Copy, Default)]
pub struct CurrentThreadScheduler;

thread_local! {
  static TRAMPOLINE: RefCell<Trampoline> = RefCell::new(Trampoline::default());
}

#[derive(Default)]
struct Trampoline {
  draining: bool,
  next_seq: u64,
  queue: BinaryHeap<QueuedTask<Instant>>,
}

impl CurrentThreadScheduler {
  /// The shared instance operators fall back to when the caller supplies no
  /// scheduler.
  pub fn singleton() -> ArcScheduler {
    static SINGLETON: Lazy<ArcScheduler> =
      Lazy::new(|| Arc::new(CurrentThreadScheduler));
    SINGLETON.clone()
  }

  fn drain() {
    let scheduler: ArcScheduler = Arc::new(CurrentThreadScheduler);
    loop {
      // Pop inside a short borrow so running the task can re-enter
      // `schedule_relative` on this thread.
      let next = TRAMPOLINE.with(|t| t.borrow_mut().queue.pop());
      let Some(entry) = next else { break };
      if entry.pending.is_cancelled() {
        continue;
      }
      let now = Instant::now();
      if entry.due > now {
        thread::sleep(entry.due - now);
      }
      entry.pending.execute(&scheduler);
    }
    TRAMPOLINE.with(|t| t.borrow_mut().draining = false);
  }
}

impl Scheduler for CurrentThreadScheduler {
  fn now(&self) -> Instant { Instant::now() }

  fn schedule_relative(
    &self,
    delay: Duration,
    task: Arc<dyn Task>,
  ) -> Disposable {
    let pending = PendingTask::new(task);
    let handle = pending.handle();
    let due = Instant::now() + delay;

    let becomes_drainer = TRAMPOLINE.with(|t| {
      let mut trampoline = t.borrow_mut();
      let seq = trampoline.next_seq;
      trampoline.next_seq += 1;
      trampoline.queue.push(QueuedTask { due, seq, pending });
      if trampoline.draining {
        false
      } else {
        trampoline.draining = true;
        true
      }
    });

    if becomes_drainer {
      tracing::trace!(?delay, "trampoline drain begins");
      Self::drain();
    }
    handle
  }
}

#[cfg(test)]
mod test {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
  };

  use super::*;

  #[test]
  fn nested_schedules_run_after_the_current_task() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let scheduler = CurrentThreadScheduler::singleton();

    let o = order.clone();
    scheduler.schedule(Arc::new(
      move |scheduler: &ArcScheduler| -> Option<Disposable> {
        o.lock().unwrap().push("outer begins");
        let inner_log = o.clone();
        scheduler.schedule(Arc::new(
          move |_: &ArcScheduler| -> Option<Disposable> {
            inner_log.lock().unwrap().push("inner");
            None
          },
        ));
        o.lock().unwrap().push("outer ends");
        None
      },
    ));

    assert_eq!(
      *order.lock().unwrap(),
      vec!["outer begins", "outer ends", "inner"]
    );
  }

  /// A self-rescheduling chain deep enough to overflow the stack if the
  /// trampoline recursed instead of looping.
  #[test]
  fn self_rescheduling_is_stack_safe() {
    struct Countdown {
      remaining: AtomicUsize,
    }

    impl Task for Countdown {
      fn run(
        self: Arc<Self>,
        scheduler: &ArcScheduler,
      ) -> Option<Disposable> {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) > 1 {
          scheduler.schedule(self);
        }
        None
      }
    }

    let task = Arc::new(Countdown { remaining: AtomicUsize::new(100_000) });
    CurrentThreadScheduler::singleton().schedule(task.clone());

    assert_eq!(task.remaining.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn disposing_a_pending_entry_skips_it() {
    let ran = Arc::new(AtomicUsize::new(0));
    let scheduler = CurrentThreadScheduler::singleton();

    let r = ran.clone();
    scheduler.schedule(Arc::new(
      move |scheduler: &ArcScheduler| -> Option<Disposable> {
        let counter = r.clone();
        let pending = scheduler.schedule(Arc::new(
          move |_: &ArcScheduler| -> Option<Disposable> {
            counter.fetch_add(1, Ordering::SeqCst);
            None
          },
        ));
        // Cancelled while still queued behind this task.
        pending.dispose();
        None
      },
    ));

    assert_eq!(ran.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn relative_entries_run_in_due_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let scheduler = CurrentThreadScheduler::singleton();

    let o = order.clone();
    scheduler.schedule(Arc::new(
      move |scheduler: &ArcScheduler| -> Option<Disposable> {
        for (delay_ms, tag) in [(20u64, "late"), (0, "soon")] {
          let log = o.clone();
          scheduler.schedule_relative(
            Duration::from_millis(delay_ms),
            Arc::new(move |_: &ArcScheduler| -> Option<Disposable> {
              log.lock().unwrap().push(tag);
              None
            }),
          );
        }
        None
      },
    ));

    assert_eq!(*order.lock().unwrap(), vec!["soon", "late"]);
  }
}
