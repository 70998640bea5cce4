use std::{
  fmt::Display,
  sync::Mutex,
  time::{Duration, Instant},
};

use crate::{
  error::RxError,
  observable::Observable,
  observer::{Observer, SharedObserver},
  scheduler::{ArcScheduler, NewThreadScheduler, Scheduler},
};

impl<Item: Display + Send + 'static> Observable<Item> {
  /// Serializes the sequence into a marble-diagram string, emitted as a
  /// single value once the source terminates.
  ///
  /// Between consecutive notifications a dash run of
  /// `round(elapsed_seconds / timespan)` characters is inserted, ties
  /// rounding to even. Values and errors are stringified via `Display` and
  /// parenthesized when longer than one character; completion appends `|`.
  /// Elapsed time is read from `scheduler` (falling back to the
  /// subscribe-time scheduler, then to a dedicated thread), so driving a
  /// virtual clock yields fully deterministic diagrams.
  ///
  /// # Panics
  ///
  /// Panics if `timespan` is zero.
  pub fn to_marbles(
    &self,
    timespan: Duration,
    scheduler: Option<ArcScheduler>,
  ) -> Observable<String> {
    assert!(!timespan.is_zero(), "marble timespan must be non-zero");
    let source = self.clone();
    Observable::new(move |observer, subscribe_scheduler| {
      let scheduler = scheduler
        .clone()
        .or_else(|| subscribe_scheduler.clone())
        .unwrap_or_else(NewThreadScheduler::singleton);
      let inner = MarblesObserver {
        downstream: SharedObserver::new(observer),
        scheduler: scheduler.clone(),
        timespan,
        state: Mutex::new(MarbleState {
          last: scheduler.now(),
          fragments: Vec::new(),
        }),
      };
      source.subscribe_with(inner, Some(scheduler))
    })
  }
}

struct MarblesObserver {
  downstream: SharedObserver<String>,
  scheduler: ArcScheduler,
  timespan: Duration,
  state: Mutex<MarbleState>,
}

struct MarbleState {
  last: Instant,
  fragments: Vec<String>,
}

impl MarblesObserver {
  fn add_timespan(&self) {
    let mut state = self.state.lock().unwrap();
    let now = self.scheduler.now();
    let elapsed = now.duration_since(state.last);
    state.last = now;

    let secs = self.scheduler.to_seconds(elapsed);
    let dashes =
      (secs / self.timespan.as_secs_f64()).round_ties_even() as usize;
    state.fragments.push("-".repeat(dashes));
  }

  fn push(&self, token: String) {
    self.state.lock().unwrap().fragments.push(token);
  }

  fn flush(&mut self) {
    let diagram = self.state.lock().unwrap().fragments.concat();
    self.downstream.on_next(diagram);
    self.downstream.on_completed();
  }
}

impl<Item: Display> Observer<Item> for MarblesObserver {
  fn on_next(&mut self, value: Item) {
    self.add_timespan();
    self.push(stringify(&value));
  }

  fn on_error(&mut self, err: RxError) {
    self.add_timespan();
    self.push(stringify(&err));
    self.flush();
  }

  fn on_completed(&mut self) {
    self.add_timespan();
    self.push("|".to_string());
    self.flush();
  }

  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}

/// Single-character tokens stand alone; anything longer is parenthesized so
/// the diagram stays unambiguous.
fn stringify(value: &impl Display) -> String {
  let token = value.to_string();
  if token.chars().count() > 1 {
    format!("({token})")
  } else {
    token
  }
}

#[cfg(test)]
mod test {
  use std::sync::Arc;

  use thiserror::Error;

  use super::*;
  use crate::{
    disposable::Disposable,
    observable::{of, throw},
    observer::BoxedObserver,
    scheduler::VirtualTimeScheduler,
  };

  #[derive(Debug, Error)]
  #[error("{0}")]
  struct TestError(&'static str);

  fn capture(
    source: &Observable<String>,
    scheduler: &VirtualTimeScheduler,
  ) -> Arc<Mutex<Option<String>>> {
    let got = Arc::new(Mutex::new(None));
    let g = got.clone();
    source.subscribe_with(
      crate::observer::CallbackObserver::new(
        move |marbles: String| *g.lock().unwrap() = Some(marbles),
        |_| {},
        || {},
      ),
      Some(Arc::new(scheduler.clone()) as ArcScheduler),
    );
    got
  }

  /// Emits `1` at 100 ms and `2` plus completion at 350 ms, all on the
  /// subscribe-time scheduler.
  fn timed_source() -> Observable<i32> {
    Observable::new(move |observer: BoxedObserver<i32>, scheduler| {
      let scheduler =
        scheduler.expect("test source needs an explicit scheduler");
      let observer = SharedObserver::new(observer);

      let first = observer.clone();
      scheduler.schedule_relative(
        Duration::from_millis(100),
        Arc::new(move |_: &ArcScheduler| -> Option<Disposable> {
          first.clone().on_next(1);
          None
        }),
      );
      let second = observer.clone();
      scheduler.schedule_relative(
        Duration::from_millis(350),
        Arc::new(move |_: &ArcScheduler| -> Option<Disposable> {
          let mut observer = second.clone();
          observer.on_next(2);
          observer.on_completed();
          None
        }),
      );
      Disposable::empty()
    })
  }

  #[test]
  fn elapsed_time_becomes_dash_runs() {
    let clock = VirtualTimeScheduler::new();
    let source =
      timed_source().to_marbles(Duration::from_millis(100), None);
    let got = capture(&source, &clock);

    clock.run();
    // 0.10 s -> one dash; 0.25 s between the values is 2.5 timespans and
    // the tie rounds to even, so two dashes.
    assert_eq!(got.lock().unwrap().as_deref(), Some("-1--2|"));
  }

  #[test]
  fn multi_character_tokens_are_parenthesized() {
    let clock = VirtualTimeScheduler::new();
    let source = of(10).to_marbles(Duration::from_millis(100), None);
    let got = capture(&source, &clock);

    assert_eq!(got.lock().unwrap().as_deref(), Some("(10)|"));
  }

  #[test]
  fn errors_are_stringified_without_a_terminator() {
    let clock = VirtualTimeScheduler::new();
    let source = throw::<i32>(crate::error::rx_error(TestError("boom")))
      .to_marbles(Duration::from_millis(100), None);
    let got = capture(&source, &clock);

    assert_eq!(got.lock().unwrap().as_deref(), Some("(boom)"));
  }

  #[test]
  #[should_panic(expected = "timespan must be non-zero")]
  fn zero_timespan_is_a_usage_fault() {
    of(1).to_marbles(Duration::ZERO, None);
  }
}
