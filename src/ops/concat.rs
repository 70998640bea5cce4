use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Mutex,
};

use crate::{
  disposable::{
    CompositeDisposable, Disposable, SerialDisposable,
    SingleAssignmentDisposable,
  },
  error::RxError,
  observable::Observable,
  observer::{Observer, SharedObserver},
  ops::SourceItem,
  scheduler::{ArcScheduler, CurrentThreadScheduler, Scheduler, Task},
};

type SourceIter<Item> =
  Box<dyn Iterator<Item = Result<Observable<Item>, RxError>> + Send>;

/// Concatenates a sequence of sources: each source is subscribed only after
/// the previous one completed, values are forwarded from whichever source
/// is active, and the first error ends the whole sequence immediately.
///
/// An empty sequence completes at once. A fault while pulling the next
/// source (an iterator yielding `Err`) is reported to the observer and
/// terminal.
pub fn concat<Item, S, I>(sources: I) -> Observable<Item>
where
  Item: Send + 'static,
  S: SourceItem<Item> + 'static,
  I: IntoIterator<Item = S> + Clone + Send + Sync + 'static,
  I::IntoIter: Send + 'static,
{
  Observable::new(move |observer, scheduler| {
    let ambient = scheduler
      .clone()
      .unwrap_or_else(CurrentThreadScheduler::singleton);
    let driver = Arc::new(ConcatDriver {
      sources: Mutex::new(Box::new(
        sources.clone().into_iter().map(S::into_source),
      ) as SourceIter<Item>),
      downstream: SharedObserver::new(observer),
      subscription: SerialDisposable::new(),
      cancelable: SerialDisposable::new(),
      disposed: AtomicBool::new(false),
      scheduler: ambient.clone(),
      subscribe_scheduler: scheduler,
    });

    driver.cancelable.set(ambient.schedule(driver.clone()));

    let guard = driver.clone();
    CompositeDisposable::of([
      driver.subscription.clone().into(),
      driver.cancelable.clone().into(),
      Disposable::new(move || {
        guard.disposed.store(true, Ordering::Release)
      }),
    ])
    .into()
  })
}

struct ConcatDriver<Item> {
  sources: Mutex<SourceIter<Item>>,
  downstream: SharedObserver<Item>,
  /// Active source's subscription; replacing it drops the previous one.
  subscription: SerialDisposable,
  /// The scheduled-but-not-yet-run advance action.
  cancelable: SerialDisposable,
  disposed: AtomicBool,
  scheduler: ArcScheduler,
  subscribe_scheduler: Option<ArcScheduler>,
}

impl<Item: Send + 'static> Task for ConcatDriver<Item> {
  fn run(self: Arc<Self>, _: &ArcScheduler) -> Option<Disposable> {
    if self.disposed.load(Ordering::Acquire) {
      return None;
    }
    let pulled = self.sources.lock().unwrap().next();
    match pulled {
      None => self.downstream.clone().on_completed(),
      Some(Err(err)) => self.downstream.clone().on_error(err),
      Some(Ok(source)) => {
        let slot = SingleAssignmentDisposable::new();
        self.subscription.set(slot.clone().into());
        let observer = ConcatSourceObserver {
          downstream: self.downstream.clone(),
          driver: self.clone(),
        };
        slot.set(
          source
            .subscribe_with(observer, self.subscribe_scheduler.clone()),
        );
      }
    }
    None
  }
}

struct ConcatSourceObserver<Item> {
  downstream: SharedObserver<Item>,
  driver: Arc<ConcatDriver<Item>>,
}

impl<Item: Send + 'static> Observer<Item> for ConcatSourceObserver<Item> {
  fn on_next(&mut self, value: Item) { self.downstream.on_next(value) }

  fn on_error(&mut self, err: RxError) { self.downstream.on_error(err) }

  fn on_completed(&mut self) {
    // Advance to the next source through the scheduler, never recursively.
    let driver = self.driver.clone();
    driver
      .cancelable
      .set(driver.scheduler.schedule(self.driver.clone()));
  }

  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}
