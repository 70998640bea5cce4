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

/// Continues a sequence terminated by an error with the next source:
/// completion propagates immediately, an error falls through to the next
/// source. When the sources run out, the last error seen (if any) is
/// reported; otherwise the observer completes.
///
/// A single perpetually failing source with no fallback therefore surfaces
/// its error rather than completing silently.
pub fn catch<Item, S, I>(sources: I) -> Observable<Item>
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
    let driver = Arc::new(CatchDriver {
      sources: Mutex::new(Box::new(
        sources.clone().into_iter().map(S::into_source),
      ) as SourceIter<Item>),
      downstream: SharedObserver::new(observer),
      last_error: Mutex::new(None),
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

struct CatchDriver<Item> {
  sources: Mutex<SourceIter<Item>>,
  downstream: SharedObserver<Item>,
  /// Most recent error a source failed with; replayed on exhaustion.
  last_error: Mutex<Option<RxError>>,
  subscription: SerialDisposable,
  cancelable: SerialDisposable,
  disposed: AtomicBool,
  scheduler: ArcScheduler,
  subscribe_scheduler: Option<ArcScheduler>,
}

impl<Item: Send + 'static> Task for CatchDriver<Item> {
  fn run(self: Arc<Self>, _: &ArcScheduler) -> Option<Disposable> {
    if self.disposed.load(Ordering::Acquire) {
      return None;
    }
    let pulled = self.sources.lock().unwrap().next();
    match pulled {
      None => match self.last_error.lock().unwrap().take() {
        Some(err) => self.downstream.clone().on_error(err),
        None => self.downstream.clone().on_completed(),
      },
      Some(Err(err)) => self.downstream.clone().on_error(err),
      Some(Ok(source)) => {
        let slot = SingleAssignmentDisposable::new();
        self.subscription.set(slot.clone().into());
        let observer = CatchSourceObserver {
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

struct CatchSourceObserver<Item> {
  downstream: SharedObserver<Item>,
  driver: Arc<CatchDriver<Item>>,
}

impl<Item: Send + 'static> Observer<Item> for CatchSourceObserver<Item> {
  fn on_next(&mut self, value: Item) { self.downstream.on_next(value) }

  fn on_error(&mut self, err: RxError) {
    // Remember the fault and fall through to the next source.
    let driver = self.driver.clone();
    *driver.last_error.lock().unwrap() = Some(err);
    driver
      .cancelable
      .set(driver.scheduler.schedule(self.driver.clone()));
  }

  fn on_completed(&mut self) { self.downstream.on_completed() }

  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}
