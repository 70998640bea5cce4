use std::{
  future::Future,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  },
};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::{
  disposable::{
    CompositeDisposable, Disposable, SerialDisposable,
    SingleAssignmentDisposable,
  },
  error::RxError,
  observable::{from_shared_future, Observable},
  observer::{Observer, SharedObserver},
  scheduler::{ArcScheduler, CurrentThreadScheduler, Scheduler, Task},
};

/// One source position of [`on_error_resume_next`]: a ready observable, a
/// factory fed the previous source's error, or a future resolved to a
/// single-value observable. Resolution to a concrete observable happens at
/// subscribe time, right before the source is subscribed.
pub enum ResumeSource<Item> {
  Source(Observable<Item>),
  Factory(Arc<dyn Fn(Option<RxError>) -> Observable<Item> + Send + Sync>),
  Future(Shared<BoxFuture<'static, Item>>),
}

impl<Item> ResumeSource<Item> {
  pub fn factory(
    f: impl Fn(Option<RxError>) -> Observable<Item> + Send + Sync + 'static,
  ) -> Self {
    Self::Factory(Arc::new(f))
  }

  pub fn future(future: impl Future<Output = Item> + Send + 'static) -> Self
  where
    Item: Clone,
  {
    Self::Future(future.boxed().shared())
  }
}

impl<Item> ResumeSource<Item>
where
  Item: Clone + Send + Sync + 'static,
{
  fn resolve(self, error: Option<RxError>) -> Observable<Item> {
    match self {
      Self::Source(source) => source,
      Self::Factory(factory) => factory(error),
      Self::Future(future) => from_shared_future(future),
    }
  }
}

impl<Item> Clone for ResumeSource<Item> {
  fn clone(&self) -> Self {
    match self {
      Self::Source(source) => Self::Source(source.clone()),
      Self::Factory(factory) => Self::Factory(factory.clone()),
      Self::Future(future) => Self::Future(future.clone()),
    }
  }
}

impl<Item> From<Observable<Item>> for ResumeSource<Item> {
  fn from(source: Observable<Item>) -> Self { Self::Source(source) }
}

/// Concatenates sources regardless of how each one terminates: completion
/// and error both advance to the next source, and the discarded error is
/// handed to factory sources. When the sources run out the observer
/// completes unconditionally, so a trailing fault never reaches it.
pub fn on_error_resume_next<Item, S, I>(sources: I) -> Observable<Item>
where
  Item: Clone + Send + Sync + 'static,
  S: Into<ResumeSource<Item>> + 'static,
  I: IntoIterator<Item = S> + Clone + Send + Sync + 'static,
  I::IntoIter: Send + 'static,
{
  Observable::new(move |observer, scheduler| {
    let ambient = scheduler
      .clone()
      .unwrap_or_else(CurrentThreadScheduler::singleton);
    let driver = Arc::new(ResumeDriver {
      sources: Mutex::new(Box::new(
        sources.clone().into_iter().map(S::into),
      )
        as Box<dyn Iterator<Item = ResumeSource<Item>> + Send>),
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

struct ResumeDriver<Item> {
  sources: Mutex<Box<dyn Iterator<Item = ResumeSource<Item>> + Send>>,
  downstream: SharedObserver<Item>,
  /// Error the previous source ended with, consumed by factory sources.
  last_error: Mutex<Option<RxError>>,
  subscription: SerialDisposable,
  cancelable: SerialDisposable,
  disposed: AtomicBool,
  scheduler: ArcScheduler,
  subscribe_scheduler: Option<ArcScheduler>,
}

impl<Item> Task for ResumeDriver<Item>
where
  Item: Clone + Send + Sync + 'static,
{
  fn run(self: Arc<Self>, _: &ArcScheduler) -> Option<Disposable> {
    if self.disposed.load(Ordering::Acquire) {
      return None;
    }
    let pulled = self.sources.lock().unwrap().next();
    match pulled {
      None => self.downstream.clone().on_completed(),
      Some(next) => {
        let error = self.last_error.lock().unwrap().take();
        let source = next.resolve(error);
        let slot = SingleAssignmentDisposable::new();
        self.subscription.set(slot.clone().into());
        let observer = ResumeSourceObserver {
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

struct ResumeSourceObserver<Item> {
  downstream: SharedObserver<Item>,
  driver: Arc<ResumeDriver<Item>>,
}

impl<Item> ResumeSourceObserver<Item>
where
  Item: Clone + Send + Sync + 'static,
{
  fn advance(&self) {
    let driver = self.driver.clone();
    driver
      .cancelable
      .set(driver.scheduler.schedule(self.driver.clone()));
  }
}

impl<Item> Observer<Item> for ResumeSourceObserver<Item>
where
  Item: Clone + Send + Sync + 'static,
{
  fn on_next(&mut self, value: Item) { self.downstream.on_next(value) }

  fn on_error(&mut self, err: RxError) {
    *self.driver.last_error.lock().unwrap() = Some(err);
    self.advance();
  }

  fn on_completed(&mut self) { self.advance() }

  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}

#[cfg(test)]
mod test {
  use futures::future;
  use thiserror::Error;

  use super::*;
  use crate::{
    error::rx_error,
    observable::{from_iter, throw},
  };

  #[derive(Debug, Error)]
  #[error("{0}")]
  struct TestError(&'static str);

  fn collect(source: &Observable<i32>) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (values, errors, completions) =
      (log.clone(), log.clone(), log.clone());
    source.subscribe_all(
      move |v| values.lock().unwrap().push(format!("next {v}")),
      move |e| errors.lock().unwrap().push(format!("error {e}")),
      move || completions.lock().unwrap().push("complete".into()),
    );
    log
  }

  #[test]
  fn a_fault_never_reaches_the_observer() {
    let log = collect(&on_error_resume_next([
      ResumeSource::from(throw::<i32>(rx_error(TestError("boom")))),
      ResumeSource::from(from_iter(vec![5])),
    ]));
    assert_eq!(*log.lock().unwrap(), vec!["next 5", "complete"]);
  }

  #[test]
  fn completion_also_advances_to_the_next_source() {
    let log = collect(&on_error_resume_next([
      ResumeSource::from(from_iter(vec![1])),
      ResumeSource::from(from_iter(vec![2])),
    ]));
    assert_eq!(
      *log.lock().unwrap(),
      vec!["next 1", "next 2", "complete"]
    );
  }

  #[test]
  fn factories_receive_the_previous_error() {
    let seen = Arc::new(Mutex::new(None));
    let s = seen.clone();
    let log = collect(&on_error_resume_next([
      ResumeSource::from(throw::<i32>(rx_error(TestError("handed over")))),
      ResumeSource::factory(move |error| {
        *s.lock().unwrap() = error.map(|e| e.to_string());
        from_iter(vec![3])
      }),
    ]));

    assert_eq!(*log.lock().unwrap(), vec!["next 3", "complete"]);
    assert_eq!(seen.lock().unwrap().as_deref(), Some("handed over"));
  }

  #[test]
  fn factories_after_a_clean_source_receive_none() {
    let seen = Arc::new(Mutex::new(Some("sentinel".to_string())));
    let s = seen.clone();
    collect(&on_error_resume_next([
      ResumeSource::from(from_iter(vec![1])),
      ResumeSource::factory(move |error| {
        *s.lock().unwrap() = error.map(|e| e.to_string());
        from_iter(vec![2])
      }),
    ]));
    assert_eq!(*seen.lock().unwrap(), None);
  }

  #[test]
  fn future_sources_resolve_before_subscription() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (values, completions) = (log.clone(), log.clone());
    let (tx, rx) = std::sync::mpsc::channel();
    on_error_resume_next([ResumeSource::future(future::ready(11))])
      .subscribe_all(
        move |v| values.lock().unwrap().push(format!("next {v}")),
        |_| {},
        move || {
          completions.lock().unwrap().push("complete".into());
          tx.send(()).unwrap();
        },
      );

    rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["next 11", "complete"]);
  }

  #[test]
  fn empty_source_list_completes_immediately() {
    let log =
      collect(&on_error_resume_next(Vec::<ResumeSource<i32>>::new()));
    assert_eq!(*log.lock().unwrap(), vec!["complete"]);
  }
}
