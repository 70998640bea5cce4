//! Re-exports of the types most callers need.

pub use crate::disposable::{
  CompositeDisposable, Disposable, DisposableLike, SerialDisposable,
  SingleAssignmentDisposable,
};
pub use crate::error::{rx_error, OutOfRangeError, RxError};
pub use crate::observable::{
  empty, from_future, from_future_result, from_iter, never, of, throw,
  timer, Observable,
};
pub use crate::observer::{
  BoxedObserver, CallbackObserver, Observer, SharedObserver,
};
pub use crate::ops::{
  catch, concat, on_error_resume_next, ResumeSource, SourceItem,
};
pub use crate::scheduler::{
  ArcScheduler, CurrentThreadScheduler, NewThreadScheduler, Scheduler,
  Task, VirtualTimeScheduler,
};
pub use crate::subscriber::Subscriber;
