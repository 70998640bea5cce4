//! Operators over [`Observable`](crate::observable::Observable).
//!
//! The sequential-fallback family (`concat`, `catch`,
//! `on_error_resume_next`) drives an iterator of sources through a
//! scheduler-owned action loop; the state-gated family (`skip_until`,
//! `element_at_or_default`) runs synchronized shared-state transitions
//! under concurrent notification delivery.

use crate::{error::RxError, observable::Observable};

pub mod catch;
pub mod concat;
pub mod element_at_or_default;
pub mod on_error_resume_next;
pub mod skip_until;
pub mod to_marbles;

pub use catch::catch;
pub use concat::concat;
pub use on_error_resume_next::{on_error_resume_next, ResumeSource};

/// Item of a source sequence driven by the sequential-fallback operators.
///
/// Implemented for plain observables and for `Result`, so an iterator can
/// interleave ready sources with pull-time faults: yielding `Err` is the
/// fallible-generator case, reported to the observer and terminal for the
/// subscription.
pub trait SourceItem<Item> {
  fn into_source(self) -> Result<Observable<Item>, RxError>;
}

impl<Item> SourceItem<Item> for Observable<Item> {
  fn into_source(self) -> Result<Observable<Item>, RxError> { Ok(self) }
}

impl<Item> SourceItem<Item> for Result<Observable<Item>, RxError> {
  fn into_source(self) -> Result<Observable<Item>, RxError> { self }
}
