//! Error currency of the stream runtime.
//!
//! Errors travel through `on_error` as shared trait objects: operators that
//! remember or replay a fault (`catch`, `on_error_resume_next`) clone the
//! handle instead of requiring the error type itself to be `Clone`.

use std::sync::Arc;

use thiserror::Error;

/// A stream fault. Cheap to clone and safe to move across threads.
pub type RxError = Arc<dyn std::error::Error + Send + Sync>;

/// Wraps a concrete error into the shared [`RxError`] currency.
pub fn rx_error(err: impl std::error::Error + Send + Sync + 'static) -> RxError {
  Arc::new(err)
}

/// A sequence ended before the requested element index was reached.
#[derive(Debug, Clone, Error)]
#[error("sequence has no element at index {0}")]
pub struct OutOfRangeError(pub usize);
