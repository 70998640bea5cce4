//! # rxkernel: a push-based reactive-stream runtime
//!
//! A small substrate for composing asynchronous, possibly infinite,
//! sequences of values with uniform cancellation, error propagation and
//! pluggable execution policy.
//!
//! ## Quick start
//!
//! ```rust
//! use rxkernel::prelude::*;
//!
//! let subscription = from_iter(0..4)
//!   .element_at_or_default(2, None)
//!   .subscribe(|v| println!("got {v}"));
//! subscription.dispose();
//! ```
//!
//! ## Key concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Immutable description of a producer; work starts on subscribe |
//! | [`Observer`] | Consumes `on_next`, `on_error` and `on_completed` events |
//! | [`Disposable`] | Handle releasing one subscription, idempotently |
//! | [`Scheduler`] | Decides where and when scheduled work runs |
//!
//! Schedulers come in three flavors: a trampolined current-thread
//! scheduler (the default), a dedicated-thread scheduler, and a virtual
//! clock for deterministic timing tests.
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Disposable`]: disposable::Disposable
//! [`Scheduler`]: scheduler::Scheduler

pub mod disposable;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod scheduler;
pub mod subscriber;

pub use prelude::*;
