//! `rxlife` is a small push-based observable runtime with deterministic teardown.
//!
//! An [`Observable`] wraps a producer function. Each call to `subscribe` runs the
//! producer with a fresh [`Subscriber`](subscribe::Subscriber) and returns a
//! [`Subscription`](subscribe::Subscription). The producer pushes values with
//! `next`, finishes with `complete` or `error`, and returns a
//! [`Teardown`](subscribe::Teardown) that releases whatever it started, such as
//! timers or inner subscriptions.
//!
//! Teardown runs exactly once, on the first of:
//!
//! - the subscription being unsubscribed, directly or through a parent it was
//!   linked to with `add`,
//! - the producer calling `complete`,
//! - the producer calling `error`.
//!
//! ```
//! use std::sync::{
//!     atomic::{AtomicBool, Ordering},
//!     Arc,
//! };
//!
//! use rxlife::subscribe::{Handlers, Teardown, Unsubscribeable};
//! use rxlife::{Observable, Observer, Subscribeable};
//!
//! let released = Arc::new(AtomicBool::new(false));
//! let released_c = Arc::clone(&released);
//!
//! let observable = Observable::new(move |mut subscriber| {
//!     subscriber.next(1);
//!     let released_c = Arc::clone(&released_c);
//!     Teardown::new(move || released_c.store(true, Ordering::SeqCst))
//! });
//!
//! let subscription = observable.subscribe(Handlers::new().on_next(|v: i32| println!("{}", v)));
//! assert!(!released.load(Ordering::SeqCst));
//!
//! subscription.unsubscribe();
//! assert!(released.load(Ordering::SeqCst));
//! ```

mod errors;
mod observable;
pub mod observer;
mod subscription;
pub mod timer;

pub use errors::*;
pub use observable::Observable;
pub use observer::Observer;
pub use subscription::subscribe;
pub use subscription::subscribe::{Subscribeable, Unsubscribeable};
