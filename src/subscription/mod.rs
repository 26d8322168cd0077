//! Provides structures and traits related to subscription management.
//!
//! This module includes `Subscriber`, the sink a producer pushes values, errors and
//! completion into, `Handlers`, the caller-supplied callbacks a `Subscriber`
//! dispatches to, and `Subscription`, the handle used to cancel an observation and
//! to link other subscriptions to it.
//!
//! Cleanup a producer returns is modelled by `Teardown`.
pub mod subscribe;
pub(crate) mod teardown;

use std::sync::{Mutex, MutexGuard, PoisonError};

// A panicking handler must not wedge the subscription, so poisoned locks are
// recovered.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
