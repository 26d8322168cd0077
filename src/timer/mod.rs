//! Timer service producers use to schedule delayed and repeating work.
//!
//! The observable core does not depend on this module. It exists so that a producer
//! has a concrete interval/timeout facility whose cancel handle can be returned as
//! its [`Teardown`], for example:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use rxlife::{timer::{Scheduler, TokioTimer}, Observable, Observer};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let timer = TokioTimer::current().expect("inside a Tokio runtime");
//!
//! let interval = Observable::new(move |mut subscriber| {
//!     let mut count = 0;
//!     timer
//!         .schedule_repeating(Duration::from_secs(1), move || {
//!             count += 1;
//!             subscriber.next(count);
//!         })
//!         .into()
//! });
//! # let _ = interval;
//! # }
//! ```
//!
//! [`Teardown`]: crate::subscribe::Teardown

use std::time::Duration;

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::ObservableError;

/// Smallest period a repeating timer runs with. Shorter periods are raised to it.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Schedules callbacks to run later, once or repeatedly.
pub trait Scheduler {
    /// Runs `callback` every `period`, first one `period` after this call.
    fn schedule_repeating<F>(&self, period: Duration, callback: F) -> TimerHandle
    where
        F: FnMut() + Send + 'static;

    /// Runs `callback` once, `delay` after this call.
    fn schedule_once<F>(&self, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static;
}

/// Cancel handle for a scheduled timer.
///
/// Dropping the handle does not stop the timer, same as losing the id of a host
/// interval. Cancel it, or hand it to the subscription as its teardown.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Stops the timer. A callback already running finishes, later firings never
    /// happen. Cancelling twice is harmless.
    pub fn cancel(&self) {
        if !self.task.is_finished() {
            tracing::debug!("timer cancelled");
        }
        self.task.abort();
    }

    /// Returns `true` once a one-shot timer fired or any timer was cancelled and
    /// its task wound down.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// [`Scheduler`] backed by a Tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    handle: Handle,
    missed_tick_behavior: MissedTickBehavior,
}

impl TokioTimer {
    /// Uses the runtime the current thread runs in.
    ///
    /// # Errors
    ///
    /// Returns [`ObservableError::NoRuntime`] when called outside a Tokio runtime.
    pub fn current() -> Result<Self, ObservableError> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|_| ObservableError::NoRuntime)
    }

    /// Uses the runtime behind `handle`, handy when scheduling from plain threads.
    #[must_use]
    pub fn with_handle(handle: Handle) -> Self {
        TokioTimer {
            handle,
            missed_tick_behavior: MissedTickBehavior::Delay,
        }
    }

    /// Sets what a repeating timer does when the runtime falls behind. Defaults to
    /// [`MissedTickBehavior::Delay`], which never fires a burst of catch-up ticks.
    #[must_use]
    pub fn missed_tick_behavior(mut self, behavior: MissedTickBehavior) -> Self {
        self.missed_tick_behavior = behavior;
        self
    }
}

impl Scheduler for TokioTimer {
    fn schedule_repeating<F>(&self, period: Duration, mut callback: F) -> TimerHandle
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let behavior = self.missed_tick_behavior;
        let _guard = self.handle.enter();
        let start = Instant::now() + period;

        let task = self.handle.spawn(async move {
            let mut interval = time::interval_at(start, period);
            interval.set_missed_tick_behavior(behavior);
            loop {
                interval.tick().await;
                callback();
            }
        });
        tracing::trace!(?period, "repeating timer scheduled");
        TimerHandle { task }
    }

    fn schedule_once<F>(&self, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let _guard = self.handle.enter();
        let deadline = Instant::now() + delay;

        let task = self.handle.spawn(async move {
            time::sleep_until(deadline).await;
            callback();
        });
        tracing::trace!(?delay, "one-shot timer scheduled");
        TimerHandle { task }
    }
}
