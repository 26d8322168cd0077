use std::{fmt, future::Future, pin::Pin};

use tokio::runtime::Handle;

use crate::{
    subscribe::{Subscription, Unsubscribeable},
    timer::TimerHandle,
};

/// Cleanup a producer hands back to the subscription it runs under.
///
/// The subscription runs it exactly once, on the first of: `unsubscribe`,
/// `complete`, `error`. If the subscription is already closed when the teardown is
/// registered, it runs right away.
pub enum Teardown {
    /// Nothing to clean up.
    Nil,

    /// Cleanup defined by a function.
    Logic(Box<dyn FnOnce() + Send>),

    /// Another subscription this one depends on. It is unsubscribed on teardown.
    Wrapped(Subscription),

    /// A timer the producer scheduled. It is cancelled on teardown.
    Timer(TimerHandle),

    /// Asynchronous cleanup. Spawned on the Tokio runtime that was current when the
    /// subscription was created, without waiting for it to finish.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

impl Teardown {
    /// Cleanup defined by `f`.
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Teardown::Logic(Box::new(f))
    }

    /// Asynchronous cleanup defined by `future`.
    pub fn future(future: impl Future<Output = ()> + Send + 'static) -> Self {
        Teardown::Future(Box::pin(future))
    }

    pub(crate) fn run(self, runtime_handle: Option<&Handle>) {
        match self {
            Teardown::Nil => (),
            Teardown::Logic(fnc) => fnc(),
            Teardown::Wrapped(subscription) => subscription.unsubscribe(),
            Teardown::Timer(timer) => timer.cancel(),
            Teardown::Future(future) => match runtime_handle {
                Some(handle) => {
                    handle.spawn(future);
                }
                None => {
                    tracing::warn!(
                        "asynchronous teardown dropped, subscription was created outside of a Tokio runtime"
                    );
                }
            },
        }
    }
}

impl Default for Teardown {
    fn default() -> Self {
        Teardown::Nil
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Teardown::Nil => f.write_str("Nil"),
            Teardown::Logic(_) => f.write_str("Logic(..)"),
            Teardown::Wrapped(s) => f.debug_tuple("Wrapped").field(s).finish(),
            Teardown::Timer(t) => f.debug_tuple("Timer").field(t).finish(),
            Teardown::Future(_) => f.write_str("Future(..)"),
        }
    }
}

impl From<TimerHandle> for Teardown {
    fn from(timer: TimerHandle) -> Self {
        Teardown::Timer(timer)
    }
}

impl From<Subscription> for Teardown {
    fn from(subscription: Subscription) -> Self {
        Teardown::Wrapped(subscription)
    }
}

impl From<Option<Teardown>> for Teardown {
    fn from(teardown: Option<Teardown>) -> Self {
        teardown.unwrap_or_default()
    }
}

pub(crate) type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Everything a subscription has to run when it closes, taken out of the registry so
/// it can run with no lock held.
pub(crate) struct Closing {
    pub(crate) release: Option<ReleaseFn>,
    pub(crate) teardowns: Vec<Teardown>,
    pub(crate) children: Vec<Subscription>,
}

/// Cleanup actions and linked children owned by one subscription.
///
/// Mutators never run callbacks themselves. They hand back whatever must run so the
/// caller can release the lock first.
#[derive(Default)]
pub(crate) struct TeardownRegistry {
    closed: bool,
    // Drops the subscriber's handlers; set once when the subscriber is created.
    release: Option<ReleaseFn>,
    teardowns: Vec<Teardown>,
    children: Vec<Subscription>,
}

impl TeardownRegistry {
    pub(crate) fn closed() -> Self {
        TeardownRegistry {
            closed: true,
            ..Self::default()
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn len(&self) -> usize {
        self.children.len()
    }

    /// Marks the registry closed. Returns `None` if it was closed already.
    pub(crate) fn close(&mut self) -> Option<Closing> {
        if self.closed {
            return None;
        }
        self.closed = true;
        Some(Closing {
            release: self.release.take(),
            teardowns: std::mem::take(&mut self.teardowns),
            children: std::mem::take(&mut self.children),
        })
    }

    /// Returns the teardown back when the registry is closed and it must run now.
    pub(crate) fn push_teardown(&mut self, teardown: Teardown) -> Option<Teardown> {
        if self.closed {
            return Some(teardown);
        }
        if let Teardown::Nil = teardown {
            return None;
        }
        if !self.teardowns.is_empty() {
            tracing::debug!("additional teardown registered, it runs after the first");
        }
        self.teardowns.push(teardown);
        None
    }

    pub(crate) fn set_release(&mut self, release: ReleaseFn) -> Option<ReleaseFn> {
        if self.closed {
            return Some(release);
        }
        self.release = Some(release);
        None
    }

    /// Returns the child back when the registry is closed and it must be
    /// unsubscribed now.
    pub(crate) fn link(&mut self, child: Subscription) -> Option<Subscription> {
        if self.closed {
            return Some(child);
        }
        // `is_closed` reads an atomic, no child lock is taken here.
        self.children.retain(|c| !c.is_closed());
        if !self.children.contains(&child) {
            self.children.push(child);
        }
        None
    }

    pub(crate) fn take_children(&mut self) -> Vec<Subscription> {
        std::mem::take(&mut self.children)
    }

    pub(crate) fn unlink(&mut self, child: &Subscription) -> bool {
        let before = self.children.len();
        self.children.retain(|c| c != child);
        before != self.children.len()
    }
}
