use std::{
    collections::VecDeque,
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use tokio::runtime::Handle;

use super::{
    lock,
    teardown::{Closing, ReleaseFn, TeardownRegistry},
};
use crate::observer::Observer;

pub use super::teardown::Teardown;

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by an observable stream.
pub trait Subscribeable {
    /// The type of items emitted by the observable stream.
    type ObsType;

    /// Subscribes to the observable stream with the given handlers.
    ///
    /// Anything convertible into [`Handlers`] is accepted: a `Handlers` value built
    /// with its `on_*` methods, a positional `(Option<next>, Option<error>,
    /// Option<complete>)` triple, or `()` to subscribe without any handler.
    ///
    /// The returned `Subscription` is used to cancel the observation.
    fn subscribe(&self, handlers: impl Into<Handlers<Self::ObsType>>) -> Subscription;
}

/// A trait for types that can be unsubscribed, allowing the clean release of resources
/// associated with a subscription.
pub trait Unsubscribeable {
    /// Cancels the subscription and releases its resources.
    ///
    /// Runs the registered teardown and unsubscribes every linked child, all on the
    /// calling thread before returning. Calling it again does nothing.
    fn unsubscribe(&self);
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnMut(Arc<dyn Error + Send + Sync>) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

/// The callbacks one subscriber dispatches to. Each of them is optional; an event
/// with no handler is ignored.
///
/// Build it the observer-object way:
///
/// ```
/// use rxlife::subscribe::Handlers;
///
/// let handlers = Handlers::new()
///     .on_next(|v: i32| println!("Emitted {}", v))
///     .on_complete(|| println!("Completed"));
/// ```
///
/// or positionally, with `None` where a callback is not needed:
///
/// ```
/// use rxlife::subscribe::Handlers;
///
/// let handlers: Handlers<i32> = (
///     Some(|v: i32| println!("Emitted {}", v)),
///     None::<fn(_)>,
///     Some(|| println!("Completed")),
/// )
///     .into();
/// ```
pub struct Handlers<T> {
    next: Option<NextFn<T>>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T: 'static> Handlers<T> {
    /// Handlers with no callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the function called for every emitted value.
    #[must_use]
    pub fn on_next(mut self, next_fn: impl FnMut(T) + Send + 'static) -> Self {
        self.next = Some(Box::new(next_fn));
        self
    }

    /// Sets the function called when the observable signals an error.
    #[must_use]
    pub fn on_error(
        mut self,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + Send + 'static,
    ) -> Self {
        self.error = Some(Box::new(error_fn));
        self
    }

    /// Sets the function called when the observable completes.
    #[must_use]
    pub fn on_complete(mut self, complete_fn: impl FnMut() + Send + 'static) -> Self {
        self.complete = Some(Box::new(complete_fn));
        self
    }

    /// Positional form: up to three callbacks, any of them left out with `None`.
    pub fn from_fns<N, E, C>(
        next_fn: Option<N>,
        error_fn: Option<E>,
        complete_fn: Option<C>,
    ) -> Self
    where
        N: FnMut(T) + Send + 'static,
        E: FnMut(Arc<dyn Error + Send + Sync>) + Send + 'static,
        C: FnMut() + Send + 'static,
    {
        Handlers {
            next: next_fn.map(|f| Box::new(f) as NextFn<T>),
            error: error_fn.map(|f| Box::new(f) as ErrorFn),
            complete: complete_fn.map(|f| Box::new(f) as CompleteFn),
        }
    }

    /// Dispatches to a user type implementing [`Observer`].
    pub fn from_observer<O>(observer: O) -> Self
    where
        O: Observer<NextFnType = T> + Send + 'static,
    {
        let observer = Arc::new(Mutex::new(observer));
        let o_cloned_e = Arc::clone(&observer);
        let o_cloned_c = Arc::clone(&observer);

        Handlers::new()
            .on_next(move |v| lock(&observer).next(v))
            .on_error(move |e| lock(&o_cloned_e).error(e))
            .on_complete(move || lock(&o_cloned_c).complete())
    }
}

impl<T> Handlers<T> {
    fn clear(&mut self) {
        self.next = None;
        self.error = None;
        self.complete = None;
    }
}

impl<T> Default for Handlers<T> {
    fn default() -> Self {
        Handlers {
            next: None,
            error: None,
            complete: None,
        }
    }
}

impl<T> fmt::Debug for Handlers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("next", &self.next.is_some())
            .field("error", &self.error.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}

impl<T> From<()> for Handlers<T> {
    fn from((): ()) -> Self {
        Self::default()
    }
}

impl<T, N, E, C> From<(Option<N>, Option<E>, Option<C>)> for Handlers<T>
where
    T: 'static,
    N: FnMut(T) + Send + 'static,
    E: FnMut(Arc<dyn Error + Send + Sync>) + Send + 'static,
    C: FnMut() + Send + 'static,
{
    fn from((next_fn, error_fn, complete_fn): (Option<N>, Option<E>, Option<C>)) -> Self {
        Handlers::from_fns(next_fn, error_fn, complete_fn)
    }
}

const ACTIVE: u8 = 0;
const COMPLETED: u8 = 1;
const ERRORED: u8 = 2;

/// Terminal state of a [`Subscriber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Active,
    Completed,
    Errored,
}

enum Event<T> {
    Next(T),
    Complete,
    Error(Arc<dyn Error + Send + Sync>),
}

// Events are dispatched by one caller at a time. Events raised while a handler runs,
// from inside it or from another thread, are queued and drained by that caller.
struct Delivery<T> {
    handlers: Handlers<T>,
    pending: VecDeque<Event<T>>,
    busy: bool,
}

struct SubscriberShared<T> {
    state: AtomicU8,
    delivery: Mutex<Delivery<T>>,
}

impl<T> SubscriberShared<T> {
    fn release(&self) {
        let released = {
            let mut delivery = lock(&self.delivery);
            (
                std::mem::take(&mut delivery.handlers),
                std::mem::take(&mut delivery.pending),
            )
        };
        drop(released);
    }
}

// Clears the busy flag if a handler unwinds, so later events are not queued forever.
struct Dispatching<'a, T>(&'a SubscriberShared<T>);

impl<T> Drop for Dispatching<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            lock(&self.0.delivery).busy = false;
        }
    }
}

/// The sink a producer pushes events into.
///
/// One `Subscriber` is created per `subscribe` call and handed to the producer.
/// Clones share state, so a producer can give one to several timer callbacks.
///
/// Events reach the handlers one at a time and in the order they were raised. A
/// handler may push further events into the same subscriber; they are delivered
/// after it returns.
///
/// After `complete` or `error`, or once the owning subscription was unsubscribed,
/// every further event is dropped.
pub struct Subscriber<T> {
    shared: Arc<SubscriberShared<T>>,
    subscription: Subscription,
}

impl<T: Send + 'static> Subscriber<T> {
    pub(crate) fn new(handlers: Handlers<T>, subscription: Subscription) -> Self {
        let shared = Arc::new(SubscriberShared {
            state: AtomicU8::new(ACTIVE),
            delivery: Mutex::new(Delivery {
                handlers,
                pending: VecDeque::new(),
                busy: false,
            }),
        });

        let released = Arc::clone(&shared);
        subscription.set_release(Box::new(move || released.release()));

        Subscriber {
            shared,
            subscription,
        }
    }
}

impl<T> Subscriber<T> {
    /// Returns `true` once this subscriber stopped delivering events, either because
    /// it completed or errored, or because its subscription was unsubscribed.
    ///
    /// Long-running producers can poll it to stop early.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) != ACTIVE || self.subscription.is_closed()
    }

    #[must_use]
    pub fn state(&self) -> SubscriberState {
        match self.shared.state.load(Ordering::Acquire) {
            COMPLETED => SubscriberState::Completed,
            ERRORED => SubscriberState::Errored,
            _ => SubscriberState::Active,
        }
    }

    /// The subscription this subscriber delivers for. Inner subscriptions a producer
    /// starts can be linked to it with `add`.
    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    // Moves the subscriber into a terminal state. `false` if it was terminal or
    // unsubscribed already.
    fn terminate(&self, state: u8) -> bool {
        !self.subscription.is_closed()
            && self
                .shared
                .state
                .compare_exchange(ACTIVE, state, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    fn dispatch(&self, event: Event<T>) {
        {
            let mut delivery = lock(&self.shared.delivery);
            if delivery.busy {
                delivery.pending.push_back(event);
                return;
            }
            delivery.busy = true;
        }
        let _dispatching = Dispatching(self.shared.as_ref());

        let mut current = event;
        loop {
            self.run(current);
            let mut delivery = lock(&self.shared.delivery);
            match delivery.pending.pop_front() {
                Some(queued) => current = queued,
                None => {
                    delivery.busy = false;
                    return;
                }
            }
        }
    }

    // Runs one event against the handlers. No lock is held while user code runs.
    fn run(&self, event: Event<T>) {
        if self.subscription.is_closed() {
            return;
        }
        match event {
            Event::Next(v) => {
                let Some(mut next_fn) = lock(&self.shared.delivery).handlers.next.take() else {
                    return;
                };
                next_fn(v);

                let rejected = {
                    let mut delivery = lock(&self.shared.delivery);
                    if self.subscription.is_closed() {
                        Some(next_fn)
                    } else {
                        delivery.handlers.next = Some(next_fn);
                        None
                    }
                };
                drop(rejected);
            }
            Event::Complete => {
                let handlers = std::mem::take(&mut lock(&self.shared.delivery).handlers);
                if let Some(mut complete_fn) = handlers.complete {
                    complete_fn();
                }
                self.subscription.unsubscribe();
            }
            Event::Error(observable_error) => {
                let handlers = std::mem::take(&mut lock(&self.shared.delivery).handlers);
                match handlers.error {
                    Some(mut error_fn) => error_fn(observable_error),
                    None => tracing::warn!(
                        error = %observable_error,
                        "observable error with no error handler"
                    ),
                }
                self.subscription.unsubscribe();
            }
        }
    }
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Subscriber {
            shared: Arc::clone(&self.shared),
            subscription: self.subscription.clone(),
        }
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("state", &self.state())
            .field("subscription", &self.subscription)
            .finish()
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if self.is_closed() {
            return;
        }
        self.dispatch(Event::Next(v));
    }

    fn complete(&mut self) {
        if self.terminate(COMPLETED) {
            self.dispatch(Event::Complete);
        }
    }

    fn error(&mut self, observable_error: Arc<dyn Error + Send + Sync>) {
        if self.terminate(ERRORED) {
            self.dispatch(Event::Error(observable_error));
        }
    }
}

struct SubscriptionInner {
    // Mirrors the registry's flag so it can be read without taking the lock.
    closed: AtomicBool,
    registry: Mutex<TeardownRegistry>,
    runtime_handle: Option<Handle>,
}

impl Drop for SubscriptionInner {
    // Long `add` chains would otherwise be dropped one stack frame per link.
    fn drop(&mut self) {
        let registry = self
            .registry
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        let mut orphans = registry.take_children();
        while let Some(child) = orphans.pop() {
            if let Ok(mut inner) = Arc::try_unwrap(child.inner) {
                let registry = inner
                    .registry
                    .get_mut()
                    .unwrap_or_else(PoisonError::into_inner);
                orphans.append(&mut registry.take_children());
            }
        }
    }
}

/// Represents one observation of an observable, allowing it to be cancelled.
///
/// `Subscription` is a cheap handle; clones refer to the same subscription and
/// compare equal. Other subscriptions can be linked to it with [`add`], so that
/// unsubscribing it unsubscribes them as well.
///
/// [`add`]: Subscription::add
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {
    /// Creates an open subscription with no teardown and no children.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(TeardownRegistry::default())
    }

    /// Creates a subscription that is closed from the start. Anything added to it
    /// is torn down immediately.
    #[must_use]
    pub fn closed() -> Self {
        Self::with_registry(TeardownRegistry::closed())
    }

    fn with_registry(registry: TeardownRegistry) -> Self {
        Subscription {
            inner: Arc::new(SubscriptionInner {
                closed: AtomicBool::new(registry.is_closed()),
                registry: Mutex::new(registry),
                runtime_handle: Handle::try_current().ok(),
            }),
        }
    }

    /// Registers cleanup to run when this subscription is unsubscribed.
    ///
    /// A subscription normally carries the one teardown its producer returned. If
    /// more are added they run after it, in the order they were added. When the
    /// subscription is already closed, `teardown` runs before this call returns.
    pub fn add_teardown(&self, teardown: impl Into<Teardown>) {
        let rejected = lock(&self.inner.registry).push_teardown(teardown.into());
        if let Some(teardown) = rejected {
            tracing::debug!("subscription already closed, running teardown now");
            teardown.run(self.inner.runtime_handle.as_ref());
        }
    }

    /// Links `child` to this subscription so it is unsubscribed together with it.
    ///
    /// If this subscription is already closed, `child` is unsubscribed right away.
    /// Unsubscribing `child` on its own never affects this subscription.
    ///
    /// Returns `child`, which can later be passed to [`remove`]. Chaining links each
    /// new subscription under the previous one: `a.add(b).add(c)` unsubscribes `c`
    /// through `b` when `a` is unsubscribed.
    ///
    /// [`remove`]: Subscription::remove
    pub fn add(&self, child: Subscription) -> Subscription {
        if child == *self {
            return child;
        }
        let rejected = lock(&self.inner.registry).link(child.clone());
        match rejected {
            Some(child) => {
                tracing::debug!("parent already closed, unsubscribing linked child");
                child.unsubscribe();
            }
            None => tracing::trace!("child subscription linked"),
        }
        child
    }

    /// Unlinks `child` without unsubscribing it.
    pub fn remove(&self, child: &Subscription) {
        let removed = lock(&self.inner.registry).unlink(child);
        if removed {
            tracing::trace!("child subscription unlinked");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of linked child subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.inner.registry).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn set_release(&self, release: ReleaseFn) {
        let rejected = lock(&self.inner.registry).set_release(release);
        if let Some(release) = rejected {
            release();
        }
    }

    fn close(&self) -> Option<Closing> {
        let mut registry = lock(&self.inner.registry);
        let closing = registry.close()?;
        self.inner.closed.store(true, Ordering::Release);
        Some(closing)
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(&self) {
        // Depth-first without recursion, so chains of any length are safe.
        let mut pending = vec![self.clone()];
        while let Some(subscription) = pending.pop() {
            let Some(Closing {
                release,
                teardowns,
                children,
            }) = subscription.close()
            else {
                continue;
            };

            tracing::debug!(
                teardowns = teardowns.len(),
                children = children.len(),
                "unsubscribing"
            );
            if let Some(release) = release {
                release();
            }
            for teardown in teardowns {
                teardown.run(subscription.inner.runtime_handle.as_ref());
            }
            pending.extend(children.into_iter().rev());
        }
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Subscription {}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .field("children", &self.len())
            .finish()
    }
}
