//! The `observable` module provides [`Observable`], a lazy and replayable
//! description of a value-producing process.

use std::{
    error::Error,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use crate::{
    observer::Observer,
    subscription::subscribe::{Handlers, Subscribeable, Subscriber, Subscription, Teardown},
    ObservableError,
};

type Producer<T> = dyn Fn(Subscriber<T>) -> Teardown + Send + Sync;

/// The `Observable` struct represents a source of values that can be observed.
///
/// An `Observable` wraps a producer function. Nothing runs until it is subscribed;
/// every `subscribe` call then runs the producer again from scratch with a fresh
/// [`Subscriber`], so no side effects are shared between subscriptions.
///
/// The producer returns a [`Teardown`] describing how to release whatever it
/// started. The teardown runs exactly once, when the subscription is unsubscribed or
/// when the producer calls `complete` or `error`, whichever comes first.
///
/// # Example: basic synchronous `Observable`
///
/// ```
/// use std::sync::{Arc, Mutex};
///
/// use rxlife::subscribe::{Handlers, Teardown};
/// use rxlife::{Observable, Observer, Subscribeable};
///
/// let observable = Observable::new(|mut subscriber| {
///     subscriber.next("x");
///     subscriber.next("y");
///     subscriber.complete();
///     // Ignored: the subscriber is already completed.
///     subscriber.next("z");
///     Teardown::Nil
/// });
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let seen_c = Arc::clone(&seen);
///
/// observable.subscribe(
///     Handlers::new()
///         .on_next(move |v| seen_c.lock().unwrap().push(v))
///         .on_complete(|| println!("Completed")),
/// );
///
/// assert_eq!(*seen.lock().unwrap(), vec!["x", "y"]);
/// ```
///
/// # Example: interval with teardown
///
/// ```no_run
/// use std::time::Duration;
///
/// use rxlife::subscribe::{Handlers, Unsubscribeable};
/// use rxlife::timer::{Scheduler, TokioTimer};
/// use rxlife::{Observable, Observer, Subscribeable};
///
/// #[tokio::main]
/// async fn main() {
///     let timer = TokioTimer::current().unwrap();
///
///     let interval = Observable::new(move |mut subscriber| {
///         let mut count = 0;
///         // The timer handle becomes the teardown, so unsubscribing stops it.
///         timer
///             .schedule_repeating(Duration::from_secs(1), move || {
///                 count += 1;
///                 subscriber.next(count);
///             })
///             .into()
///     });
///
///     let subscription =
///         interval.subscribe(Handlers::new().on_next(|v: u32| println!("Emitted {}", v)));
///
///     tokio::time::sleep(Duration::from_secs(3)).await;
///     subscription.unsubscribe();
/// }
/// ```
pub struct Observable<T> {
    producer: Arc<Producer<T>>,
}

impl<T: 'static> Observable<T> {
    /// Creates a new `Observable` from a producer function.
    ///
    /// The producer receives the `Subscriber` of one subscription, pushes events
    /// into it (right away or later, from timers or other callbacks it schedules)
    /// and returns the [`Teardown`] releasing what it started. If the producer
    /// panics, the panic is delivered to the subscriber's error handler as
    /// [`ObservableError::ProducerPanicked`].
    pub fn new(producer: impl Fn(Subscriber<T>) -> Teardown + Send + Sync + 'static) -> Self {
        Observable {
            producer: Arc::new(producer),
        }
    }

    /// Creates an `Observable` whose producer can fail before it starts emitting.
    ///
    /// An `Err` is delivered to the subscriber's error handler wrapped in
    /// [`ObservableError::Producer`], and the subscription is closed.
    pub fn try_new<E>(
        producer: impl Fn(Subscriber<T>) -> Result<Teardown, E> + Send + Sync + 'static,
    ) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Observable::new(move |subscriber| {
            let mut on_failure = subscriber.clone();
            match producer(subscriber) {
                Ok(teardown) => teardown,
                Err(e) => {
                    on_failure.error(Arc::new(ObservableError::Producer(e.into())));
                    Teardown::Nil
                }
            }
        })
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T: Send + 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&self, handlers: impl Into<Handlers<Self::ObsType>>) -> Subscription {
        let subscription = Subscription::new();
        let subscriber = Subscriber::new(handlers.into(), subscription.clone());
        let mut on_panic = subscriber.clone();

        tracing::trace!("running producer");
        match panic::catch_unwind(AssertUnwindSafe(|| (self.producer)(subscriber))) {
            Ok(teardown) => subscription.add_teardown(teardown),
            Err(payload) => {
                let e = ObservableError::from_panic(payload);
                tracing::debug!(error = %e, "producer panicked");
                on_panic.error(Arc::new(e));
            }
        }
        subscription
    }
}

#[cfg(test)]
mod tests;
