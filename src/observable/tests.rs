use super::*;

use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use crate::subscribe::{SubscriberState, Unsubscribeable};

#[derive(Debug)]
struct ProducerErr;

impl Display for ProducerErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "producer failed")
    }
}

impl Error for ProducerErr {}

fn error_log() -> (Handlers<i32>, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_c = Arc::clone(&log);
    let handlers = Handlers::new().on_error(move |e| log_c.lock().unwrap().push(e.to_string()));
    (handlers, log)
}

#[test]
fn producer_runs_once_per_subscribe() {
    let runs = Arc::new(AtomicUsize::new(0));
    let runs_c = Arc::clone(&runs);

    let observable = Observable::new(move |mut subscriber: Subscriber<i32>| {
        runs_c.fetch_add(1, Ordering::SeqCst);
        subscriber.complete();
        Teardown::Nil
    });
    assert_eq!(runs.load(Ordering::SeqCst), 0, "observables are lazy");

    for n in 1..=4 {
        observable.subscribe(());
        assert_eq!(runs.load(Ordering::SeqCst), n);
    }

    let cloned = observable.clone();
    cloned.subscribe(());
    assert_eq!(runs.load(Ordering::SeqCst), 5);
}

#[test]
fn teardown_runs_when_producer_completes_synchronously() {
    let cleaned = Arc::new(AtomicUsize::new(0));
    let cleaned_c = Arc::clone(&cleaned);

    let observable = Observable::new(move |mut subscriber: Subscriber<i32>| {
        subscriber.next(1);
        subscriber.complete();
        let cleaned_c = Arc::clone(&cleaned_c);
        Teardown::new(move || {
            cleaned_c.fetch_add(1, Ordering::SeqCst);
        })
    });

    let subscription = observable.subscribe(());
    assert!(subscription.is_closed());
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);

    subscription.unsubscribe();
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);
}

#[test]
fn teardown_waits_for_unsubscribe_when_producer_keeps_running() {
    let cleaned = Arc::new(AtomicUsize::new(0));
    let cleaned_c = Arc::clone(&cleaned);

    let observable = Observable::new(move |mut subscriber: Subscriber<i32>| {
        subscriber.next(1);
        let cleaned_c = Arc::clone(&cleaned_c);
        Teardown::new(move || {
            cleaned_c.fetch_add(1, Ordering::SeqCst);
        })
    });

    let subscription = observable.subscribe(());
    assert!(!subscription.is_closed());
    assert_eq!(cleaned.load(Ordering::SeqCst), 0);

    subscription.unsubscribe();
    subscription.unsubscribe();
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);
}

#[test]
fn producer_panic_is_routed_to_error_handler() {
    let observable = Observable::new(|mut subscriber: Subscriber<i32>| {
        subscriber.next(1);
        panic!("producer blew up");
    });

    let (handlers, log) = error_log();
    let subscription = observable.subscribe(handlers);

    assert!(subscription.is_closed());
    assert_eq!(
        *log.lock().unwrap(),
        vec!["observable producer panicked: producer blew up".to_string()]
    );
}

#[test]
fn producer_panic_without_error_handler_is_swallowed() {
    let observable = Observable::new(|_: Subscriber<i32>| panic!("nobody listens"));
    let subscription = observable.subscribe(());
    assert!(subscription.is_closed());
}

#[test]
fn fallible_producer_error_is_routed_to_error_handler() {
    let observable = Observable::try_new(|mut subscriber: Subscriber<i32>| {
        subscriber.next(1);
        Err(ProducerErr)
    });

    let (handlers, log) = error_log();
    let subscription = observable.subscribe(handlers);

    assert!(subscription.is_closed());
    assert_eq!(*log.lock().unwrap(), vec!["observable producer failed".to_string()]);
}

#[test]
fn fallible_producer_success_registers_teardown() {
    let cleaned = Arc::new(AtomicUsize::new(0));
    let cleaned_c = Arc::clone(&cleaned);

    let observable = Observable::try_new(move |_: Subscriber<i32>| {
        let cleaned_c = Arc::clone(&cleaned_c);
        Ok::<_, ProducerErr>(Teardown::new(move || {
            cleaned_c.fetch_add(1, Ordering::SeqCst);
        }))
    });

    let subscription = observable.subscribe(());
    assert!(!subscription.is_closed());
    subscription.unsubscribe();
    assert_eq!(cleaned.load(Ordering::SeqCst), 1);
}

#[test]
fn producer_can_link_inner_subscriptions() {
    let inner = Observable::new(|_: Subscriber<i32>| Teardown::Nil);
    let inner_subscriptions = Arc::new(Mutex::new(Vec::new()));
    let inner_subscriptions_c = Arc::clone(&inner_subscriptions);

    let outer = Observable::new(move |subscriber: Subscriber<i32>| {
        let s = inner.subscribe(());
        inner_subscriptions_c.lock().unwrap().push(s.clone());
        subscriber.subscription().add(s);
        Teardown::Nil
    });

    let subscription = outer.subscribe(());
    assert_eq!(subscription.len(), 1);
    subscription.unsubscribe();

    assert!(inner_subscriptions.lock().unwrap().iter().all(Subscription::is_closed));
}

#[test]
fn producer_observes_its_own_cancellation() {
    let observed: Arc<Mutex<Option<Subscriber<i32>>>> = Arc::new(Mutex::new(None));
    let observed_c = Arc::clone(&observed);

    let observable = Observable::new(move |subscriber: Subscriber<i32>| {
        *observed_c.lock().unwrap() = Some(subscriber);
        Teardown::Nil
    });
    let subscription = observable.subscribe(());

    let subscriber = observed.lock().unwrap().take().unwrap();
    assert!(!subscriber.is_closed());
    subscription.unsubscribe();
    assert!(subscriber.is_closed());
    assert_eq!(subscriber.state(), SubscriberState::Active);
}
