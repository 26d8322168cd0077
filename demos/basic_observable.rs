//! A synchronous `Observable` emitting two values and completing, subscribed three
//! ways: positional callbacks, a partial handler set, and a user `Observer` type.
//!
//! To run this example, execute `cargo run --example basic_observable`.

use std::{error::Error, sync::Arc};

use rxlife::subscribe::{Handlers, Subscriber, Teardown};
use rxlife::{Observable, Observer, Subscribeable};
use tracing_subscriber::EnvFilter;

struct PrintObserver;

impl Observer for PrintObserver {
    type NextFnType = String;

    fn next(&mut self, v: String) {
        println!("{}", v);
    }

    fn complete(&mut self) {
        println!("Third observer completed");
    }

    fn error(&mut self, e: Arc<dyn Error + Send + Sync>) {
        eprintln!("{}", e);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let observable = Observable::new(|mut subscriber: Subscriber<String>| {
        subscriber.next("Hello, World!".to_string());
        subscriber.next("a second value".to_string());
        subscriber.complete();
        Teardown::Nil
    });

    // Positional callbacks, each one optional.
    observable.subscribe((
        Some(|v: String| println!("{}", v)),
        Some(|e: Arc<dyn Error + Send + Sync>| eprintln!("{}", e)),
        Some(|| println!("Observable called complete")),
    ));

    // Only the handlers this subscriber cares about.
    observable.subscribe(
        Handlers::new()
            .on_next(|v: String| println!("{}", v))
            .on_complete(|| println!("Second subscriber completed")),
    );

    // A type implementing `Observer`.
    observable.subscribe(Handlers::from_observer(PrintObserver));
}
