//! Completing an `Observable` runs the teardown its producer returned, but only
//! releases what that teardown covers. The second interval below is not part of
//! it, so it keeps ticking after completion; its values are no longer delivered.
//!
//! To run this example, execute `cargo run --example complete_runs_teardown`.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rxlife::subscribe::{Handlers, Subscriber, Teardown};
use rxlife::timer::{Scheduler, TokioTimer};
use rxlife::{Observable, Observer, Subscribeable};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let timer = TokioTimer::current().expect("running inside a Tokio runtime");

    let observable = Observable::new(move |subscriber: Subscriber<u32>| {
        let count = Arc::new(Mutex::new(0));

        let mut s = subscriber.clone();
        let count_c = Arc::clone(&count);
        let interval_1 = timer.schedule_repeating(Duration::from_millis(700), move || {
            let mut count = count_c.lock().unwrap();
            *count += 1;
            s.next(*count);
            println!("Emitted value in interval 1: {}", *count);
        });

        let mut s = subscriber.clone();
        let count_c = Arc::clone(&count);
        let _interval_2 = timer.schedule_repeating(Duration::from_millis(300), move || {
            let mut count = count_c.lock().unwrap();
            *count += 1;
            s.next(*count);
            println!("Emitted value in interval 2: {}", *count);
        });

        let mut s = subscriber;
        timer.schedule_once(Duration::from_millis(1000), move || {
            s.complete();
            println!("Observable completed");
        });

        Teardown::new(move || {
            interval_1.cancel();
            println!("Teardown ran, interval 1 cleared");
        })
    });

    observable.subscribe(
        Handlers::new()
            .on_next(|v: u32| println!("from observer: {}", v))
            .on_complete(|| println!("Observer completed")),
    );

    tokio::time::sleep(Duration::from_secs(2)).await;
}
