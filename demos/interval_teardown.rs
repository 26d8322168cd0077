//! Three subscribers to an interval `Observable`. Each subscription runs its own
//! timer, and unsubscribing releases it through the teardown the producer returned.
//! Without the teardown the intervals would keep running after unsubscribe.
//!
//! To run this example, execute `cargo run --example interval_teardown`.

use std::time::Duration;

use rxlife::subscribe::{Handlers, Subscriber, Teardown, Unsubscribeable};
use rxlife::timer::{Scheduler, TokioTimer};
use rxlife::{Observable, Observer, Subscribeable};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let timer = TokioTimer::current().expect("running inside a Tokio runtime");

    let interval = Observable::new(move |mut subscriber: Subscriber<u32>| {
        let mut count = 0;

        // Keep the handle, it is what stops the interval later.
        let handle = timer.schedule_repeating(Duration::from_secs(1), move || {
            count += 1;
            subscriber.next(count);
        });

        Teardown::new(move || {
            handle.cancel();
            println!("Observable unsubscribed, interval cleared");
        })
    });

    let subscriptions: Vec<_> = (1..=3)
        .map(|id| {
            interval.subscribe(
                Handlers::new().on_next(move |v: u32| println!("Subscriber {} got {}", id, v)),
            )
        })
        .collect();

    tokio::time::sleep(Duration::from_secs(3) + Duration::from_millis(100)).await;

    for s in &subscriptions {
        s.unsubscribe();
    }
    println!("Timeout completed, unsubscribed from all observers");

    // Nothing is printed from here on.
    tokio::time::sleep(Duration::from_secs(2)).await;
}
