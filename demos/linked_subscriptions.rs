//! Linking subscriptions with `add` so that unsubscribing the first one
//! unsubscribes the others as well.
//!
//! To run this example, execute `cargo run --example linked_subscriptions`.

use std::time::Duration;

use rxlife::subscribe::{Handlers, Subscriber, Unsubscribeable};
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
        timer
            .schedule_repeating(Duration::from_millis(500), move || {
                count += 1;
                subscriber.next(count);
            })
            .into()
    });

    let make_handlers =
        |name: &'static str| Handlers::new().on_next(move |v: u32| println!("{}: {}", name, v));

    let subscription_1 = interval.subscribe(make_handlers("first"));
    let subscription_2 = interval.subscribe(make_handlers("second"));
    let subscription_3 = interval.subscribe(make_handlers("third"));

    // `subscription_3` hangs off `subscription_2`, which hangs off `subscription_1`.
    subscription_1.add(subscription_2.clone()).add(subscription_3.clone());

    tokio::time::sleep(Duration::from_millis(1600)).await;
    subscription_1.unsubscribe();

    println!(
        "closed: {} {} {}",
        subscription_1.is_closed(),
        subscription_2.is_closed(),
        subscription_3.is_closed()
    );
    tokio::time::sleep(Duration::from_secs(1)).await;
}
