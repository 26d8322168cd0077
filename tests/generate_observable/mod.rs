use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use rxlife::{
    subscribe::Subscriber,
    timer::{Scheduler, TokioTimer},
    Observable, Observer,
};

/// Interval observable emitting `1, 2, 3, ...` every `period`, counting from 1 for
/// every subscription. The returned counter tracks how many intervals are still
/// scheduled, so tests can check teardown stopped them.
pub fn generate_interval_observable(period: Duration) -> (Observable<u32>, Arc<AtomicUsize>) {
    let running = Arc::new(AtomicUsize::new(0));
    let running_c = Arc::clone(&running);

    let observable = Observable::new(move |mut o: Subscriber<u32>| {
        let timer = TokioTimer::current().expect("interval observable needs a Tokio runtime");
        let mut count = 0;

        running_c.fetch_add(1, Ordering::SeqCst);
        let handle = timer.schedule_repeating(period, move || {
            count += 1;
            o.next(count);
        });

        let running_c = Arc::clone(&running_c);
        rxlife::subscribe::Teardown::new(move || {
            handle.cancel();
            running_c.fetch_sub(1, Ordering::SeqCst);
        })
    });
    (observable, running)
}
