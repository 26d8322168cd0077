use std::sync::{Arc, Mutex};

use rxlife::subscribe::Handlers;

pub struct Emissions<T> {
    pub nexts: Arc<Mutex<Vec<T>>>,
    pub completes: Arc<Mutex<usize>>,
    pub errors: Arc<Mutex<Vec<String>>>,
}

impl<T> Emissions<T> {
    pub fn nexts(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.nexts.lock().unwrap().clone()
    }

    pub fn completes(&self) -> usize {
        *self.completes.lock().unwrap()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

/// Handlers tracking every `next`, `error` and `complete` they receive.
pub fn register_emissions_handlers<T: Send + 'static>() -> (Handlers<T>, Emissions<T>) {
    let nexts = Arc::new(Mutex::new(Vec::with_capacity(5)));
    let nexts_c = Arc::clone(&nexts);

    let completes = Arc::new(Mutex::new(0));
    let completes_c = Arc::clone(&completes);

    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_c = Arc::clone(&errors);

    let handlers = Handlers::new()
        .on_next(move |n| {
            // Track next() calls.
            nexts_c.lock().unwrap().push(n);
        })
        .on_error(move |e| {
            // Track error() calls.
            errors_c.lock().unwrap().push(e.to_string());
        })
        .on_complete(move || {
            // Track complete() calls.
            *completes_c.lock().unwrap() += 1;
        });

    (
        handlers,
        Emissions {
            nexts,
            completes,
            errors,
        },
    )
}
