//! Error types surfaced through the error path of a `Subscriber`.
mod observable_errors;

pub use observable_errors::*;
