use std::{any::Any, error::Error};

use thiserror::Error;

/// Errors produced by `rxlife` itself, as opposed to errors a producer emits
/// through `Observer::error`.
///
/// They reach error handlers wrapped in an `Arc`, next to user error types.
#[derive(Debug, Error)]
pub enum ObservableError {
    /// The producer panicked before returning its teardown.
    #[error("observable producer panicked: {0}")]
    ProducerPanicked(String),

    /// A fallible producer created with `Observable::try_new` returned `Err`.
    #[error("observable producer failed")]
    Producer(#[source] Box<dyn Error + Send + Sync>),

    /// A tokio runtime was required but none was running on this thread.
    #[error("no Tokio runtime is available on the current thread")]
    NoRuntime,
}

impl ObservableError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::from("non-string panic payload")
        };
        Self::ProducerPanicked(message)
    }
}
