use std::{error::Error, sync::Arc};

/// Receiving side of a push-based stream.
///
/// `Subscriber` implements this for producers. User types can implement it as well
/// and be turned into a handler set with `Handlers::from_observer`.
pub trait Observer {
    type NextFnType;

    fn next(&mut self, _: Self::NextFnType);
    fn complete(&mut self);
    fn error(&mut self, _: Arc<dyn Error + Send + Sync>);
}
