use crate::results::Results;
use futures::future::{self, BoxFuture};

/// Receives the [`Results`] of every enabled experiment call
pub trait Publish<T, E> {
    fn publish(&self, results: &Results<T, E>);
}

impl<T, E, F> Publish<T, E> for F
where
    F: Fn(&Results<T, E>),
{
    fn publish(&self, results: &Results<T, E>) {
        self(results)
    }
}

/// A publisher that may suspend. `Experiment::run_async` waits for the
/// returned future before it completes. Every [`Publish`] is also a
/// `PublishAsync` that finishes immediately.
pub trait PublishAsync<T, E> {
    fn publish_async<'a>(&'a self, results: &'a Results<T, E>) -> BoxFuture<'a, ()>;
}

impl<T, E, P> PublishAsync<T, E> for P
where
    P: Publish<T, E>,
{
    fn publish_async<'a>(&'a self, results: &'a Results<T, E>) -> BoxFuture<'a, ()> {
        self.publish(results);
        Box::pin(future::ready(()))
    }
}

/// Where the [`DefaultPublisher`] sends its notices
pub trait Sink {
    fn notice(&self, message: &str);
}

impl<F> Sink for F
where
    F: Fn(&str),
{
    fn notice(&self, message: &str) {
        self(message)
    }
}

/// Emits notices as `tracing` warnings
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn notice(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// The publisher used when none is configured. Emits a single
/// `"Experiment <name>: difference found"` notice when the control and
/// candidate values differ, and nothing otherwise.
#[derive(Clone, Debug, Default)]
pub struct DefaultPublisher<S = TracingSink> {
    sink: S,
}

impl DefaultPublisher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Sink> DefaultPublisher<S> {
    /// Send notices somewhere other than `tracing`
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }
}

impl<T, E, S> Publish<T, E> for DefaultPublisher<S>
where
    T: PartialEq,
    S: Sink,
{
    fn publish(&self, results: &Results<T, E>) {
        let name = results.experiment_name();

        if results.matched() {
            metrics::counter!(
                "experiment_outcome",
                "name" => name.to_string(),
                "outcome" => "match"
            )
            .increment(1);
            return;
        }

        metrics::counter!(
            "experiment_outcome",
            "name" => name.to_string(),
            "outcome" => "mismatch"
        )
        .increment(1);

        self.sink
            .notice(&format!("Experiment {}: difference found", name));
    }
}
