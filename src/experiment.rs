use crate::{
    publish::{DefaultPublisher, Publish, PublishAsync},
    results::{CandidateError, Results},
    rollout::{Always, Enabled},
};
use futures::FutureExt;
use std::{
    any::Any,
    future::Future,
    panic::{self, AssertUnwindSafe},
};
use tracing_futures::Instrument;

/// An experiment which runs a trusted control method and a candidate method
/// side by side, publishes both outcomes, and always returns the control's.
///
/// An `Experiment` is built once and then called any number of times through
/// [`Experiment::run`] (for methods returning `Result<T, E>`) or
/// [`Experiment::run_async`] (for methods returning a future of one). Both take
/// `&self`, so a single experiment can be shared between concurrent callers.
///
/// Methods receive a single argument of type `A`; use a tuple for several. The
/// control and candidate must both be set before the experiment can run.
pub struct Experiment<C = (), K = (), P = DefaultPublisher, N = Always> {
    name: String,
    control: C,
    candidate: K,
    publish: P,
    enabled: N,
}

impl Experiment {
    /// Create a new experiment. The name is only used to label results.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            control: (),
            candidate: (),
            publish: DefaultPublisher::new(),
            enabled: Always,
        }
    }
}

impl<C, K, P, N> Experiment<C, K, P, N> {
    /// Set the control method. Its outcome is what every call returns.
    pub fn control<C2>(self, control: C2) -> Experiment<C2, K, P, N> {
        Experiment {
            name: self.name,
            control,
            candidate: self.candidate,
            publish: self.publish,
            enabled: self.enabled,
        }
    }

    /// Set the candidate method. It must accept the same argument and produce
    /// the same `Result` type as the control.
    pub fn candidate<K2>(self, candidate: K2) -> Experiment<C, K2, P, N> {
        Experiment {
            name: self.name,
            control: self.control,
            candidate,
            publish: self.publish,
            enabled: self.enabled,
        }
    }

    /// Set the publisher called with the [`Results`] of every enabled call.
    /// Defaults to [`DefaultPublisher`].
    pub fn publish<P2>(self, publish: P2) -> Experiment<C, K, P2, N> {
        Experiment {
            name: self.name,
            control: self.control,
            candidate: self.candidate,
            publish,
            enabled: self.enabled,
        }
    }

    /// Set the predicate deciding, per call, if the candidate runs. Defaults
    /// to [`Always`].
    pub fn enabled<N2>(self, enabled: N2) -> Experiment<C, K, P, N2> {
        Experiment {
            name: self.name,
            control: self.control,
            candidate: self.candidate,
            publish: self.publish,
            enabled,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the experiment with synchronous methods.
    ///
    /// When the experiment is disabled for `args`, only the control runs and
    /// its result is returned as is. Otherwise the control runs, then the
    /// candidate, the [`Results`] are published, and the control's result is
    /// returned. Candidate errors and panics never reach the caller, although a
    /// candidate panic still runs the process panic hook, so the usual
    /// "thread panicked at" line is printed to stderr.
    ///
    /// A panicking publisher is not contained; the panic unwinds to the caller.
    pub fn run<A, T, E>(&self, args: A) -> Result<T, E>
    where
        A: Clone,
        C: Fn(A) -> Result<T, E>,
        K: Fn(A) -> Result<T, E>,
        N: Enabled<A>,
        P: Publish<T, E>,
    {
        let span = tracing::debug_span!("experiment", name = %self.name);
        let _enter = span.enter();

        if !self.enabled.is_enabled(&args) {
            tracing::debug!("candidate disabled for this call");
            self.record_variant("control");
            return (self.control)(args);
        }

        self.record_variant("compare");

        let control = (self.control)(args.clone());
        let candidate = match panic::catch_unwind(AssertUnwindSafe(|| (self.candidate)(args))) {
            Ok(result) => result.map_err(CandidateError::Failed),
            Err(payload) => Err(self.contain_panic(payload)),
        };

        let results = Results::new(self.name.clone(), control, Some(candidate));
        self.publish.publish(&results);
        results.into_control()
    }

    /// Run the experiment with asynchronous methods.
    ///
    /// Behaves like [`Experiment::run`], except that the control and candidate
    /// futures are polled concurrently on the current task, and the returned
    /// future resolves only once both have settled and the publisher's future
    /// has completed. A synchronous method can take part by returning
    /// `std::future::ready(result)`.
    pub async fn run_async<A, T, E, CF, KF>(&self, args: A) -> Result<T, E>
    where
        A: Clone,
        C: Fn(A) -> CF,
        CF: Future<Output = Result<T, E>>,
        K: Fn(A) -> KF,
        KF: Future<Output = Result<T, E>>,
        N: Enabled<A>,
        P: PublishAsync<T, E>,
    {
        let span = tracing::debug_span!("experiment", name = %self.name);

        async move {
            if !self.enabled.is_enabled(&args) {
                tracing::debug!("candidate disabled for this call");
                self.record_variant("control");
                return (self.control)(args).await;
            }

            self.record_variant("compare");

            let control = (self.control)(args.clone()).instrument(tracing::debug_span!("control"));
            let candidate = self
                .candidate_outcome(args)
                .instrument(tracing::debug_span!("candidate"));
            let (control, candidate) = tokio::join!(control, candidate);

            let results = Results::new(self.name.clone(), control, Some(candidate));
            self.publish.publish_async(&results).await;
            results.into_control()
        }
        .instrument(span)
        .await
    }

    /// Turn a synchronous experiment into a plain function with the control's
    /// signature. Asynchronous experiments are called through
    /// [`Experiment::run_async`] instead, sharing the experiment behind an
    /// `Arc` where the callable has to outlive the current scope.
    pub fn wrap<A, T, E>(self) -> impl Fn(A) -> Result<T, E>
    where
        A: Clone,
        C: Fn(A) -> Result<T, E>,
        K: Fn(A) -> Result<T, E>,
        N: Enabled<A>,
        P: Publish<T, E>,
    {
        move |args| self.run(args)
    }

    async fn candidate_outcome<A, T, E, KF>(&self, args: A) -> Result<T, CandidateError<E>>
    where
        K: Fn(A) -> KF,
        KF: Future<Output = Result<T, E>>,
    {
        let future = match panic::catch_unwind(AssertUnwindSafe(|| (self.candidate)(args))) {
            Ok(future) => future,
            Err(payload) => return Err(self.contain_panic(payload)),
        };

        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result.map_err(CandidateError::Failed),
            Err(payload) => Err(self.contain_panic(payload)),
        }
    }

    fn contain_panic<E>(&self, payload: Box<dyn Any + Send>) -> CandidateError<E> {
        let message = panic_message(&*payload);

        tracing::debug!(panic = %message, "candidate panicked");
        metrics::counter!("experiment_candidate_panic", "name" => self.name.clone()).increment(1);

        CandidateError::Panicked(message)
    }

    fn record_variant(&self, kind: &'static str) {
        metrics::counter!(
            "experiment_run_variant",
            "name" => self.name.clone(),
            "kind" => kind
        )
        .increment(1);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
