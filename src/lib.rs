//! Verity provides the `Experiment` struct, which wraps a trusted "control"
//! method and a new "candidate" method for the same task, runs them side by
//! side, publishes both outcomes, and always hands the control's outcome back
//! to the caller.
//!
//! Let's imagine that we already have a function called `load_from_db`, which
//! loads some data from a database. We want to refactor this to instead load
//! the same data from redis. We write a new function called `load_from_redis`
//! to accomplish the same task, but with redis instead of a DB. We want to try
//! the redis version on only a small percentage of traffic, say 0.5% of
//! incoming requests, and we want to log it out if the redis data doesn't
//! match the DB data, while callers keep getting the DB data (or the DB
//! error). Here's how we can use an `Experiment` to do this.
//!
//! ```
//! use verity::{rollout::Percent, Experiment, Results};
//!
//! fn load_from_db(id: i32) -> Result<i32, String> { Ok(id) }
//! fn load_from_redis(id: i32) -> Result<i32, String> { Ok(id) }
//!
//! let experiment = Experiment::new("redis migration")
//!     .control(load_from_db)
//!     .candidate(load_from_redis)
//!     .enabled(Percent::new(0.5))
//!     .publish(|results: &Results<i32, String>| {
//!         if !results.matched() {
//!             eprintln!(
//!                 "DB & Redis data differ - db={:?}, redis={:?}",
//!                 results.control_result(),
//!                 results.candidate_result(),
//!             );
//!         }
//!     });
//!
//! // the value here always comes from the DB
//! assert_eq!(experiment.run(4), Ok(4));
//! ```
//!
//! Methods returning futures are run with `run_async`, which polls the control
//! and candidate concurrently. Without a `publish` option, differences are
//! reported as `tracing` warnings by the [`DefaultPublisher`].
//!
//! ```
//! use verity::Experiment;
//!
//! async fn load_from_db(id: i32) -> Result<i32, String> { Ok(id) }
//! async fn load_from_redis(id: i32) -> Result<i32, String> { Ok(id) }
//!
//! # tokio_test::block_on(async {
//! let experiment = Experiment::new("redis migration")
//!     .control(load_from_db)
//!     .candidate(load_from_redis);
//!
//! assert_eq!(experiment.run_async(4).await, Ok(4));
//! # });
//! ```

pub mod experiment;
pub mod publish;
pub mod results;
pub mod rollout;

pub use experiment::Experiment;
pub use publish::{DefaultPublisher, Publish, PublishAsync, Sink, TracingSink};
pub use results::{CandidateError, Results};
pub use rollout::{Always, Enabled, Percent};
