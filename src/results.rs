use thiserror::Error;

/// A failure of the candidate method. Candidate failures are captured into the
/// [`Results`] record and never returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError<E> {
    /// The candidate returned an error
    #[error("{0}")]
    Failed(E),

    /// The candidate panicked, either when called or while being polled
    #[error("candidate panicked: {0}")]
    Panicked(String),
}

/// The outcome of a single enabled experiment call, handed to the configured
/// publisher once both methods have finished.
#[derive(Debug, Clone)]
pub struct Results<T, E> {
    experiment_name: String,
    control: Result<T, E>,
    candidate: Option<Result<T, CandidateError<E>>>,
}

impl<T, E> Results<T, E> {
    /// Build a record. `candidate` is `None` when the candidate did not run.
    pub fn new(
        experiment_name: impl Into<String>,
        control: Result<T, E>,
        candidate: Option<Result<T, CandidateError<E>>>,
    ) -> Self {
        Self {
            experiment_name: experiment_name.into(),
            control,
            candidate,
        }
    }

    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    pub fn control_result(&self) -> Option<&T> {
        self.control.as_ref().ok()
    }

    pub fn control_error(&self) -> Option<&E> {
        self.control.as_ref().err()
    }

    pub fn candidate_result(&self) -> Option<&T> {
        self.candidate.as_ref().and_then(|c| c.as_ref().ok())
    }

    pub fn candidate_error(&self) -> Option<&CandidateError<E>> {
        self.candidate.as_ref().and_then(|c| c.as_ref().err())
    }

    pub fn candidate_ran(&self) -> bool {
        self.candidate.is_some()
    }

    /// Hand back the control outcome, consuming the record.
    pub(crate) fn into_control(self) -> Result<T, E> {
        self.control
    }
}

impl<T: PartialEq, E> Results<T, E> {
    /// True when both methods succeeded with equal values, or when neither
    /// produced a value.
    pub fn matched(&self) -> bool {
        self.control_result() == self.candidate_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_and_candidate_succeed() {
        let results: Results<i32, String> = Results::new("sum", Ok(3), Some(Ok(3)));

        assert_eq!(results.experiment_name(), "sum");
        assert_eq!(results.control_result(), Some(&3));
        assert_eq!(results.candidate_result(), Some(&3));
        assert!(results.control_error().is_none());
        assert!(results.candidate_error().is_none());
        assert!(results.matched());
    }

    #[test]
    fn candidate_failure_is_a_mismatch() {
        let results: Results<i32, String> = Results::new(
            "sum",
            Ok(3),
            Some(Err(CandidateError::Failed("nope".to_string()))),
        );

        assert_eq!(results.candidate_result(), None);
        assert_eq!(
            results.candidate_error(),
            Some(&CandidateError::Failed("nope".to_string()))
        );
        assert!(!results.matched());
    }

    #[test]
    fn both_failing_is_not_a_mismatch() {
        let results: Results<i32, String> = Results::new(
            "sum",
            Err("control".to_string()),
            Some(Err(CandidateError::Panicked("candidate".to_string()))),
        );

        assert_eq!(results.control_error().map(String::as_str), Some("control"));
        assert!(results.matched());
    }

    #[test]
    fn candidate_skipped() {
        let results: Results<i32, String> = Results::new("sum", Ok(3), None);

        assert!(!results.candidate_ran());
        assert!(results.candidate_result().is_none());
        assert!(results.candidate_error().is_none());
        assert_eq!(results.into_control(), Ok(3));
    }

    #[test]
    fn candidate_error_display() {
        let failed: CandidateError<String> = CandidateError::Failed("boom".to_string());
        let panicked: CandidateError<String> = CandidateError::Panicked("oops".to_string());

        assert_eq!(failed.to_string(), "boom");
        assert_eq!(panicked.to_string(), "candidate panicked: oops");
    }
}
