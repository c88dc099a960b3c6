use rand::Rng;

/// Decides, per call, if the candidate method should run alongside the
/// control and the results be published. Evaluated once per call, before
/// either method runs.
pub trait Enabled<A> {
    fn is_enabled(&self, args: &A) -> bool;
}

impl<A, F> Enabled<A> for F
where
    F: Fn(&A) -> bool,
{
    fn is_enabled(&self, args: &A) -> bool {
        self(args)
    }
}

/// Run the candidate on every call. This is the default.
#[derive(Clone, Copy, Debug, Default)]
pub struct Always;

impl<A> Enabled<A> for Always {
    fn is_enabled(&self, _args: &A) -> bool {
        true
    }
}

/// The simplest sampling strategy, a floating point number between 0 and 100
/// that represents the percentage of calls which should run the candidate
/// method and compare its result to the control.
#[derive(Clone, Copy, Debug)]
pub struct Percent(f64);

impl Percent {
    /// Create a new rollout Percent
    pub fn new(percent: f64) -> Self {
        Self(percent / 100.0)
    }
}

impl<A> Enabled<A> for Percent {
    fn is_enabled(&self, _args: &A) -> bool {
        let mut rng = rand::thread_rng();

        rng.gen::<f64>() < self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_enabled() {
        assert!(Always.is_enabled(&()));
        assert!(Always.is_enabled(&"anything"));
    }

    #[test]
    fn percent_bounds() {
        let never = Percent::new(0.0);
        let always = Percent::new(100.0);

        for _ in 0..1000 {
            assert!(!never.is_enabled(&()));
            assert!(always.is_enabled(&()));
        }
    }

    #[test]
    fn predicate_sees_arguments() {
        let only_even = |n: &u32| n % 2 == 0;

        assert!(only_even.is_enabled(&4));
        assert!(!only_even.is_enabled(&5));
    }
}
