use std::{convert::Infallible, fmt, sync::Arc};
use thiserror::Error;

/// The instance's constructor returned an error.
///
/// A failure is never cached as the instance. Every caller that was waiting
/// on the failed attempt receives a clone of the same failure, and the next
/// caller to arrive afterwards retries construction.
#[derive(Error)]
#[error("construction of the instance failed on attempt {attempt}")]
pub struct ConstructionFailure<E: std::error::Error + 'static> {
    attempt: u64,
    #[source]
    cause: Arc<E>,
}
impl<E: std::error::Error + 'static> ConstructionFailure<E> {
    pub(crate) fn new(attempt: u64, cause: E) -> Self {
        Self {
            attempt,
            cause: Arc::new(cause),
        }
    }

    /// The attempt that failed, counting from 1.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// The error returned by the constructor.
    pub fn cause(&self) -> &E {
        &self.cause
    }

    /// Returns `true` if both failures came out of the same constructor call.
    pub fn same_failure(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cause, &other.cause)
    }
}
impl ConstructionFailure<Infallible> {
    pub(crate) fn unreachable(self) -> ! {
        let cause: &Infallible = &self.cause;
        match *cause {}
    }
}
impl<E: std::error::Error + 'static> Clone for ConstructionFailure<E> {
    fn clone(&self) -> Self {
        Self {
            attempt: self.attempt,
            cause: Arc::clone(&self.cause),
        }
    }
}
impl<E: std::error::Error + 'static> fmt::Debug for ConstructionFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionFailure")
            .field("attempt", &self.attempt)
            .field("cause", &self.cause)
            .finish()
    }
}

#[test]
fn test_failure_reports_attempt_and_cause() {
    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct Fire;

    let failure = ConstructionFailure::new(3, Fire);

    assert_eq!(failure.attempt(), 3);
    assert_eq!(
        failure.to_string(),
        "construction of the instance failed on attempt 3"
    );
    assert_eq!(
        std::error::Error::source(&failure).unwrap().to_string(),
        "disk on fire"
    );
}

#[test]
fn test_failure_clones_share_cause() {
    #[derive(Debug, Error)]
    #[error("nope")]
    struct Nope;

    let failure = ConstructionFailure::new(1, Nope);
    let clone = failure.clone();
    let other = ConstructionFailure::new(1, Nope);

    assert!(failure.same_failure(&clone));
    assert!(!failure.same_failure(&other));
}
