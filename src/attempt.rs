use crate::ConstructionFailure;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, MutexGuard, PoisonError,
};

/// Serializes construction attempts for the lazy providers and hands a failed
/// attempt's error to every caller that was waiting on it.
pub(crate) struct Attempts<E: std::error::Error + 'static> {
    last_failure: Mutex<Option<ConstructionFailure<E>>>,
    // Attempts are numbered in the order they finish, so this is also the
    // number of the most recently finished attempt.
    finished: AtomicU64,
}
impl<E: std::error::Error + 'static> Attempts<E> {
    pub(crate) const fn new() -> Self {
        Self {
            last_failure: Mutex::new(None),
            finished: AtomicU64::new(0),
        }
    }

    /// Runs `attempt` under the next attempt number.
    ///
    /// Callers must already be serialized, either by the attempt lock or by
    /// the cell being initialized.
    pub(crate) fn numbered<R>(&self, attempt: impl FnOnce(u64) -> R) -> R {
        let finish = Finish {
            finished: &self.finished,
            attempt: self.finished.load(Ordering::Acquire) + 1,
        };

        attempt(finish.attempt)
    }

    /// Takes the attempt lock, then returns `existing()` if the instance is
    /// already there, the failure of an attempt that finished while this
    /// caller waited if there was one, or the outcome of a fresh `construct`
    /// call.
    ///
    /// `construct` runs with the lock held, so at most one attempt is ever in
    /// flight.
    pub(crate) fn run<R>(
        &self,
        existing: impl FnOnce() -> Option<R>,
        construct: impl FnOnce(u64) -> Result<R, E>,
    ) -> Result<R, ConstructionFailure<E>> {
        self.run_after(self.arrival(), existing, construct)
    }

    /// The number of attempts finished before this caller arrived.
    fn arrival(&self) -> u64 {
        self.finished.load(Ordering::Acquire)
    }

    fn run_after<R>(
        &self,
        arrival: u64,
        existing: impl FnOnce() -> Option<R>,
        construct: impl FnOnce(u64) -> Result<R, E>,
    ) -> Result<R, ConstructionFailure<E>> {
        let mut last_failure = self.lock();

        if let Some(instance) = existing() {
            return Ok(instance);
        }

        if let Some(failure) = last_failure
            .as_ref()
            .filter(|failure| failure.attempt() > arrival)
        {
            return Err(failure.clone());
        }

        self.numbered(|attempt| match construct(attempt) {
            Ok(instance) => {
                *last_failure = None;

                Ok(instance)
            }
            Err(cause) => {
                let failure = ConstructionFailure::new(attempt, cause);

                *last_failure = Some(failure.clone());

                Err(failure)
            }
        })
    }

    /// Runs `f` while holding the attempt lock, without starting an attempt.
    pub(crate) fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock();

        f()
    }

    // A constructor that panicked poisons the lock without having touched the
    // stored failure, so the guard is still valid.
    fn lock(&self) -> MutexGuard<'_, Option<ConstructionFailure<E>>> {
        self.last_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Records an attempt as finished when dropped, including on unwind.
struct Finish<'a> {
    finished: &'a AtomicU64,
    attempt: u64,
}
impl Drop for Finish<'_> {
    fn drop(&mut self) {
        self.finished.store(self.attempt, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("try again")]
    struct TryAgain;

    #[test]
    fn test_existing_short_circuits() {
        let attempts = Attempts::<TryAgain>::new();

        let result = attempts.run(|| Some(7), |_| -> Result<i32, _> { unreachable!() });

        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_attempts_are_numbered() {
        let attempts = Attempts::<TryAgain>::new();

        let first = attempts.run(|| None::<()>, |_| Err(TryAgain)).unwrap_err();
        let second = attempts
            .run(|| None, |attempt| Ok::<_, TryAgain>(attempt))
            .unwrap();

        assert_eq!(first.attempt(), 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn test_late_caller_retries_after_failure() {
        let attempts = Attempts::<TryAgain>::new();

        let _ = attempts.run(|| None::<()>, |_| Err(TryAgain));

        // The failed attempt finished before this caller arrived.
        let mut ran = false;
        let _ = attempts.run(
            || None::<()>,
            |_| {
                ran = true;
                Ok(())
            },
        );

        assert!(ran);
    }

    #[test]
    fn test_caller_arriving_before_attempt_starts_shares_failure() {
        let attempts = Attempts::<TryAgain>::new();

        // Arrives before another caller takes the lock and numbers its
        // attempt, then only gets the lock once that attempt has failed.
        let arrival = attempts.arrival();

        let first = attempts.run(|| None::<()>, |_| Err(TryAgain)).unwrap_err();

        let second = attempts
            .run_after(arrival, || None::<()>, |_| -> Result<(), _> { panic!("retried") })
            .unwrap_err();

        assert!(first.same_failure(&second));
        assert_eq!(second.attempt(), 1);
    }

    #[test]
    fn test_waiting_caller_shares_failure() {
        let attempts = Attempts::<TryAgain>::new();
        let started = std::sync::Barrier::new(2);
        let release = std::sync::Barrier::new(2);

        std::thread::scope(|s| {
            let first = s.spawn(|| {
                attempts.run(
                    || None::<()>,
                    |_| {
                        started.wait();
                        release.wait();
                        Err(TryAgain)
                    },
                )
            });

            started.wait();

            let second = s.spawn(|| {
                attempts.run(|| None::<()>, |_| -> Result<(), _> { panic!("retried") })
            });

            // Give the second caller time to arrive and block.
            std::thread::sleep(std::time::Duration::from_millis(50));
            release.wait();

            let first = first.join().unwrap().unwrap_err();
            let second = second.join().unwrap().unwrap_err();

            assert!(first.same_failure(&second));
            assert_eq!(second.attempt(), 1);
        });
    }

    #[test]
    fn test_panicking_attempt_still_finishes() {
        let attempts = Attempts::<TryAgain>::new();

        let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            attempts.run(|| None::<()>, |_| -> Result<(), _> { panic!("boom") })
        }));

        assert!(panicked.is_err());
        assert_eq!(attempts.arrival(), 1);

        let retried = attempts.run(|| None, |attempt| Ok::<_, TryAgain>(attempt));

        assert_eq!(retried.unwrap(), 2);
    }
}
