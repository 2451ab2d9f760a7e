//! Lazy initialization behind a lock that every call takes.

use crate::{attempt::Attempts, init::Init, ConstructionFailure, Provider};
use std::{cell::UnsafeCell, convert::Infallible, fmt, ops::Deref};

/// A provider that takes an exclusive lock on every access and constructs its
/// instance on the first one.
///
/// Simple and correct, but callers are serialized even after the instance
/// exists. Prefer [`Lazy`](crate::Lazy) unless the lock itself is wanted.
///
/// # Example
///
/// ```rust
/// use single_instance::Locked;
///
/// struct Config {
///     retries: u32,
/// }
///
/// static CONFIG: Locked<Config> = Locked::new(|| Config { retries: 3 });
///
/// assert_eq!(CONFIG.get_instance().retries, 3);
/// ```
pub struct Locked<T, E: std::error::Error + 'static = Infallible> {
    value: UnsafeCell<Option<T>>,
    attempts: Attempts<E>,
    init: Init<T, E>,
}
impl<T> Locked<T> {
    /// Creates a provider with an infallible constructor.
    pub const fn new(init: fn() -> T) -> Self {
        Self::with_init(Init::Infallible(init))
    }

    /// Returns the instance, constructing it if this is the first access.
    pub fn get_instance(&self) -> &T {
        match self.try_get_instance() {
            Ok(instance) => instance,
            Err(failure) => failure.unreachable(),
        }
    }
}
impl<T, E: std::error::Error + 'static> Locked<T, E> {
    /// Creates a provider whose constructor can fail.
    pub const fn fallible(init: fn() -> Result<T, E>) -> Self {
        Self::with_init(Init::Fallible(init))
    }

    const fn with_init(init: Init<T, E>) -> Self {
        Self {
            value: UnsafeCell::new(None),
            attempts: Attempts::new(),
            init,
        }
    }

    // Only called with the attempt lock held.
    unsafe fn slot(&self) -> Option<&T> {
        (*self.value.get()).as_ref()
    }
}
impl<T, E: std::error::Error + 'static> Provider for Locked<T, E> {
    type Instance = T;
    type Error = E;

    fn try_get_instance(&self) -> Result<&T, ConstructionFailure<E>> {
        self.attempts.run(
            || unsafe { self.slot() },
            |attempt| {
                let value = self.init.run(attempt)?;

                // The slot is only written while empty, so no reference into
                // it exists yet.
                let instance: &T = unsafe { (*self.value.get()).insert(value) };

                Ok(instance)
            },
        )
    }

    fn peek(&self) -> Option<&T> {
        self.attempts.with_lock(|| unsafe { self.slot() })
    }
}
impl<T> Deref for Locked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get_instance()
    }
}
impl<T: fmt::Debug, E: std::error::Error + 'static> fmt::Debug for Locked<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locked")
            .field("instance", &self.peek())
            .finish_non_exhaustive()
    }
}
unsafe impl<T: Send + Sync, E: std::error::Error + Send + Sync + 'static> Sync for Locked<T, E> {}

#[cfg(test)]
mod tests {
    use super::*;

    contract_tests!(Locked);
}
