//! Lazy initialization delegated to [`OnceLock`].

use crate::{
    attempt::Attempts,
    init::{self, Init},
    ConstructionFailure, Provider,
};
use std::{convert::Infallible, fmt, ops::Deref, sync::OnceLock};

/// A provider that constructs its instance on first access, relying on
/// [`OnceLock`] for exactly-once initialization.
///
/// This is the recommended provider, exported as
/// [`InstanceProvider`](crate::InstanceProvider). Once the instance exists,
/// reads cost a single [`OnceLock::get`].
///
/// Infallible constructors run inside [`OnceLock::get_or_init`]. Fallible
/// constructors are serialized first so that callers waiting on a failed
/// attempt all receive that attempt's [`ConstructionFailure`].
///
/// # Example
///
/// ```rust
/// use single_instance::{InstanceProvider, Provider};
///
/// #[derive(Debug)]
/// struct Missing;
///
/// impl std::fmt::Display for Missing {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("HOME is not set")
///     }
/// }
///
/// impl std::error::Error for Missing {}
///
/// static HOME: InstanceProvider<String, Missing> =
///     InstanceProvider::fallible(|| std::env::var("HOME").map_err(|_| Missing));
///
/// match HOME.try_get_instance() {
///     Ok(home) => println!("home is {home}"),
///     Err(failure) => println!("{failure}: {}", failure.cause()),
/// }
/// ```
pub struct Lazy<T, E: std::error::Error + 'static = Infallible> {
    once: OnceLock<T>,
    attempts: Attempts<E>,
    init: Init<T, E>,
}
impl<T> Lazy<T> {
    /// Creates a provider with an infallible constructor.
    ///
    /// # Example
    ///
    /// ```rust
    /// use single_instance::Lazy;
    ///
    /// static GREETING: Lazy<String> = Lazy::new(|| "hello".to_uppercase());
    ///
    /// assert_eq!(*GREETING, "HELLO");
    /// ```
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
impl<T, E: std::error::Error + 'static> Lazy<T, E> {
    /// Creates a provider whose constructor can fail.
    pub const fn fallible(init: fn() -> Result<T, E>) -> Self {
        Self::with_init(Init::Fallible(init))
    }

    const fn with_init(init: Init<T, E>) -> Self {
        Self {
            once: OnceLock::new(),
            attempts: Attempts::new(),
            init,
        }
    }
}
impl<T, E: std::error::Error + 'static> Provider for Lazy<T, E> {
    type Instance = T;
    type Error = E;

    fn try_get_instance(&self) -> Result<&T, ConstructionFailure<E>> {
        if let Some(instance) = self.once.get() {
            return Ok(instance);
        }

        match &self.init {
            Init::Infallible(ctor) => Ok(self.once.get_or_init(|| {
                self.attempts.numbered(|attempt| {
                    match init::construct(attempt, || Ok::<_, Infallible>(ctor())) {
                        Ok(instance) => instance,
                        Err(never) => match never {},
                    }
                })
            })),
            Init::Fallible(_) => self.attempts.run(
                || self.once.get(),
                |attempt| {
                    let value = self.init.run(attempt)?;

                    Ok(self.once.get_or_init(|| value))
                },
            ),
        }
    }

    fn peek(&self) -> Option<&T> {
        self.once.get()
    }
}
impl<T> Deref for Lazy<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get_instance()
    }
}
impl<T: fmt::Debug, E: std::error::Error + 'static> fmt::Debug for Lazy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("instance", &self.peek())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    contract_tests!(Lazy);

    #[test]
    fn test_deref_reads_instance() {
        static NUMBERS: Lazy<Vec<u32>> = Lazy::new(|| (1..=4).collect());

        assert_eq!(NUMBERS.iter().sum::<u32>(), 10);
        assert!(std::ptr::eq(&*NUMBERS, NUMBERS.get_instance()));
    }

    #[test]
    fn test_debug_shows_instance_once_built() {
        let provider = Lazy::new(|| 5u8);

        assert_eq!(format!("{provider:?}"), "Lazy { instance: None, .. }");

        let _ = provider.get_instance();

        assert_eq!(format!("{provider:?}"), "Lazy { instance: Some(5), .. }");
    }
}
