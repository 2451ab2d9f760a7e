//! Eager initialization.

use crate::{init, ConstructionFailure, Provider};
use std::{convert::Infallible, fmt, ops::Deref};

/// A provider whose instance exists before any access is possible.
///
/// In a `static`, [`Eager::new`] is evaluated at compile time, so there is
/// nothing left to construct when the program runs. Values that can only be
/// built at runtime go through [`Eager::build`] or [`Eager::try_build`], which
/// run the constructor immediately.
///
/// Reads never synchronize. The cost is that the instance is built even if
/// nothing ever reads it.
///
/// # Example
///
/// ```rust
/// use single_instance::Eager;
///
/// struct Limits {
///     max_connections: usize,
/// }
///
/// static LIMITS: Eager<Limits> = Eager::new(Limits { max_connections: 64 });
///
/// assert_eq!(LIMITS.get_instance().max_connections, 64);
/// ```
pub struct Eager<T> {
    value: T,
}
impl<T> Eager<T> {
    /// Wraps an already constructed value.
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Runs `init` now and wraps its result.
    pub fn build(init: impl FnOnce() -> T) -> Self {
        match Self::try_build(|| Ok::<_, Infallible>(init())) {
            Ok(eager) => eager,
            Err(failure) => failure.unreachable(),
        }
    }

    /// Runs `init` now, surfacing its error to the caller instead of
    /// producing a provider.
    pub fn try_build<E: std::error::Error + 'static>(
        init: impl FnOnce() -> Result<T, E>,
    ) -> Result<Self, ConstructionFailure<E>> {
        init::construct(1, init)
            .map(Self::new)
            .map_err(|cause| ConstructionFailure::new(1, cause))
    }

    /// Returns the instance.
    pub const fn get_instance(&self) -> &T {
        &self.value
    }
}
impl<T> Provider for Eager<T> {
    type Instance = T;
    type Error = Infallible;

    fn try_get_instance(&self) -> Result<&T, ConstructionFailure<Infallible>> {
        Ok(&self.value)
    }

    fn peek(&self) -> Option<&T> {
        Some(&self.value)
    }
}
impl<T> Deref for Eager<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}
impl<T: fmt::Debug> fmt::Debug for Eager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eager")
            .field("instance", &self.value)
            .finish()
    }
}
