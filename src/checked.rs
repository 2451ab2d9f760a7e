//! Lazy initialization with double-checked locking.

use crate::{attempt::Attempts, init::Init, ConstructionFailure, Provider};
use std::{
    cell::UnsafeCell,
    convert::Infallible,
    fmt,
    mem::MaybeUninit,
    ops::Deref,
    sync::atomic::{AtomicU8, Ordering},
};

/// A provider that checks for its instance without locking, and only takes
/// the lock (and checks again) when the instance is missing.
///
/// The value is written before the state flag is set with [`Ordering::Release`],
/// and readers load the flag with [`Ordering::Acquire`] before touching the
/// value, so a reader that sees the flag set also sees every field of the
/// instance.
///
/// # Example
///
/// ```rust
/// use single_instance::DoubleChecked;
///
/// static NAMES: DoubleChecked<Vec<&str>> = DoubleChecked::new(|| vec!["a", "b"]);
///
/// assert_eq!(NAMES.get_instance().len(), 2);
/// ```
pub struct DoubleChecked<T, E: std::error::Error + 'static = Infallible> {
    value: UnsafeCell<MaybeUninit<T>>,
    state: AtomicU8,
    attempts: Attempts<E>,
    init: Init<T, E>,
}
impl<T> DoubleChecked<T> {
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
impl<T, E: std::error::Error + 'static> DoubleChecked<T, E> {
    const UNINITIALIZED: u8 = 0;
    const INITIALIZED: u8 = 1;

    /// Creates a provider whose constructor can fail.
    pub const fn fallible(init: fn() -> Result<T, E>) -> Self {
        Self::with_init(Init::Fallible(init))
    }

    const fn with_init(init: Init<T, E>) -> Self {
        Self {
            value: UnsafeCell::new(MaybeUninit::uninit()),
            state: AtomicU8::new(Self::UNINITIALIZED),
            attempts: Attempts::new(),
            init,
        }
    }

    fn publish(&self, value: T) -> &T {
        unsafe { (*self.value.get()).write(value) };

        self.state.store(Self::INITIALIZED, Ordering::Release);

        unsafe { (*self.value.get()).assume_init_ref() }
    }
}
impl<T, E: std::error::Error + 'static> Provider for DoubleChecked<T, E> {
    type Instance = T;
    type Error = E;

    fn try_get_instance(&self) -> Result<&T, ConstructionFailure<E>> {
        if let Some(instance) = self.peek() {
            return Ok(instance);
        }

        self.attempts.run(
            || self.peek(),
            |attempt| {
                let value = self.init.run(attempt)?;

                Ok(self.publish(value))
            },
        )
    }

    fn peek(&self) -> Option<&T> {
        if self.state.load(Ordering::Acquire) != Self::INITIALIZED {
            return None;
        }

        Some(unsafe { (*self.value.get()).assume_init_ref() })
    }
}
impl<T> Deref for DoubleChecked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.get_instance()
    }
}
impl<T, E: std::error::Error + 'static> Drop for DoubleChecked<T, E> {
    fn drop(&mut self) {
        let state = self.state.get_mut();

        if *state == Self::INITIALIZED {
            *state = Self::UNINITIALIZED;

            unsafe { self.value.get_mut().assume_init_drop() };
        }
    }
}
impl<T: fmt::Debug, E: std::error::Error + 'static> fmt::Debug for DoubleChecked<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleChecked")
            .field("instance", &self.peek())
            .finish_non_exhaustive()
    }
}
unsafe impl<T: Send + Sync, E: std::error::Error + Send + Sync + 'static> Sync
    for DoubleChecked<T, E>
{
}
