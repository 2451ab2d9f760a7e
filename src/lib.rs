#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

#[macro_use]
mod log;


mod attempt;
mod checked;
mod eager;
mod error;
mod init;
mod lazy;
mod locked;
mod macros;
mod unique;

#[cfg(feature = "async")]
mod r#async;

pub use checked::DoubleChecked;
pub use eager::Eager;
pub use error::ConstructionFailure;
pub use lazy::Lazy;
pub use locked::Locked;
pub use unique::Unique;

#[cfg(feature = "async")]
pub use r#async::{AsyncInit, AsyncLazy};

/// The recommended provider: lazy, with exactly-once construction delegated
/// to [`std::sync::OnceLock`].
pub type InstanceProvider<T, E = std::convert::Infallible> = Lazy<T, E>;

/// Access to a single, process-wide instance.
///
/// Every successful call returns a reference to the same instance, and that
/// instance was fully constructed before any caller could observe it.
///
/// # Example
///
/// ```rust
/// use single_instance::{DoubleChecked, Lazy, Locked, Provider};
///
/// fn describe<P: Provider<Instance = String>>(provider: &P) -> String {
///     match provider.try_get_instance() {
///         Ok(instance) => instance.clone(),
///         Err(_) => String::from("<unavailable>"),
///     }
/// }
///
/// static A: Lazy<String> = Lazy::new(|| String::from("lazy"));
/// static B: Locked<String> = Locked::new(|| String::from("locked"));
/// static C: DoubleChecked<String> = DoubleChecked::new(|| String::from("checked"));
///
/// assert_eq!(describe(&A), "lazy");
/// assert_eq!(describe(&B), "locked");
/// assert_eq!(describe(&C), "checked");
/// ```
pub trait Provider {
    /// The type of the instance.
    type Instance;

    /// The error returned by the instance's constructor.
    type Error: std::error::Error + 'static;

    /// Returns the instance, constructing it if this is the first access.
    ///
    /// A failed construction is not cached: the next call that arrives after
    /// the failed attempt finished constructs again.
    fn try_get_instance(&self) -> Result<&Self::Instance, ConstructionFailure<Self::Error>>;

    /// Returns the instance if it has already been constructed.
    ///
    /// This function never starts construction.
    fn peek(&self) -> Option<&Self::Instance>;

    /// Returns `true` if the instance has been constructed.
    fn is_initialized(&self) -> bool {
        self.peek().is_some()
    }
}
