/// Declares a lazily constructed, process-wide instance.
///
/// Expands to a `static` [`Lazy`](crate::Lazy). The `try` form declares a
/// fallible provider: the error type follows the instance type, and the
/// expression after `try` yields `Result<T, E>`.
///
/// # Example
///
/// ```rust
/// use single_instance::{singleton, Provider};
///
/// #[derive(Debug)]
/// struct Unreadable;
///
/// impl std::fmt::Display for Unreadable {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("could not read the banner")
///     }
/// }
///
/// impl std::error::Error for Unreadable {}
///
/// singleton! {
///     /// The application's name.
///     pub static NAME: String = String::from("demo");
/// }
///
/// singleton! {
///     static BANNER: String, Unreadable = try Ok(format!("== {} ==", *NAME));
/// }
///
/// assert_eq!(*NAME, "demo");
/// assert_eq!(BANNER.try_get_instance().unwrap(), "== demo ==");
/// ```
#[macro_export]
macro_rules! singleton {
    ($(#[$meta:meta])* $vis:vis static $name:ident: $ty:ty, $err:ty = try $init:expr;) => {
        $(#[$meta])*
        $vis static $name: $crate::Lazy<$ty, $err> = $crate::Lazy::fallible(|| $init);
    };
    ($(#[$meta:meta])* $vis:vis static $name:ident: $ty:ty = $init:expr;) => {
        $(#[$meta])*
        $vis static $name: $crate::Lazy<$ty> = $crate::Lazy::new(|| $init);
    };
}

#[cfg(test)]
mod tests {
    use crate::{Provider, Unique};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_singleton_is_lazy_and_unique() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);

        struct Foo {
            _unique: Unique,
            bar: i32,
        }

        singleton! {
            static FOO: Foo = {
                BUILT.fetch_add(1, Ordering::SeqCst);

                Foo {
                    _unique: Unique::claim::<Foo>(),
                    bar: 42,
                }
            };
        }

        assert_eq!(BUILT.load(Ordering::SeqCst), 0);
        assert!(!FOO.is_initialized());

        assert_eq!(FOO.bar, 42);
        assert!(std::ptr::eq(FOO.get_instance(), &*FOO));
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
        assert!(Unique::try_claim::<Foo>().is_none());
    }

    #[test]
    fn test_fallible_singleton() {
        #[derive(Debug, thiserror::Error)]
        #[error("port {0} is reserved")]
        struct Reserved(u16);

        singleton! {
            static PORT: u16, Reserved = try Err(Reserved(22));
        }

        let failure = PORT.try_get_instance().unwrap_err();

        assert_eq!(failure.cause().to_string(), "port 22 is reserved");
        assert!(PORT.peek().is_none());
    }

    #[test]
    fn test_result_typed_instance_is_infallible() {
        singleton! {
            static PARSED: Result<u8, std::num::ParseIntError> = "300".parse::<u8>();
        }

        assert!(PARSED.get_instance().is_err());
        assert!(PARSED.is_initialized());
    }
}
