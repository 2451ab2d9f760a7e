/// A provider's constructor.
///
/// Stored as a plain function pointer so providers can be built in `const`
/// context and placed in `static`s.
pub(crate) enum Init<T, E> {
    Infallible(fn() -> T),
    Fallible(fn() -> Result<T, E>),
}
impl<T, E: std::error::Error> Init<T, E> {
    pub(crate) fn run(&self, attempt: u64) -> Result<T, E> {
        construct(attempt, || match self {
            Self::Infallible(init) => Ok(init()),
            Self::Fallible(init) => init(),
        })
    }
}

/// Runs one numbered construction attempt.
pub(crate) fn construct<T, E: std::error::Error>(
    attempt: u64,
    init: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    #[cfg(not(feature = "tracing"))]
    let _ = attempt;

    debug!(
        instance = std::any::type_name::<T>(),
        attempt, "constructing instance"
    );

    let result = init();

    match &result {
        Ok(_) => {
            debug!(
                instance = std::any::type_name::<T>(),
                attempt, "instance constructed"
            );
        }
        Err(_error) => {
            warn!(
                instance = std::any::type_name::<T>(),
                attempt,
                error = %_error,
                "instance construction failed"
            );
        }
    }

    result
}
