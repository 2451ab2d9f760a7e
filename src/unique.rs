use std::{
    any::TypeId,
    collections::HashSet,
    fmt,
    sync::{LazyLock, Mutex, MutexGuard, PoisonError},
};

static CLAIMED: LazyLock<Mutex<HashSet<TypeId>>> = LazyLock::new(Default::default);

/// Proof that the holder is the only live instance of its type.
///
/// At most one `Unique` exists per type at any time. Embedding one in a
/// singleton type guards it against reconstruction: the type can no longer
/// derive `Clone`, `Copy` or `Default`, and any second constructor path fails
/// to claim its token.
///
/// Dropping the token releases the claim. A constructor that claims its token
/// and then fails drops it along with the rest of its partial state, so the
/// retry can claim it again.
///
/// # Example
///
/// ```rust
/// use single_instance::{Lazy, Unique};
///
/// struct Registry {
///     _unique: Unique,
///     entries: Vec<&'static str>,
/// }
///
/// static REGISTRY: Lazy<Registry> = Lazy::new(|| Registry {
///     _unique: Unique::claim::<Registry>(),
///     entries: vec!["default"],
/// });
///
/// assert_eq!(REGISTRY.entries.len(), 1);
/// assert!(Unique::try_claim::<Registry>().is_none());
/// ```
pub struct Unique {
    owner: TypeId,
    name: &'static str,
}
impl Unique {
    /// Claims the token for `T`.
    ///
    /// # Panics
    ///
    /// * If a token for `T` is already alive.
    pub fn claim<T: 'static>() -> Self {
        match Self::try_claim::<T>() {
            Some(unique) => unique,
            None => panic!(
                "Instance of {:?} already exists",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Attempts to claim the token for `T`, returning `None` if one is
    /// already alive.
    ///
    /// This function does not panic.
    #[must_use]
    pub fn try_claim<T: 'static>() -> Option<Self> {
        let owner = TypeId::of::<T>();

        if !claimed().insert(owner) {
            return None;
        }

        Some(Self {
            owner,
            name: std::any::type_name::<T>(),
        })
    }

    /// Returns `true` if a token for `T` is currently alive.
    pub fn is_claimed<T: 'static>() -> bool {
        claimed().contains(&TypeId::of::<T>())
    }
}
impl Drop for Unique {
    fn drop(&mut self) {
        claimed().remove(&self.owner);
    }
}
impl fmt::Debug for Unique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unique").field(&self.name).finish()
    }
}

fn claimed() -> MutexGuard<'static, HashSet<TypeId>> {
    CLAIMED.lock().unwrap_or_else(PoisonError::into_inner)
}

#[test]
fn test_claim_once_per_type() {
    struct Foo;
    struct Bar;

    let foo = Unique::claim::<Foo>();

    assert!(Unique::is_claimed::<Foo>());
    assert!(Unique::try_claim::<Foo>().is_none());

    let _bar = Unique::claim::<Bar>();

    drop(foo);

    assert!(!Unique::is_claimed::<Foo>());
    assert!(Unique::try_claim::<Foo>().is_some());
}

#[test]
#[should_panic = "already exists"]
fn test_second_claim_panics() {
    struct Foo;

    let _first = Unique::claim::<Foo>();
    let _second = Unique::claim::<Foo>();
}

#[test]
fn test_claim_race_has_one_winner() {
    struct Foo;

    let thread_count = 10;

    let barrier = std::sync::Barrier::new(thread_count);

    let winners = std::thread::scope(|s| {
        let threads = (0..thread_count)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();

                    Unique::try_claim::<Foo>()
                })
            })
            .collect::<Vec<_>>();

        threads
            .into_iter()
            .filter_map(|thread| thread.join().unwrap())
            .collect::<Vec<_>>()
    });

    assert_eq!(winners.len(), 1);
}

#[test]
fn test_failed_construction_releases_claim() {
    use crate::{Lazy, Provider};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, thiserror::Error)]
    #[error("backend unavailable")]
    struct Unavailable;

    struct Backend {
        _unique: Unique,
    }

    static BACKEND: Lazy<Backend, Unavailable> = Lazy::fallible(|| {
        let unique = Unique::claim::<Backend>();

        if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
            // `unique` is dropped here, before the retry claims it again.
            return Err(Unavailable);
        }

        Ok(Backend { _unique: unique })
    });

    assert!(BACKEND.try_get_instance().is_err());
    assert!(!Unique::is_claimed::<Backend>());

    assert!(BACKEND.try_get_instance().is_ok());
    assert!(Unique::is_claimed::<Backend>());
}
