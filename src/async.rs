use async_once_cell::OnceCell;
use std::{fmt, future::Future, pin::Pin};

/// The constructor of an [`AsyncLazy`] instance.
pub type AsyncInit<T> = fn() -> Pin<Box<dyn Future<Output = T> + Send>>;

/// A provider whose instance is built by an asynchronous constructor on the
/// first `get_instance().await`.
///
/// Tasks that arrive while the constructor is running wait for it rather than
/// starting their own. If the constructing task is cancelled, a waiting task
/// takes over and runs the constructor again.
///
/// # Example
///
/// ```rust
/// use single_instance::AsyncLazy;
///
/// struct Pool {
///     size: usize,
/// }
///
/// static POOL: AsyncLazy<Pool> = AsyncLazy::new(|| {
///     Box::pin(async {
///         // Connect, warm up...
///         Pool { size: 8 }
///     })
/// });
///
/// # tokio_test::block_on(async {
/// let pool = POOL.get_instance().await;
///
/// assert_eq!(pool.size, 8);
/// # });
/// ```
pub struct AsyncLazy<T> {
    once: OnceCell<T>,
    init: AsyncInit<T>,
}
impl<T> AsyncLazy<T> {
    /// Creates a provider with an asynchronous constructor.
    pub const fn new(init: AsyncInit<T>) -> Self {
        Self {
            once: OnceCell::new(),
            init,
        }
    }

    /// Returns the instance, constructing it if this is the first access.
    pub async fn get_instance(&self) -> &T {
        if let Some(instance) = self.once.get() {
            return instance;
        }

        self.once
            .get_or_init(async {
                debug!(
                    instance = std::any::type_name::<T>(),
                    "constructing instance"
                );

                let instance = (self.init)().await;

                debug!(
                    instance = std::any::type_name::<T>(),
                    "instance constructed"
                );

                instance
            })
            .await
    }

    /// Returns the instance if it has already been constructed.
    ///
    /// This function never starts construction.
    pub fn peek(&self) -> Option<&T> {
        self.once.get()
    }

    /// Returns `true` if the instance has been constructed.
    pub fn is_initialized(&self) -> bool {
        self.peek().is_some()
    }
}
impl<T: fmt::Debug> fmt::Debug for AsyncLazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLazy")
            .field("instance", &self.peek())
            .finish_non_exhaustive()
    }
}

#[test]
fn test_lazy_initialization() {
    use std::sync::atomic::{AtomicU8, Ordering};

    static FOO_INITIALIZED: AtomicU8 = AtomicU8::new(0);

    struct Foo {
        bar: i32,
    }

    static FOO: AsyncLazy<Foo> = AsyncLazy::new(|| {
        Box::pin(async {
            FOO_INITIALIZED.fetch_add(1, Ordering::Release);

            Foo { bar: 42 }
        })
    });

    tokio_test::block_on(async {
        assert_eq!(FOO_INITIALIZED.load(Ordering::Acquire), 0);
        assert!(!FOO.is_initialized());

        let foo = FOO.get_instance().await;

        assert_eq!(FOO_INITIALIZED.load(Ordering::Acquire), 1);
        assert_eq!(foo.bar, 42);

        let again = FOO.get_instance().await;

        assert!(std::ptr::eq(foo, again));
        assert_eq!(FOO_INITIALIZED.load(Ordering::Acquire), 1);
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_constructed_once_across_tasks() {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    static BUILT: AtomicUsize = AtomicUsize::new(0);

    static FOO: AsyncLazy<Vec<u64>> = AsyncLazy::new(|| {
        Box::pin(async {
            BUILT.fetch_add(1, Ordering::SeqCst);

            tokio::task::yield_now().await;

            vec![1, 2, 3]
        })
    });

    let task_count = 50;

    let barrier = Arc::new(tokio::sync::Barrier::new(task_count));

    let tasks = (0..task_count)
        .map(|_| {
            let barrier = barrier.clone();

            tokio::spawn(async move {
                barrier.wait().await;

                FOO.get_instance().await as *const Vec<u64> as usize
            })
        })
        .collect::<Vec<_>>();

    let mut addresses = Vec::with_capacity(task_count);

    for task in tasks {
        addresses.push(task.await.unwrap());
    }

    assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    assert!(addresses.iter().all(|&address| address == addresses[0]));
}
