//! An appendable, asynchronous `reduce`.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_core::future::BoxFuture;
use futures_util::{future, FutureExt};
use tracing::{debug, trace};

use crate::deferred::{Deferred, Waiter};
use crate::spawn::Spawn;

/// The terminal future of an [`AsyncReducer`]: the one-time-resolved outcome
/// of the entire fold.
pub type Terminal<T, E> = Waiter<Result<T, E>>;

type Combine<T, U, E> = Box<dyn Fn(T, U) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// The only error an [`AsyncReducer`] raises itself. Failures produced by
/// the combine function propagate opaquely through the terminal instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReducerError {
    /// The terminal has already resolved; the reducer accepts no more items.
    #[error("reducer already finished")]
    AlreadyFilled,
}

enum Phase {
    Idle,
    Running,
    Finished,
}

struct FoldState<T, U, E> {
    queue: VecDeque<U>,
    // How many items have been handed to combine.
    taken: usize,
    phase: Phase,
    // Consumed on the Idle -> Running transition.
    seed: Option<BoxFuture<'static, Result<T, E>>>,
}

struct Inner<T, U, E> {
    combine: Combine<T, U, E>,
    spawner: Box<dyn Spawn + Send + Sync>,
    state: Mutex<FoldState<T, U, E>>,
    terminal: Deferred<Result<T, E>>,
}

impl<T, U, E> Inner<T, U, E> {
    fn finish(&self, result: Result<T, E>) {
        let state = self.state.lock().unwrap();
        self.finish_locked(state, result);
    }

    // Resolving the terminal and leaving Running happen under the one lock,
    // so append rejection, is_filled and the terminal value are never torn.
    fn finish_locked(&self, mut state: MutexGuard<'_, FoldState<T, U, E>>, result: Result<T, E>) {
        state.phase = Phase::Finished;
        if self.terminal.fill(result).is_err() {
            unreachable!("terminal resolved twice");
        }
    }
}

/// An appendable, asynchronous `reduce`.
///
/// The reducer starts empty; new items need to be [`append`](Self::append)ed.
/// Items are combined strictly in append order, one `combine` call at a
/// time, with the fold running as a single task on the injected [`Spawn`]
/// context. The reduced value is delivered through [`terminal`](Self::terminal),
/// which resolves exactly once: with the accumulator when every queued item
/// has been folded in, or with the first `combine` failure, which pre-empts
/// all remaining items. The terminal will not resolve if no items have ever
/// been appended. Once it has resolved, `append` fails with
/// [`ReducerError::AlreadyFilled`].
///
/// Handles are cheap to clone and share the same fold, so a combine step can
/// append more work to the reducer it belongs to.
///
/// # Example
///
/// ```
/// use accrete::{AsyncReducer, Spawn};
/// use futures_core::future::BoxFuture;
/// use futures_util::future;
///
/// struct Pool(futures_executor::ThreadPool);
///
/// impl Spawn for Pool {
///     fn spawn(&self, task: BoxFuture<'static, ()>) {
///         self.0.spawn_ok(task);
///     }
/// }
///
/// let pool = Pool(futures_executor::ThreadPool::new().unwrap());
/// let reducer = AsyncReducer::new(0, pool, |acc: i32, item: i32| {
///     future::ok::<i32, String>(acc + item)
/// });
///
/// let terminal = reducer.append_all([1, 2, 3, 4, 5]).unwrap();
/// assert_eq!(futures_executor::block_on(terminal), Ok(15));
/// ```
pub struct AsyncReducer<T, U, E> {
    inner: Arc<Inner<T, U, E>>,
}

impl<T, U, E> Clone for AsyncReducer<T, U, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, U, E> AsyncReducer<T, U, E>
where
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
{
    /// Create a reducer seeded with a concrete value.
    pub fn new<S, F, Fut>(initial: T, spawner: S, combine: F) -> Self
    where
        S: Spawn + Send + Sync + 'static,
        F: Fn(T, U) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::with_seed(future::ok(initial), spawner, combine)
    }

    /// Create a reducer whose seed is itself asynchronous. The fold awaits
    /// the seed before combining the first item; a seed failure resolves the
    /// terminal without any item being combined.
    pub fn with_seed<Sd, S, F, Fut>(seed: Sd, spawner: S, combine: F) -> Self
    where
        Sd: Future<Output = Result<T, E>> + Send + 'static,
        S: Spawn + Send + Sync + 'static,
        F: Fn(T, U) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                combine: Box::new(move |acc, item| combine(acc, item).boxed()),
                spawner: Box::new(spawner),
                state: Mutex::new(FoldState {
                    queue: VecDeque::new(),
                    taken: 0,
                    phase: Phase::Idle,
                    seed: Some(seed.boxed()),
                }),
                terminal: Deferred::new(),
            }),
        }
    }

    /// Append one item to the end of the queue.
    ///
    /// Fails with [`ReducerError::AlreadyFilled`] if the terminal has
    /// already resolved, mutating nothing.
    pub fn append(&self, item: U) -> Result<Terminal<T, E>, ReducerError> {
        self.append_all(std::iter::once(item))
    }

    /// Append a batch of items, in the order given, to the end of the queue.
    ///
    /// The first non-empty append starts the fold; appends that arrive while
    /// a combine call is in flight simply extend the queue the in-flight
    /// fold will drain. Returns a waiter on the same terminal every time, so
    /// the return value can be discarded in favour of observing
    /// [`terminal`](Self::terminal) once.
    ///
    /// Fails with [`ReducerError::AlreadyFilled`] if the terminal has
    /// already resolved, mutating nothing.
    pub fn append_all<I>(&self, items: I) -> Result<Terminal<T, E>, ReducerError>
    where
        I: IntoIterator<Item = U>,
    {
        let mut state = self.inner.state.lock().unwrap();
        if let Phase::Finished = state.phase {
            debug!("append rejected: reducer already finished");
            return Err(ReducerError::AlreadyFilled);
        }
        state.queue.extend(items);
        if matches!(state.phase, Phase::Idle) && !state.queue.is_empty() {
            state.phase = Phase::Running;
            let seed = state.seed.take().unwrap();
            trace!(queued = state.queue.len(), "fold started");
            self.inner
                .spawner
                .spawn(drive(Arc::clone(&self.inner), seed).boxed());
        }
        Ok(self.terminal())
    }

    /// A waiter on the terminal: the final accumulator, or the first
    /// combine (or seed) failure.
    pub fn terminal(&self) -> Terminal<T, E> {
        self.inner.terminal.waiter()
    }

    /// Has the fold finished? Once it has, no more items can be appended.
    pub fn is_filled(&self) -> bool {
        matches!(self.inner.state.lock().unwrap().phase, Phase::Finished)
    }
}

// The fold itself: a single task, so combine calls are never concurrent and
// items are consumed strictly in append order. The state lock is released
// across every await.
async fn drive<T, U, E>(inner: Arc<Inner<T, U, E>>, seed: BoxFuture<'static, Result<T, E>>)
where
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
{
    let mut acc = match seed.await {
        Ok(value) => value,
        Err(e) => {
            trace!("seed failed; resolving terminal");
            inner.finish(Err(e));
            return;
        }
    };
    loop {
        let item = {
            let mut state = inner.state.lock().unwrap();
            match state.queue.pop_front() {
                Some(item) => {
                    state.taken += 1;
                    item
                }
                None => {
                    trace!(combined = state.taken, "fold drained");
                    return inner.finish_locked(state, Ok(acc));
                }
            }
        };
        acc = match (inner.combine)(acc, item).await {
            Ok(next) => next,
            Err(e) => {
                trace!("combine failed; short-circuiting remaining items");
                inner.finish(Err(e));
                return;
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rt;

    impl Spawn for Rt {
        fn spawn(&self, task: BoxFuture<'static, ()>) {
            let _ = tokio::spawn(task);
        }
    }

    #[tokio::test]
    async fn starts_idle_and_unfilled() {
        let reducer: AsyncReducer<i32, i32, ()> =
            AsyncReducer::new(0, Rt, |a, b| future::ok(a + b));
        assert!(!reducer.is_filled());
    }

    #[tokio::test]
    async fn empty_append_does_not_start_the_fold() {
        let reducer: AsyncReducer<i32, i32, ()> =
            AsyncReducer::new(0, Rt, |a, b| future::ok(a + b));
        reducer.append_all(Vec::new()).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!reducer.is_filled());

        reducer.append(1).unwrap();
        assert_eq!(reducer.terminal().await, Ok(1));
    }

    #[tokio::test]
    async fn terminal_waiters_share_one_resolution() {
        let reducer: AsyncReducer<i32, i32, ()> =
            AsyncReducer::new(0, Rt, |a, b| future::ok(a + b));
        let first = reducer.terminal();
        let second = reducer.terminal();
        reducer.append_all([1, 2, 3]).unwrap();
        assert_eq!(first.await, Ok(6));
        assert_eq!(second.await, Ok(6));
    }
}
