//! A single-assignment future: fill once, await anywhere.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

enum State<V> {
    // One waker slot per live waiter; slots are never reused.
    Empty { wakers: Vec<Option<Waker>> },
    Filled { value: V },
}

/// A value that will be resolved exactly once, possibly on another task.
///
/// Handles are cheap to clone and all point at the same cell. Any number of
/// [`Waiter`]s can observe the resolution; each receives its own clone of
/// the value. A deferred that is never filled never completes its waiters.
///
/// # Example
///
/// ```
/// use accrete::Deferred;
///
/// let deferred = Deferred::new();
/// let waiter = deferred.waiter();
///
/// assert!(!deferred.is_filled());
/// deferred.fill(7).unwrap();
/// assert_eq!(deferred.fill(8), Err(8));
///
/// assert_eq!(futures_executor::block_on(waiter), 7);
/// ```
pub struct Deferred<V> {
    inner: Arc<Mutex<State<V>>>,
}

impl<V> Clone for Deferred<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Default for Deferred<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Deferred<V> {
    /// Create an unresolved deferred.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State::Empty { wakers: Vec::new() })),
        }
    }

    /// Create a deferred that has already resolved to `value`.
    pub fn resolved(value: V) -> Self {
        Self {
            inner: Arc::new(Mutex::new(State::Filled { value })),
        }
    }

    /// Resolve the deferred, waking every registered waiter.
    ///
    /// If it has already resolved, the value is handed back untouched and
    /// no waiter is woken.
    pub fn fill(&self, value: V) -> Result<(), V> {
        let mut state = self.inner.lock().unwrap();
        match &mut *state {
            State::Filled { .. } => Err(value),
            State::Empty { wakers } => {
                let wakers = std::mem::take(wakers);
                *state = State::Filled { value };
                drop(state);
                for waker in wakers.into_iter().flatten() {
                    waker.wake();
                }
                Ok(())
            }
        }
    }

    /// Has the deferred resolved?
    pub fn is_filled(&self) -> bool {
        matches!(&*self.inner.lock().unwrap(), State::Filled { .. })
    }

    /// Snapshot the resolved value, if any, without waiting.
    pub fn peek(&self) -> Option<V>
    where
        V: Clone,
    {
        match &*self.inner.lock().unwrap() {
            State::Filled { value } => Some(value.clone()),
            State::Empty { .. } => None,
        }
    }

    /// A future that completes with the resolved value.
    pub fn waiter(&self) -> Waiter<V> {
        Waiter {
            inner: Arc::clone(&self.inner),
            key: None,
        }
    }
}

/// Completion future of a [`Deferred`], produced by [`Deferred::waiter`].
pub struct Waiter<V> {
    inner: Arc<Mutex<State<V>>>,
    key: Option<usize>,
}

impl<V: Clone> Future for Waiter<V> {
    type Output = V;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<V> {
        let this = self.get_mut();
        let mut state = this.inner.lock().unwrap();
        match &mut *state {
            State::Filled { value } => Poll::Ready(value.clone()),
            State::Empty { wakers } => {
                match this.key {
                    Some(key) => wakers[key] = Some(cx.waker().clone()),
                    None => {
                        this.key = Some(wakers.len());
                        wakers.push(Some(cx.waker().clone()));
                    }
                }
                Poll::Pending
            }
        }
    }
}

impl<V> Drop for Waiter<V> {
    fn drop(&mut self) {
        let Some(key) = self.key else { return };
        let Ok(mut state) = self.inner.lock() else {
            return;
        };
        if let State::Empty { wakers } = &mut *state {
            wakers[key] = None;
        }
    }
}
