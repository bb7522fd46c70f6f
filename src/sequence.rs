//! Folding fixed lists of asynchronous steps.

use std::future::Future;

use futures_util::future::{self, join_all, Ready};

/// A thunk producing an already-resolved success. Seeds chains.
pub fn always<T, E>(value: T) -> impl FnOnce() -> Ready<Result<T, E>> {
    move || future::ok(value)
}

/// An already-resolved unit success.
pub fn succeed<E>() -> Ready<Result<(), E>> {
    future::ok(())
}

/// Invoke `f` on each item strictly in order, short-circuiting on the first
/// failure. Items past the failure are never visited.
///
/// # Example
///
/// ```
/// use accrete::walk;
/// use futures_util::future;
///
/// let v = futures_executor::block_on(walk([1, 2, 3], |item| {
///     if item < 3 {
///         future::ok::<(), String>(())
///     } else {
///         future::err(format!("failed on {item}"))
///     }
/// }));
/// assert_eq!(v, Err("failed on 3".to_string()));
/// ```
pub async fn walk<I, F, Fut, E>(items: I, mut f: F) -> Result<(), E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    for item in items {
        f(item).await?;
    }
    Ok(())
}

/// Like [`walk`], threading an accumulator through `f`. The fixed-list
/// analogue of [`AsyncReducer`](crate::AsyncReducer)'s combine step.
///
/// # Example
///
/// ```
/// use accrete::walk_with;
/// use futures_util::future;
///
/// let v = futures_executor::block_on(walk_with([1, 2, 3], 10, |acc, item| {
///     future::ok::<i32, String>(acc + item)
/// }));
/// assert_eq!(v, Ok(16));
/// ```
pub async fn walk_with<I, T, F, Fut, E>(items: I, start: T, mut f: F) -> Result<T, E>
where
    I: IntoIterator,
    F: FnMut(T, I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut acc = start;
    for item in items {
        acc = f(acc, item).await?;
    }
    Ok(acc)
}

/// Run the thunks strictly in sequence, collecting the successes in order
/// and short-circuiting on the first failure. Unlike [`all_succeed`], later
/// thunks are not even started once one fails.
pub async fn accumulate<I, F, Fut, T, E>(thunks: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let thunks = thunks.into_iter();
    let mut results = Vec::with_capacity(thunks.size_hint().0);
    for thunk in thunks {
        results.push(thunk().await?);
    }
    Ok(results)
}

/// Await all futures concurrently, then fail with the first failure in input
/// order, or succeed with no payload.
pub async fn all_succeed<I, Fut, T, E>(futures: I) -> Result<(), E>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, E>>,
{
    for result in join_all(futures).await {
        result?;
    }
    Ok(())
}
