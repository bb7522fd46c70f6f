//! Sequencing combinators for `Future<Output = Result<T, E>>`.

use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

pin_project_lite::pin_project!(
    /// Produced by the [`bind()`](ChainExt::bind) method
    #[project = BindProj]
    pub enum Bind<Fut1, Fut2, F> {
        First {
            #[pin]
            fut: Fut1,
            f: Option<F>,
        },
        Second {
            #[pin]
            fut: Fut2,
        },
    }
);

impl<Fut1, Fut2, F, T, U, E> Future for Bind<Fut1, Fut2, F>
where
    Fut1: Future<Output = Result<T, E>>,
    F: FnOnce(T) -> Fut2,
    Fut2: Future<Output = Result<U, E>>,
{
    type Output = Result<U, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        loop {
            match self.as_mut().project() {
                BindProj::First { fut, f } => match ready!(fut.poll(cx)) {
                    Ok(value) => {
                        let f = f.take().unwrap();
                        self.set(Bind::Second { fut: f(value) });
                    }
                    Err(e) => return Poll::Ready(Err(e)),
                },
                BindProj::Second { fut } => return fut.poll(cx),
            }
        }
    }
}

pin_project_lite::pin_project!(
    /// Produced by the [`then_do()`](ChainExt::then_do) method
    #[project = ThenDoProj]
    pub enum ThenDo<Fut1, Fut2, F> {
        First {
            #[pin]
            fut: Fut1,
            f: Option<F>,
        },
        Second {
            #[pin]
            fut: Fut2,
        },
    }
);

impl<Fut1, Fut2, F, T, U, E> Future for ThenDo<Fut1, Fut2, F>
where
    Fut1: Future<Output = Result<T, E>>,
    F: FnOnce() -> Fut2,
    Fut2: Future<Output = Result<U, E>>,
{
    type Output = Result<U, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        loop {
            match self.as_mut().project() {
                ThenDoProj::First { fut, f } => match ready!(fut.poll(cx)) {
                    Ok(_) => {
                        let f = f.take().unwrap();
                        self.set(ThenDo::Second { fut: f() });
                    }
                    Err(e) => return Poll::Ready(Err(e)),
                },
                ThenDoProj::Second { fut } => return fut.poll(cx),
            }
        }
    }
}

/// Sequencing adaptors for fallible futures.
pub trait ChainExt<T, E>: Future<Output = Result<T, E>> + Sized {
    /// Monadic bind: on success, feed the value to `f` and continue with the
    /// future it produces; on failure, short-circuit without invoking `f`.
    ///
    /// # Example
    ///
    /// ```
    /// use accrete::ChainExt;
    /// use futures_util::future;
    ///
    /// let v = futures_executor::block_on(
    ///     future::ok::<i32, String>(2).bind(|x| future::ok(x + 1)),
    /// );
    /// assert_eq!(v, Ok(3));
    /// ```
    fn bind<U, F, Fut>(self, f: F) -> Bind<Self, Fut, F>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<U, E>>,
    {
        Bind::First {
            fut: self,
            f: Some(f),
        }
    }

    /// Like [`bind`](ChainExt::bind), but discards the prior success value.
    /// Useful for chaining side-effecting asynchronous steps.
    fn then_do<U, F, Fut>(self, f: F) -> ThenDo<Self, Fut, F>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<U, E>>,
    {
        ThenDo::First {
            fut: self,
            f: Some(f),
        }
    }
}

impl<Fut, T, E> ChainExt<T, E> for Fut where Fut: Future<Output = Result<T, E>> {}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_executor::block_on;
    use futures_util::future;
    use std::cell::Cell;

    #[test]
    fn bind_chains_on_success() {
        let v = block_on(future::ok::<i32, &str>(1).bind(|x| future::ok(x * 10)));
        assert_eq!(v, Ok(10));
    }

    #[test]
    fn bind_short_circuits_on_failure() {
        let invoked = Cell::new(false);
        let v = block_on(future::err::<i32, &str>("nope").bind(|x| {
            invoked.set(true);
            future::ok(x)
        }));
        assert_eq!(v, Err("nope"));
        assert!(!invoked.get());
    }

    #[test]
    fn then_do_discards_value() {
        let v = block_on(future::ok::<i32, &str>(1).then_do(|| future::ok("next")));
        assert_eq!(v, Ok("next"));
    }

    #[test]
    fn then_do_short_circuits_on_failure() {
        let invoked = Cell::new(false);
        let v = block_on(future::err::<i32, &str>("nope").then_do(|| {
            invoked.set(true);
            future::ok(2)
        }));
        assert_eq!(v, Err("nope"));
        assert!(!invoked.get());
    }
}
