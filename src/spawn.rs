//! Execution contexts a fold can be dispatched onto.

use futures_core::future::BoxFuture;

/// Where an [`AsyncReducer`](crate::AsyncReducer) runs its fold task.
///
/// Implementations must poll the task to completion.
pub trait Spawn {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
impl Spawn for tokio::runtime::Handle {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        let _ = tokio::runtime::Handle::spawn(self, task);
    }
}

#[cfg(feature = "futures-executor")]
#[cfg_attr(docsrs, doc(cfg(feature = "futures-executor")))]
impl Spawn for futures_executor::ThreadPool {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.spawn_ok(task);
    }
}
