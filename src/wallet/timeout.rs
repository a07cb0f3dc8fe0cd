//! Deadline around every provider-facing request. A wallet popup left open
//! must not park an operation forever.

use std::future::Future;
use std::time::Duration;

use super::error::{WalletError, WalletResult};

fn timed_out(method: &str, after: Duration) -> WalletError {
    WalletError::Timeout { method: method.into(), after_ms: after.as_millis() as u64 }
}

#[cfg(feature = "wasm")]
pub async fn with_timeout<T, F>(method: &str, after: Duration, fut: F) -> WalletResult<T>
where
    F: Future<Output = WalletResult<T>>,
{
    use futures::future::{select, Either};
    let sleep = gloo_timers::future::TimeoutFuture::new(after.as_millis().min(u32::MAX as u128) as u32);
    futures::pin_mut!(fut);
    futures::pin_mut!(sleep);
    match select(fut, sleep).await {
        Either::Left((result, _)) => result,
        Either::Right(_) => Err(timed_out(method, after)),
    }
}

#[cfg(all(feature = "native", not(feature = "wasm")))]
pub async fn with_timeout<T, F>(method: &str, after: Duration, fut: F) -> WalletResult<T>
where
    F: Future<Output = WalletResult<T>>,
{
    tokio::time::timeout(after, fut).await.map_err(|_| timed_out(method, after))?
}

#[cfg(not(any(feature = "native", feature = "wasm")))]
pub async fn with_timeout<T, F>(method: &str, after: Duration, fut: F) -> WalletResult<T>
where
    F: Future<Output = WalletResult<T>>,
{
    tracing::trace!(method, ?after, "no timer backend, request runs unbounded");
    fut.await
}
