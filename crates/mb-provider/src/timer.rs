use futures::future::{Either, LocalBoxFuture, select};
use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use crate::ProviderError;

/// Source of delays for timeouts and receipt polling.
///
/// The browser build sleeps on `setTimeout`, native builds on tokio.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Races `fut` against `limit`. `None` waits indefinitely.
pub async fn with_timeout<F, T, E>(timer: &dyn Timer, limit: Option<Duration>, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<ProviderError>,
{
    let Some(limit) = limit else {
        return fut.await;
    };

    let fut = pin!(fut);
    match select(fut, timer.sleep(limit)).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(ProviderError::Timeout(limit).into()),
    }
}

#[cfg(feature = "tokio")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[cfg(feature = "tokio")]
impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    struct TokioSleep;

    impl Timer for TokioSleep {
        fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
            tokio::time::sleep(duration).boxed_local()
        }
    }

    #[tokio::test]
    async fn completes_before_limit() {
        let result: Result<u8, ProviderError> =
            with_timeout(&TokioSleep, Some(Duration::from_secs(5)), async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn hung_future_times_out() {
        let limit = Duration::from_millis(20);
        let result: Result<u8, ProviderError> =
            with_timeout(&TokioSleep, Some(limit), futures::future::pending()).await;
        assert_eq!(result, Err(ProviderError::Timeout(limit)));
    }
}
