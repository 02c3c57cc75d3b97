use futures::future::LocalBoxFuture;
use mb_provider::Timer;
use std::time::Duration;

/// `setTimeout`-backed delays for the bridge's timeouts and receipt polling.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTimer;

impl Timer for GlooTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        Box::pin(gloo_timers::future::sleep(duration))
    }
}
