//! Monotonic clock and delays used by the screen controller

/// Clock abstraction so the controller runs on embassy-time on the device
/// and on a fake clock in tests.
#[allow(async_fn_in_trait)]
pub trait Timer {
    /// Milliseconds since an arbitrary fixed point
    fn now_ms(&self) -> u64;

    async fn delay_ms(&mut self, ms: u32);
}
