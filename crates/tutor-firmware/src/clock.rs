//! [`Timer`] backed by `embassy-time`

use embassy_time::Instant;
use tutor_core::timer::Timer;

#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl Timer for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    async fn delay_ms(&mut self, ms: u32) {
        embassy_time::Timer::after_millis(u64::from(ms)).await;
    }
}
