//! Hardware RNG adapter for `rand_core` consumers (TLS, network seed)

use esp_hal::rng::Rng;
use rand_core::{CryptoRng, RngCore};

/// The ESP32-S3 RNG draws from RF noise while the radio is running, which
/// is the only time TLS needs it.
#[derive(Clone, Copy)]
pub struct DeviceRng(Rng);

impl DeviceRng {
    pub fn new(rng: Rng) -> Self {
        Self(rng)
    }

    /// 64-bit seed for the network stack's port and sequence randomization
    pub fn seed(&mut self) -> u64 {
        self.next_u64()
    }
}

impl RngCore for DeviceRng {
    fn next_u32(&mut self) -> u32 {
        self.0.random()
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32()) << 32 | u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for DeviceRng {}
