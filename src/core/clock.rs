use std::time::Instant;

/// Monotonic elapsed-time source for hosts that have no audio clock.
///
/// The engine itself never reads time; every tick and input handler takes
/// the elapsed milliseconds as an argument, so a host that derives time
/// from audio playback position can substitute its own value.
#[derive(Clone, Copy, Debug)]
pub struct SessionClock {
    started: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    #[inline(always)]
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
