//! Frame timing

/// Elapsed time and per-frame delta, both in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameClock {
    elapsed: f32,
    delta: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock to `elapsed` seconds since start
    pub fn advance_to(&mut self, elapsed: f32) {
        self.delta = elapsed - self.elapsed;
        self.elapsed = elapsed;
    }

    /// Seconds since start; drives the animations
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds since the previous frame
    pub fn delta(&self) -> f32 {
        self.delta
    }
}
