//! Frame timing from a millisecond tick counter.

/// Previous/current tick and the delta between them.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameClock {
    last_ticks: u64,
    new_ticks: u64,
    delta_time: f32,
}

impl FrameClock {
    pub fn new(start_ticks: u64) -> Self {
        Self {
            last_ticks: start_ticks,
            new_ticks: start_ticks,
            delta_time: 0.0,
        }
    }

    /// Advance to `now_ticks` (milliseconds) and return the delta in seconds.
    /// A counter that goes backwards yields a zero delta.
    pub fn tick(&mut self, now_ticks: u64) -> f32 {
        self.new_ticks = now_ticks;
        self.delta_time = now_ticks.saturating_sub(self.last_ticks) as f32 / 1000.0;
        self.last_ticks = now_ticks;
        self.delta_time
    }

    #[inline]
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.new_ticks
    }
}

/// Counts frames and reports the rate once per reporting window.
#[derive(Clone, Copy, Debug)]
pub struct FpsCounter {
    window_start: u64,
    frames: u32,
    window_ms: u64,
}

impl FpsCounter {
    pub fn new(start_ticks: u64) -> Self {
        Self {
            window_start: start_ticks,
            frames: 0,
            window_ms: 1000,
        }
    }

    /// Record one frame; returns the frame rate when a window has elapsed.
    pub fn frame(&mut self, now_ticks: u64) -> Option<f32> {
        self.frames += 1;
        let elapsed = now_ticks.saturating_sub(self.window_start);
        if elapsed < self.window_ms {
            return None;
        }
        let fps = self.frames as f32 * 1000.0 / elapsed as f32;
        self.frames = 0;
        self.window_start = now_ticks;
        Some(fps)
    }
}
