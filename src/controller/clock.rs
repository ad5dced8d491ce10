use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        /// Seconds since startup, read from `window.performance`
        pub struct FrameClock {
            performance: Option<web_sys::Performance>,
            start_ms: f64,
        }

        impl FrameClock {
            pub fn new() -> Self {
                let performance = web_sys::window().and_then(|w| w.performance());
                let start_ms = performance.as_ref().map(|p| p.now()).unwrap_or(0.0);
                Self { performance, start_ms }
            }

            pub fn elapsed(&self) -> f64 {
                let now = self.performance.as_ref().map(|p| p.now()).unwrap_or(self.start_ms);
                (now - self.start_ms) / 1000.0
            }
        }
    } else {
        use std::time::Instant;

        /// Seconds since startup, monotonic
        pub struct FrameClock {
            start: Instant,
        }

        impl FrameClock {
            pub fn new() -> Self {
                Self { start: Instant::now() }
            }

            pub fn elapsed(&self) -> f64 {
                self.start.elapsed().as_secs_f64()
            }
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames per second averaged over roughly one second windows
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    last: Option<f64>,
    frame_count: u32,
    window: f64,
    fps: f32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now` seconds and return the current estimate
    pub fn tick(&mut self, now: f64) -> f32 {
        if let Some(last) = self.last {
            self.frame_count += 1;
            self.window += (now - last).max(0.0);
            if self.window >= 1.0 {
                self.fps = (self.frame_count as f64 / self.window) as f32;
                self.frame_count = 0;
                self.window = 0.0;
            }
        }
        self.last = Some(now);
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_moves_forward() {
        let clock = FrameClock::new();
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(a >= 0.0 && b >= a);
    }

    #[test]
    fn fps_over_one_second() {
        let mut counter = FpsCounter::new();
        let mut fps = 0.0;
        for frame in 0..=120 {
            fps = counter.tick(frame as f64 / 60.0);
        }
        assert!((fps - 60.0).abs() < 0.5, "got {fps}");
    }
}
