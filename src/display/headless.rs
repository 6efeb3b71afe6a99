// src/display/headless.rs

use crate::pipeline::{DisplayFrame, DisplaySink};

/// Accepts frames without showing them. Useful for benchmarks and CI.
#[derive(Debug, Default)]
pub struct HeadlessSink {
    frames: u64,
    last_pts: Option<i64>,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl DisplaySink for HeadlessSink {
    fn present(&mut self, frame: &DisplayFrame) -> anyhow::Result<()> {
        self.frames += 1;
        self.last_pts = frame.pts;
        if self.frames % 100 == 0 {
            log::debug!("headless: {} frames, last pts {:?}", self.frames, self.last_pts);
        }
        Ok(())
    }
}

impl Drop for HeadlessSink {
    fn drop(&mut self) {
        log::info!("headless display received {} frames", self.frames);
    }
}
