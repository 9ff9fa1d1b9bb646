use std::time::Instant;

use crate::assets::avatar::AvatarHandle;
use crate::config::RenderConfig;
use crate::render::{FrameRGBA, Renderer};

/// Drives the live preview.
///
/// The loop only remembers when it started. Each tick renders `(config, now - start)`, so a
/// config edit shows up on the very next tick and dropped ticks never accumulate drift.
/// An avatar that is still decoding renders as the placeholder.
pub struct PreviewLoop {
    renderer: Renderer,
    started: Instant,
    frame: FrameRGBA,
}

impl PreviewLoop {
    pub fn new(renderer: Renderer) -> Self {
        Self::started_at(renderer, Instant::now())
    }

    pub fn started_at(renderer: Renderer, started: Instant) -> Self {
        let frame = FrameRGBA::blank(renderer.layout().canvas);
        Self {
            renderer,
            started,
            frame,
        }
    }

    pub fn restart(&mut self, now: Instant) {
        self.started = now;
    }

    pub fn elapsed_ms(&self, now: Instant) -> f64 {
        now.saturating_duration_since(self.started).as_secs_f64() * 1000.0
    }

    pub fn tick(&mut self, config: &RenderConfig, avatar: &AvatarHandle, now: Instant) -> &FrameRGBA {
        let time_ms = self.elapsed_ms(now);
        let image = avatar.get();
        self.renderer
            .render_into(config, image.as_deref(), time_ms, &mut self.frame);
        &self.frame
    }

    /// Most recently rendered frame (blank before the first tick).
    pub fn frame(&self) -> &FrameRGBA {
        &self.frame
    }
}
