//! Fixed-duration GIF export.
//!
//! An export samples the animation at `sample_rate_hz` for `duration_ms`, renders each sample
//! with a renderer it owns, and encodes the frames in index order into a looping GIF. Frames
//! can be rendered and palette-quantized in parallel; the encoder still sees them in order.

pub mod encoder;
pub mod sink;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rayon::prelude::*;

use crate::assets::decode::PreparedImage;
use crate::config::RenderConfig;
use crate::foundation::error::{MemeError, MemeResult};
use crate::render::cpu::RendererSeed;
use crate::render::{FrameRGBA, Renderer, SceneLayout};
use crate::text::FontBook;

pub use encoder::{DEFAULT_SPEED, GifSink, MAX_SPEED, delay_cs};
pub use sink::{FrameSink, InMemorySink, SinkConfig};

pub const DEFAULT_DURATION_MS: u32 = 2000;
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportThreading {
    pub parallel: bool,
    /// Worker count; `None` lets rayon decide.
    pub threads: Option<usize>,
}

impl Default for ExportThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

/// Export parameters. The defaults produce 40 frames of 600×400 at 50 ms each.
#[derive(Clone, Debug)]
pub struct ExportParams {
    pub duration_ms: u32,
    pub sample_rate_hz: u32,
    pub layout: SceneLayout,
    /// NeuQuant speed, `1..=30`; higher is faster and coarser.
    pub speed: i32,
    pub threading: ExportThreading,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            layout: SceneLayout::default(),
            speed: DEFAULT_SPEED,
            threading: ExportThreading::default(),
        }
    }
}

impl ExportParams {
    pub fn validate(&self) -> MemeResult<()> {
        if self.duration_ms == 0 {
            return Err(MemeError::validation("export duration must be > 0 ms"));
        }
        if self.sample_rate_hz == 0 || self.sample_rate_hz > 1000 {
            return Err(MemeError::validation(
                "export sample rate must be in 1..=1000 Hz",
            ));
        }
        if self.threading.threads == Some(0) {
            return Err(MemeError::validation(
                "export threading 'threads' must be >= 1 when set",
            ));
        }
        self.layout.canvas.to_u16()?;
        encoder::validate_speed(self.speed)
    }

    /// Number of samples in `[0, duration_ms)`.
    pub fn frame_count(&self) -> u32 {
        let n = (u64::from(self.duration_ms) * u64::from(self.sample_rate_hz)).div_ceil(1000);
        n.min(u64::from(u32::MAX)) as u32
    }

    /// Animation time of frame `idx`.
    pub fn frame_time_ms(&self, idx: u32) -> f64 {
        f64::from(idx) * 1000.0 / f64::from(self.sample_rate_hz.max(1))
    }

    /// Sample interval rounded to whole milliseconds.
    pub fn frame_interval_ms(&self) -> u32 {
        let rate = self.sample_rate_hz.max(1);
        (1000 + rate / 2) / rate
    }

    pub fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            width: self.layout.canvas.width,
            height: self.layout.canvas.height,
            frame_count: self.frame_count(),
            frame_interval_ms: self.frame_interval_ms(),
        }
    }
}

/// A finished export. Nothing is written to disk until [`GifArtifact::save_in`] is called.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GifArtifact {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub frame_delay_ms: u32,
    pub suggested_filename: String,
}

impl GifArtifact {
    /// Write the GIF into `dir` under its suggested file name.
    pub fn save_in(&self, dir: &Path) -> MemeResult<PathBuf> {
        let path = dir.join(&self.suggested_filename);
        self.save_as(&path)?;
        Ok(path)
    }

    pub fn save_as(&self, path: &Path) -> MemeResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("write gif '{}'", path.display()))?;
        Ok(())
    }
}

/// Download name for an export: up to 10 characters of `bubble_text` with everything other than
/// ASCII alphanumerics and CJK unified ideographs (U+4E00..=U+9FA5) replaced by `_`, falling back
/// to `meme`, then `_` and the last four digits of the timestamp.
pub fn suggested_filename(bubble_text: &str, timestamp_ms: u64) -> String {
    let stem: String = bubble_text
        .chars()
        .take(10)
        .map(|c| {
            if c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(&c) {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "meme" } else { &stem };
    format!("{stem}_{:04}.gif", timestamp_ms % 10_000)
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Export `config` as a looping GIF, naming it after the current time.
pub fn export_animation(
    config: &RenderConfig,
    avatar: Option<&PreparedImage>,
    fonts: &FontBook,
    params: &ExportParams,
) -> MemeResult<GifArtifact> {
    export_animation_at(config, avatar, fonts, params, now_ms())
}

/// Like [`export_animation`] with an explicit timestamp for the suggested file name.
#[tracing::instrument(
    skip_all,
    fields(
        animation = %config.animation_type,
        frames = params.frame_count(),
        parallel = params.threading.parallel
    )
)]
pub fn export_animation_at(
    config: &RenderConfig,
    avatar: Option<&PreparedImage>,
    fonts: &FontBook,
    params: &ExportParams,
    timestamp_ms: u64,
) -> MemeResult<GifArtifact> {
    params.validate()?;
    let cfg = params.sink_config();
    let seed = RendererSeed::new(fonts, params.layout.clone())?;
    let mut sink = GifSink::new(params.speed)?;

    if params.threading.parallel && cfg.frame_count > 1 {
        sink.begin(cfg)?;
        let pool = build_thread_pool(params.threading.threads)?;
        let delay = sink.delay();
        let quantized = pool.install(|| {
            (0..cfg.frame_count)
                .into_par_iter()
                .map_init(
                    || seed.build(),
                    |worker, idx| -> MemeResult<gif::Frame<'static>> {
                        let renderer = worker.as_mut().map_err(|e| {
                            MemeError::validation(format!("worker renderer init failed: {e}"))
                        })?;
                        let frame = renderer.render(config, avatar, params.frame_time_ms(idx));
                        encoder::quantize_frame(&frame, params.speed, delay)
                    },
                )
                .collect::<Vec<_>>()
        });
        for frame in quantized {
            sink.push_quantized(&frame?)?;
        }
        sink.end()?;
    } else {
        let mut renderer = seed.build()?;
        render_sequential(&mut renderer, config, avatar, params, &mut sink)?;
    }

    let bytes = sink.into_bytes()?;
    tracing::debug!(bytes = bytes.len(), "export finished");
    Ok(GifArtifact {
        bytes,
        width: cfg.width,
        height: cfg.height,
        frame_count: cfg.frame_count,
        frame_delay_ms: u32::from(delay_cs(cfg.frame_interval_ms)) * 10,
        suggested_filename: suggested_filename(&config.bubble_text, timestamp_ms),
    })
}

/// Render every export sample into `sink`, one at a time and in order.
pub fn render_frames_to_sink(
    config: &RenderConfig,
    avatar: Option<&PreparedImage>,
    fonts: &FontBook,
    params: &ExportParams,
    sink: &mut dyn FrameSink,
) -> MemeResult<()> {
    params.validate()?;
    let mut renderer = Renderer::with_layout(fonts, params.layout.clone())?;
    render_sequential(&mut renderer, config, avatar, params, sink)
}

fn render_sequential(
    renderer: &mut Renderer,
    config: &RenderConfig,
    avatar: Option<&PreparedImage>,
    params: &ExportParams,
    sink: &mut dyn FrameSink,
) -> MemeResult<()> {
    let cfg = params.sink_config();
    sink.begin(cfg)?;
    let mut frame = FrameRGBA::blank(params.layout.canvas);
    for idx in 0..cfg.frame_count {
        renderer.render_into(config, avatar, params.frame_time_ms(idx), &mut frame);
        sink.push_frame(idx, &frame)?;
    }
    sink.end()
}

fn build_thread_pool(threads: Option<usize>) -> MemeResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("memegif-export-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MemeError::encode(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/export/params.rs"]
mod tests;
