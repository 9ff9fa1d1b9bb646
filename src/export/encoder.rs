use crate::export::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{MemeError, MemeResult};
use crate::render::FrameRGBA;

/// Fastest and coarsest NeuQuant setting accepted by `gif`.
pub const MAX_SPEED: i32 = 30;
/// Default palette quantization speed; 10 is the usual quality/speed trade-off.
pub const DEFAULT_SPEED: i32 = 10;

/// GIF frame delay in centiseconds for a frame interval in milliseconds (never 0).
pub fn delay_cs(frame_interval_ms: u32) -> u16 {
    let cs = (frame_interval_ms + 5) / 10;
    cs.clamp(1, u32::from(u16::MAX)) as u16
}

pub(crate) fn validate_speed(speed: i32) -> MemeResult<()> {
    if !(1..=MAX_SPEED).contains(&speed) {
        return Err(MemeError::validation(format!(
            "gif quantization speed must be in 1..={MAX_SPEED}, got {speed}"
        )));
    }
    Ok(())
}

/// Palette-quantize one rendered frame.
///
/// Split out from [`GifSink`] so export workers can quantize in parallel and hand finished frames
/// to the encoder in order.
pub(crate) fn quantize_frame(
    frame: &FrameRGBA,
    speed: i32,
    delay: u16,
) -> MemeResult<gif::Frame<'static>> {
    validate_speed(speed)?;
    let w: u16 = frame
        .width
        .try_into()
        .map_err(|_| MemeError::encode("frame width exceeds u16"))?;
    let h: u16 = frame
        .height
        .try_into()
        .map_err(|_| MemeError::encode("frame height exceeds u16"))?;
    if frame.data.len() != usize::from(w) * usize::from(h) * 4 {
        return Err(MemeError::encode("frame byte length mismatch"));
    }

    let mut rgba = frame.to_straight_rgba8();
    let mut out = gif::Frame::from_rgba_speed(w, h, &mut rgba, speed);
    out.delay = delay;
    Ok(out)
}

/// [`FrameSink`] that encodes an infinitely looping GIF into memory.
pub struct GifSink {
    speed: i32,
    encoder: Option<gif::Encoder<Vec<u8>>>,
    cfg: Option<SinkConfig>,
    delay: u16,
    written: u32,
    output: Option<Vec<u8>>,
}

impl GifSink {
    pub fn new(speed: i32) -> MemeResult<Self> {
        validate_speed(speed)?;
        Ok(Self {
            speed,
            encoder: None,
            cfg: None,
            delay: 1,
            written: 0,
            output: None,
        })
    }

    pub fn frames_written(&self) -> u32 {
        self.written
    }

    pub(crate) fn delay(&self) -> u16 {
        self.delay
    }

    /// Append a frame that was already quantized by [`quantize_frame`].
    pub(crate) fn push_quantized(&mut self, frame: &gif::Frame<'_>) -> MemeResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| MemeError::encode("gif sink used before begin"))?;
        if u32::from(frame.width) != cfg.width || u32::from(frame.height) != cfg.height {
            return Err(MemeError::encode(format!(
                "frame is {}x{}, gif is {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| MemeError::encode("gif sink already finished"))?;
        encoder
            .write_frame(frame)
            .map_err(|e| MemeError::encode(format!("write gif frame: {e}")))?;
        self.written += 1;
        Ok(())
    }

    /// Encoded bytes; only available after [`FrameSink::end`].
    pub fn into_bytes(self) -> MemeResult<Vec<u8>> {
        self.output
            .ok_or_else(|| MemeError::encode("gif sink was not finished"))
    }
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> MemeResult<()> {
        let w: u16 = cfg
            .width
            .try_into()
            .map_err(|_| MemeError::validation("gif width exceeds u16"))?;
        let h: u16 = cfg
            .height
            .try_into()
            .map_err(|_| MemeError::validation("gif height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(MemeError::validation("gif must be non-empty"));
        }

        let mut encoder = gif::Encoder::new(Vec::new(), w, h, &[])
            .map_err(|e| MemeError::encode(format!("create gif encoder: {e}")))?;
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .map_err(|e| MemeError::encode(format!("set gif repeat: {e}")))?;

        self.delay = delay_cs(cfg.frame_interval_ms);
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.written = 0;
        self.output = None;
        Ok(())
    }

    fn push_frame(&mut self, _idx: u32, frame: &FrameRGBA) -> MemeResult<()> {
        let quantized = quantize_frame(frame, self.speed, self.delay)?;
        self.push_quantized(&quantized)
    }

    fn end(&mut self) -> MemeResult<()> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| MemeError::encode("gif sink ended twice or never began"))?;
        let bytes = encoder
            .into_inner()
            .map_err(|e| MemeError::encode(format!("finish gif: {e}")))?;
        tracing::debug!(frames = self.written, bytes = bytes.len(), "gif finished");
        self.output = Some(bytes);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/encoder.rs"]
mod tests;
