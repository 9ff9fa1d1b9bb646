use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{MemeError, MemeResult};

/// Environment variable consulted by [`FontBook::from_env`].
pub const FONT_ENV: &str = "MEMEGIF_FONT";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush colour used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl TextBrushRgba8 {
    pub(crate) fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Shared, immutable font bytes. Cheap to clone into worker threads.
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    bytes: Option<Arc<Vec<u8>>>,
}

impl FontBook {
    /// No font: text is wrapped with fallback metrics but not drawn.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(Arc::new(bytes)),
        }
    }

    pub fn from_path(path: &Path) -> MemeResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font '{}'", path.display()))?;
        Ok(Self::from_bytes(bytes))
    }

    /// Load the font named by `MEMEGIF_FONT`, or an empty book when the variable is unset.
    pub fn from_env() -> MemeResult<Self> {
        match std::env::var_os(FONT_ENV) {
            Some(p) if !p.is_empty() => Self::from_path(Path::new(&p)),
            _ => Ok(Self::empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_none()
    }
}

struct Face {
    family: String,
    data: vello_cpu::peniko::FontData,
}

/// Measures and shapes single lines of text.
///
/// Without a font face, widths come from [`fallback_advance`] and [`TextEngine::layout_line`]
/// returns `None`.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    face: Option<Face>,
}

impl TextEngine {
    pub fn new(fonts: &FontBook) -> MemeResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let face = match &fonts.bytes {
            None => None,
            Some(bytes) => {
                let families = font_ctx
                    .collection
                    .register_fonts(parley::fontique::Blob::from(bytes.as_ref().clone()), None);
                let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
                    MemeError::validation("no font families registered from font bytes")
                })?;
                let family = font_ctx
                    .collection
                    .family_name(family_id)
                    .ok_or_else(|| MemeError::validation("registered font family has no name"))?
                    .to_string();
                let data = vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
                    0,
                );
                Some(Face { family, data })
            }
        };

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            face,
        })
    }

    pub fn has_font(&self) -> bool {
        self.face.is_some()
    }

    pub fn family(&self) -> Option<&str> {
        self.face.as_ref().map(|f| f.family.as_str())
    }

    pub(crate) fn font_data(&self) -> Option<&vello_cpu::peniko::FontData> {
        self.face.as_ref().map(|f| &f.data)
    }

    /// Advance width of `text` laid out on a single line.
    pub fn measure(&mut self, text: &str, size_px: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        match self.layout_line(text, size_px, TextBrushRgba8::default()) {
            Some(layout) => layout.width(),
            None => text.chars().map(|c| fallback_advance(c, size_px)).sum(),
        }
    }

    /// Shape `text` as one unbroken line.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> Option<parley::Layout<TextBrushRgba8>> {
        let face = self.face.as_ref()?;
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(face.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Some(layout)
    }
}

/// Deterministic advance used when no font is loaded: full em for wide (CJK, fullwidth, emoji)
/// characters, 0.55 em otherwise.
pub fn fallback_advance(ch: char, size_px: f32) -> f32 {
    if is_wide(ch) {
        size_px
    } else if ch.is_whitespace() {
        size_px * 0.3
    } else {
        size_px * 0.55
    }
}

fn is_wide(ch: char) -> bool {
    matches!(
        u32::from(ch),
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1F300..=0x1F64F
            | 0x1F900..=0x1F9FF
            | 0x20000..=0x3FFFD
    )
}

/// Greedy character-by-character wrap.
///
/// Characters are appended to the current line until the measured width of the candidate line
/// exceeds `max_width`, at which point the line is emitted and the character starts the next
/// one. Breaking per `char` (not per word) keeps dense CJK text wrapping correctly. A single
/// character wider than `max_width` sits alone on its line. Always returns at least one line.
pub fn wrap_chars(text: &str, max_width: f32, mut measure: impl FnMut(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for (n, ch) in text.chars().enumerate() {
        let mut candidate = line.clone();
        candidate.push(ch);
        if n > 0 && measure(&candidate) > max_width {
            lines.push(std::mem::take(&mut line));
            line.push(ch);
        } else {
            line = candidate;
        }
    }
    lines.push(line);
    lines
}

/// Vertical centres of `count` lines stacked with `line_height`, centred as a block on `center_y`.
pub fn block_line_centers(count: usize, center_y: f64, line_height: f64) -> Vec<f64> {
    let total = count as f64 * line_height;
    let start = center_y - total / 2.0 + line_height / 2.0;
    (0..count).map(|i| start + i as f64 * line_height).collect()
}

#[cfg(test)]
#[path = "../tests/unit/text/wrap.rs"]
mod tests;
