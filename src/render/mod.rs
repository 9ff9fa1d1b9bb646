//! Frame rasterization.
//!
//! [`Renderer`] paints one meme frame for a `(config, time)` pair. The live preview and the GIF
//! exporter both call it; there is no second drawing path.

pub(crate) mod blur;
pub mod cpu;

use crate::assets::color::Color;
use crate::foundation::core::{Canvas, Point, Rect, unpremultiply_rgba8_in_place};

pub use cpu::Renderer;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**; the `premultiplied` flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn blank(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgba_len()],
            premultiplied: true,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Straight-alpha copy of the pixels, as image encoders expect.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut out);
        }
        out
    }

    /// Stable content hash, handy for equality checks across threads.
    pub fn digest(&self) -> u64 {
        xxhash_rust::xxh3::xxh3_64(&self.data)
    }
}

/// Fixed scene geometry and styling.
///
/// Defaults reproduce the 600×400 meme layout: avatar bottom-left, bubble top-right.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneLayout {
    pub canvas: Canvas,
    pub background: Color,

    /// Avatar box before animation.
    pub avatar: Rect,
    pub square_corner_radius: f64,
    pub border_width: f64,
    pub border_color: Color,
    pub placeholder_fill: Color,
    pub placeholder_text_color: Color,
    pub placeholder_font_px: f32,

    pub bubble: Rect,
    pub bubble_radius: f64,
    /// Tail x offsets from the bubble's left edge: left base, tip, right base.
    pub tail: [f64; 3],
    pub shadow_color: Color,
    /// Canvas-style shadow blur; the Gaussian sigma is half of this.
    pub shadow_blur: f64,
    pub shadow_offset_y: f64,

    pub widget_font_px: f32,
    pub widget_color: Color,
    /// Right-aligned anchor of the widget label, relative to the bubble's top-right corner.
    pub widget_inset: (f64, f64),

    pub text_font_px: f32,
    pub line_height: f64,
    /// Horizontal padding subtracted from the bubble width to get the wrap budget.
    pub text_padding: f64,
}

impl Default for SceneLayout {
    fn default() -> Self {
        let canvas = Canvas::MEME;
        let avatar_size = 120.0;
        let avatar_x = 50.0;
        let avatar_y = f64::from(canvas.height) - 50.0 - avatar_size;
        Self {
            canvas,
            background: Color::WHITE,
            avatar: Rect::new(
                avatar_x,
                avatar_y,
                avatar_x + avatar_size,
                avatar_y + avatar_size,
            ),
            square_corner_radius: 20.0,
            border_width: 4.0,
            border_color: Color::from_rgba8(0x33, 0x33, 0x33, 255),
            placeholder_fill: Color::from_rgba8(0xee, 0xee, 0xee, 255),
            placeholder_text_color: Color::from_rgba8(0xcc, 0xcc, 0xcc, 255),
            placeholder_font_px: 14.0,
            bubble: Rect::new(180.0, 40.0, 180.0 + 380.0, 40.0 + 220.0),
            bubble_radius: 30.0,
            tail: [20.0, 40.0, 60.0],
            shadow_color: Color::rgba(0.0, 0.0, 0.0, 0.1),
            shadow_blur: 10.0,
            shadow_offset_y: 4.0,
            widget_font_px: 16.0,
            widget_color: Color::rgba(0.0, 0.0, 0.0, 0.4),
            widget_inset: (20.0, 30.0),
            text_font_px: 32.0,
            line_height: 40.0,
            text_padding: 40.0,
        }
    }
}

impl SceneLayout {
    /// Maximum width of one wrapped line of bubble text.
    pub fn text_budget(&self) -> f64 {
        (self.bubble.width() - self.text_padding).max(0.0)
    }

    pub fn bubble_center(&self) -> Point {
        self.bubble.center()
    }

    /// Tail triangle: left base, tip, right base.
    pub fn tail_points(&self) -> [Point; 3] {
        let b = self.bubble;
        let [left, tip, right] = self.tail;
        [
            Point::new(b.x0 + left, b.y1),
            Point::new(b.x0 + tip, b.y1 + 20.0),
            Point::new(b.x0 + right, b.y1),
        ]
    }

    pub fn widget_anchor(&self) -> Point {
        Point::new(
            self.bubble.x1 - self.widget_inset.0,
            self.bubble.y0 + self.widget_inset.1,
        )
    }
}

/// Cover-fit an `img_w × img_h` image into `bounds`: scale so the box is fully covered, then
/// centre so the overflow is cropped evenly on the long axis.
pub fn cover_fit(img_w: f64, img_h: f64, bounds: Rect) -> Rect {
    let (bw, bh) = (bounds.width(), bounds.height());
    if img_w <= 0.0 || img_h <= 0.0 || bw <= 0.0 || bh <= 0.0 {
        return bounds;
    }
    let scale = (bw / img_w).max(bh / img_h);
    let (dw, dh) = (img_w * scale, img_h * scale);
    let x0 = bounds.x0 + (bw - dw) / 2.0;
    let y0 = bounds.y0 + (bh - dh) / 2.0;
    Rect::new(x0, y0, x0 + dw, y0 + dh)
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
