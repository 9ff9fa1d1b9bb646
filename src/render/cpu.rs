use std::sync::Arc;

use kurbo::Shape;

use crate::anim::AvatarMotion;
use crate::assets::color::Color;
use crate::assets::decode::PreparedImage;
use crate::config::{AvatarShape, RenderConfig};
use crate::foundation::core::{Affine, BezPath, Point, Rect, premul};
use crate::foundation::error::{MemeError, MemeResult};
use crate::render::blur::{blur_rgba8_premul, shadow_blur_params};
use crate::render::{FrameRGBA, SceneLayout, cover_fit};
use crate::text::{FontBook, TextBrushRgba8, TextEngine, block_line_centers, wrap_chars};

const PATH_TOLERANCE: f64 = 0.1;

/// CPU meme renderer powered by `vello_cpu`.
///
/// Output is a pure function of `(config, avatar pixels, time)`. The struct only holds caches
/// (raster context, shaped font, shadow sprite, avatar paint) that never change what gets drawn,
/// so one instance can serve a preview loop while other instances render an export.
pub struct Renderer {
    layout: SceneLayout,
    width: u16,
    height: u16,
    text: TextEngine,
    shadow: Option<ShadowSprite>,
    faded_shadow: Option<(u8, vello_cpu::Image)>,
    avatar_paint: Option<(u64, vello_cpu::Image)>,
    ctx: Option<vello_cpu::RenderContext>,
    surface: vello_cpu::Pixmap,
    warned_missing_font: bool,
}

/// Everything a [`Renderer`] needs that can be shared across threads.
///
/// The blurred shadow is computed once here; each worker then builds its own renderer with
/// [`RendererSeed::build`].
#[derive(Clone)]
pub(crate) struct RendererSeed {
    fonts: FontBook,
    layout: SceneLayout,
    shadow: Option<ShadowSprite>,
}

impl RendererSeed {
    pub(crate) fn new(fonts: &FontBook, layout: SceneLayout) -> MemeResult<Self> {
        layout.canvas.to_u16()?;
        let shadow = build_shadow_sprite(&layout)?;
        Ok(Self {
            fonts: fonts.clone(),
            layout,
            shadow,
        })
    }

    pub(crate) fn build(&self) -> MemeResult<Renderer> {
        let (width, height) = self.layout.canvas.to_u16()?;
        Ok(Renderer {
            layout: self.layout.clone(),
            width,
            height,
            text: TextEngine::new(&self.fonts)?,
            shadow: self.shadow.clone(),
            faded_shadow: None,
            avatar_paint: None,
            ctx: None,
            surface: vello_cpu::Pixmap::new(width, height),
            warned_missing_font: false,
        })
    }
}

#[derive(Clone)]
struct ShadowSprite {
    image: vello_cpu::Image,
    /// Premultiplied sprite pixels, kept for fading under translucent bubbles.
    pixels: Arc<Vec<u8>>,
    origin: Point,
    width: f64,
    height: f64,
}

#[derive(Clone, Copy, Debug)]
enum HAlign {
    Center,
    Right,
}

#[derive(Clone, Copy, Debug)]
enum VAnchor {
    /// Anchor is the vertical middle of the line box.
    Middle,
    /// Anchor is the alphabetic baseline.
    Baseline,
}

impl Renderer {
    pub fn new(fonts: &FontBook) -> MemeResult<Self> {
        Self::with_layout(fonts, SceneLayout::default())
    }

    pub fn with_layout(fonts: &FontBook, layout: SceneLayout) -> MemeResult<Self> {
        RendererSeed::new(fonts, layout)?.build()
    }

    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    pub fn text_engine(&mut self) -> &mut TextEngine {
        &mut self.text
    }

    /// Render one frame into a freshly allocated buffer.
    pub fn render(
        &mut self,
        config: &RenderConfig,
        avatar: Option<&PreparedImage>,
        time_ms: f64,
    ) -> FrameRGBA {
        let mut out = FrameRGBA::blank(self.layout.canvas);
        self.render_into(config, avatar, time_ms, &mut out);
        out
    }

    /// Render one frame into `target`, reusing its allocation.
    ///
    /// Never fails: a missing or undrawable avatar becomes the placeholder, bad colours fall back
    /// to defaults, and negative or non-finite times are treated as 0.
    pub fn render_into(
        &mut self,
        config: &RenderConfig,
        avatar: Option<&PreparedImage>,
        time_ms: f64,
        target: &mut FrameRGBA,
    ) {
        let time_ms = if time_ms.is_finite() {
            time_ms.max(0.0)
        } else {
            0.0
        };

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == self.width && ctx.height() == self.height => ctx,
            _ => vello_cpu::RenderContext::new(self.width, self.height),
        };
        ctx.reset();
        self.paint(&mut ctx, config, avatar, time_ms);
        ctx.flush();

        clear_pixmap(&mut self.surface);
        ctx.render_to_pixmap(&mut self.surface);
        self.ctx = Some(ctx);

        target.width = u32::from(self.width);
        target.height = u32::from(self.height);
        target.premultiplied = true;
        target.data.clear();
        target
            .data
            .extend_from_slice(self.surface.data_as_u8_slice());
    }

    /// Wrap bubble text exactly as [`Renderer::render`] lays it out.
    pub fn wrap_bubble_text(&mut self, text: &str) -> Vec<String> {
        let size = self.layout.text_font_px;
        let budget = self.layout.text_budget() as f32;
        let engine = &mut self.text;
        wrap_chars(text, budget, |s| engine.measure(s, size))
    }

    fn paint(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        config: &RenderConfig,
        avatar: Option<&PreparedImage>,
        time_ms: f64,
    ) {
        let Self {
            layout,
            width,
            height,
            text,
            shadow,
            faded_shadow,
            avatar_paint,
            warned_missing_font,
            ..
        } = self;

        if !text.has_font() && !*warned_missing_font {
            tracing::warn!("no font loaded; text is wrapped but not drawn");
            *warned_missing_font = true;
        }

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        // Background.
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(layout.background.to_cpu());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(*width),
            f64::from(*height),
        ));

        // Avatar.
        let motion = AvatarMotion::sample(config.animation_type, time_ms);
        let placed = motion.placed_box(layout.avatar);
        let xf = motion.transform_about(placed);
        let paint = avatar.and_then(|img| avatar_paint_for(avatar_paint, img));
        match (paint, avatar) {
            (Some(paint), Some(img)) => {
                draw_avatar_image(ctx, layout, config, placed, xf, paint, img);
            }
            _ => {
                let disc = kurbo::Circle::new(placed.center(), placed.width() / 2.0)
                    .to_path(PATH_TOLERANCE);
                ctx.set_transform(affine_to_cpu(xf));
                ctx.set_paint(layout.placeholder_fill.to_cpu());
                ctx.fill_path(&bezpath_to_cpu(&disc));
                draw_text_line(
                    ctx,
                    text,
                    "No Image",
                    layout.placeholder_font_px,
                    layout.placeholder_text_color,
                    placed.center(),
                    (HAlign::Center, VAnchor::Middle),
                    xf,
                );
            }
        }

        // Bubble: shadow sprite first so it never lands on the text drawn afterwards.
        // The shadow scales with the fill's alpha, so a transparent bubble casts none.
        let bubble_color = Color::parse_or(&config.bubble_bg_color, Color::WHITE);
        if let Some(s) = shadow
            && let Some(paint) = shadow_paint_for(faded_shadow, s, bubble_color.to_rgba8()[3])
        {
            ctx.set_transform(affine_to_cpu(Affine::translate(s.origin.to_vec2())));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, s.width, s.height));
        }

        let bubble = kurbo::RoundedRect::from_rect(layout.bubble, layout.bubble_radius)
            .to_path(PATH_TOLERANCE);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(bubble_color.to_cpu());
        ctx.fill_path(&bezpath_to_cpu(&bubble));

        let [a, tip, b] = layout.tail_points();
        let mut tail = BezPath::new();
        tail.move_to(a);
        tail.line_to(tip);
        tail.line_to(b);
        tail.close_path();
        ctx.fill_path(&bezpath_to_cpu(&tail));

        if config.show_widget {
            draw_text_line(
                ctx,
                text,
                &config.widget_text,
                layout.widget_font_px,
                layout.widget_color,
                layout.widget_anchor(),
                (HAlign::Right, VAnchor::Baseline),
                Affine::IDENTITY,
            );
        }

        let text_color = Color::parse_or(&config.text_color, Color::BLACK);
        let size = layout.text_font_px;
        let lines = wrap_chars(&config.bubble_text, layout.text_budget() as f32, |s| {
            text.measure(s, size)
        });
        let center = layout.bubble_center();
        let ys = block_line_centers(lines.len(), center.y, layout.line_height);
        for (line, y) in lines.iter().zip(ys) {
            draw_text_line(
                ctx,
                text,
                line,
                size,
                text_color,
                Point::new(center.x, y),
                (HAlign::Center, VAnchor::Middle),
                Affine::IDENTITY,
            );
        }
    }
}

fn draw_avatar_image(
    ctx: &mut vello_cpu::RenderContext,
    layout: &SceneLayout,
    config: &RenderConfig,
    placed: Rect,
    xf: Affine,
    paint: vello_cpu::Image,
    img: &PreparedImage,
) {
    let clip = avatar_clip_path(config.avatar_shape, placed, layout.square_corner_radius);
    let (iw, ih) = (f64::from(img.width), f64::from(img.height));
    let dst = cover_fit(iw, ih, placed);

    ctx.set_transform(affine_to_cpu(xf));
    ctx.push_clip_layer(&bezpath_to_cpu(&clip));
    let img_xf = xf
        * Affine::translate((dst.x0, dst.y0))
        * Affine::scale_non_uniform(dst.width() / iw, dst.height() / ih);
    ctx.set_transform(affine_to_cpu(img_xf));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
    ctx.pop_layer();

    if config.show_avatar_border {
        ctx.set_transform(affine_to_cpu(xf));
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(layout.border_width));
        ctx.set_paint(layout.border_color.to_cpu());
        ctx.stroke_path(&bezpath_to_cpu(&clip));
    }
}

fn avatar_clip_path(shape: AvatarShape, placed: Rect, corner_radius: f64) -> BezPath {
    match shape {
        AvatarShape::Circle => {
            kurbo::Circle::new(placed.center(), placed.width() / 2.0).to_path(PATH_TOLERANCE)
        }
        AvatarShape::Square => {
            kurbo::RoundedRect::from_rect(placed, corner_radius).to_path(PATH_TOLERANCE)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_text_line(
    ctx: &mut vello_cpu::RenderContext,
    engine: &mut TextEngine,
    text: &str,
    size_px: f32,
    color: Color,
    anchor: Point,
    (align, v): (HAlign, VAnchor),
    base: Affine,
) {
    if text.is_empty() {
        return;
    }
    let brush = TextBrushRgba8::from_array(color.to_rgba8());
    let Some(layout) = engine.layout_line(text, size_px, brush) else {
        return;
    };
    let Some(font) = engine.font_data().cloned() else {
        return;
    };

    let w = f64::from(layout.width());
    let x0 = match align {
        HAlign::Center => anchor.x - w / 2.0,
        HAlign::Right => anchor.x - w,
    };
    let y0 = match v {
        VAnchor::Middle => anchor.y - f64::from(layout.height()) / 2.0,
        VAnchor::Baseline => {
            anchor.y
                - layout
                    .lines()
                    .next()
                    .map(|l| f64::from(l.metrics().baseline))
                    .unwrap_or(0.0)
        }
    };

    ctx.set_transform(affine_to_cpu(base * Affine::translate((x0, y0))));
    ctx.set_paint(color.to_cpu());
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn avatar_paint_for(
    cache: &mut Option<(u64, vello_cpu::Image)>,
    img: &PreparedImage,
) -> Option<vello_cpu::Image> {
    if let Some((fingerprint, paint)) = cache
        && *fingerprint == img.fingerprint
    {
        return Some(paint.clone());
    }

    match image_premul_bytes_to_pixmap(img.rgba8_premul.as_slice(), img.width, img.height) {
        Ok(pixmap) => {
            let paint = pixmap_paint(pixmap);
            *cache = Some((img.fingerprint, paint.clone()));
            Some(paint)
        }
        Err(e) => {
            tracing::warn!(error = %e, "avatar cannot be drawn; using placeholder");
            None
        }
    }
}

fn build_shadow_sprite(layout: &SceneLayout) -> MemeResult<Option<ShadowSprite>> {
    if layout.shadow_color.a <= 0.0 {
        return Ok(None);
    }

    let (radius, sigma) = shadow_blur_params(layout.shadow_blur);
    let pad = f64::from(radius) + 1.0;
    let b = layout.bubble;
    let w = (b.width() + 2.0 * pad).ceil() as u32;
    let h = (b.height() + 2.0 * pad).ceil() as u32;
    let w16: u16 = w
        .try_into()
        .map_err(|_| MemeError::validation("shadow width exceeds u16"))?;
    let h16: u16 = h
        .try_into()
        .map_err(|_| MemeError::validation("shadow height exceeds u16"))?;

    let local = kurbo::RoundedRect::new(
        pad,
        pad,
        pad + b.width(),
        pad + b.height(),
        layout.bubble_radius,
    )
    .to_path(PATH_TOLERANCE);

    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    ctx.set_paint(layout.shadow_color.to_cpu());
    ctx.fill_path(&bezpath_to_cpu(&local));
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    ctx.render_to_pixmap(&mut pixmap);

    let blurred = blur_rgba8_premul(pixmap.data_as_u8_slice(), w, h, radius, sigma.max(1e-3))?;
    let pixmap = image_premul_bytes_to_pixmap(&blurred, w, h)?;

    Ok(Some(ShadowSprite {
        image: pixmap_paint(pixmap),
        pixels: Arc::new(blurred),
        origin: Point::new(b.x0 - pad, b.y0 - pad + layout.shadow_offset_y),
        width: f64::from(w),
        height: f64::from(h),
    }))
}

/// Shadow paint for a bubble fill with alpha `alpha`; `None` when nothing would show.
fn shadow_paint_for(
    cache: &mut Option<(u8, vello_cpu::Image)>,
    sprite: &ShadowSprite,
    alpha: u8,
) -> Option<vello_cpu::Image> {
    match alpha {
        0 => return None,
        255 => return Some(sprite.image.clone()),
        _ => {}
    }
    if let Some((cached, paint)) = cache.as_ref()
        && *cached == alpha
    {
        return Some(paint.clone());
    }

    let faded: Vec<u8> = sprite.pixels.iter().map(|&c| premul(c, alpha)).collect();
    match image_premul_bytes_to_pixmap(&faded, sprite.width as u32, sprite.height as u32) {
        Ok(pixmap) => {
            let paint = pixmap_paint(pixmap);
            *cache = Some((alpha, paint.clone()));
            Some(paint)
        }
        Err(e) => {
            tracing::warn!(error = %e, "faded shadow cannot be built; drawing it at full strength");
            Some(sprite.image.clone())
        }
    }
}

fn pixmap_paint(pixmap: vello_cpu::Pixmap) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> MemeResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| MemeError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| MemeError::validation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(MemeError::validation("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
