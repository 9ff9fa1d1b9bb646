use std::sync::Arc;

use anyhow::Context;
use base64::Engine as _;

use crate::foundation::core::premultiply_rgba8_in_place;
use crate::foundation::error::{MemeError, MemeResult};

/// Decoded avatar in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
    /// Content hash of the pixels; keys the renderer's paint cache.
    pub fingerprint: u64,
}

impl PreparedImage {
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> MemeResult<Self> {
        if width == 0 || height == 0 {
            return Err(MemeError::decode("image has zero size"));
        }
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(MemeError::decode("prepared image byte length mismatch"));
        }
        let fingerprint = xxhash_rust::xxh3::xxh3_64_with_seed(
            &rgba8_premul,
            (u64::from(width) << 32) | u64::from(height),
        );
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
            fingerprint,
        })
    }
}

/// Edge length the SVG avatar is rasterized at (2× the on-canvas avatar size).
pub const SVG_RASTER_PX: u32 = 240;

/// Decode raster (PNG, JPEG, GIF, WebP, ...) or SVG bytes.
pub fn decode_avatar_bytes(bytes: &[u8]) -> MemeResult<PreparedImage> {
    if looks_like_svg(bytes) {
        rasterize_svg(bytes, SVG_RASTER_PX)
    } else {
        decode_image(bytes)
    }
}

/// Raster avatars larger than this on either side are downscaled on decode.
pub const MAX_AVATAR_PX: u32 = 1024;

pub fn decode_image(bytes: &[u8]) -> MemeResult<PreparedImage> {
    let mut dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    if dyn_img.width() > MAX_AVATAR_PX || dyn_img.height() > MAX_AVATAR_PX {
        dyn_img = dyn_img.resize(
            MAX_AVATAR_PX,
            MAX_AVATAR_PX,
            image::imageops::FilterType::Triangle,
        );
    }
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    PreparedImage::from_premul_rgba8(width, height, rgba8_premul)
}

/// Rasterize an SVG so that its longer side is `max_side_px`, keeping the aspect ratio.
pub fn rasterize_svg(bytes: &[u8], max_side_px: u32) -> MemeResult<PreparedImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    let size = tree.size();
    let (sw, sh) = (size.width(), size.height());
    if !sw.is_finite() || !sh.is_finite() || sw <= 0.0 || sh <= 0.0 {
        return Err(MemeError::decode("svg has invalid width/height"));
    }
    let scale = max_side_px as f32 / sw.max(sh);
    let width = ((sw * scale).round() as u32).max(1);
    let height = ((sh * scale).round() as u32).max(1);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| MemeError::decode("failed to allocate svg pixmap"))?;
    let xform = resvg::tiny_skia::Transform::from_scale(
        width as f32 / sw,
        height as f32 / sh,
    );
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    // tiny-skia pixmaps are already premultiplied.
    PreparedImage::from_premul_rgba8(width, height, pixmap.data().to_vec())
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let head = String::from_utf8_lossy(head);
    let head = head.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

/// Resolve an avatar reference into raw bytes.
///
/// Accepts `data:<mime>;base64,<payload>` URLs (the form browser uploads produce), plain
/// `data:` URLs with percent-free ascii payloads, and filesystem paths.
pub fn load_source_bytes(source: &str) -> MemeResult<Vec<u8>> {
    let source = source.trim();
    if let Some(rest) = source.strip_prefix("data:") {
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| MemeError::decode("data url has no ',' separator"))?;
        if meta.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
            let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
            return base64::engine::general_purpose::STANDARD
                .decode(cleaned.as_bytes())
                .map_err(|e| MemeError::decode(format!("invalid base64 in data url: {e}")));
        }
        return Ok(payload.as_bytes().to_vec());
    }
    if source.is_empty() {
        return Err(MemeError::decode("avatar source is empty"));
    }
    std::fs::read(source)
        .with_context(|| format!("read avatar '{source}'"))
        .map_err(MemeError::from)
}

pub fn decode_avatar_source(source: &str) -> MemeResult<PreparedImage> {
    let bytes = load_source_bytes(source)?;
    decode_avatar_bytes(&bytes)
}
