use super::*;

fn renderer() -> Renderer {
    Renderer::new(&FontBook::empty()).unwrap()
}

fn still(config: RenderConfig) -> RenderConfig {
    RenderConfig {
        animation_type: crate::config::AnimationType::None,
        ..config
    }
}

fn solid_image(rgba: [u8; 4], w: u32, h: u32) -> PreparedImage {
    PreparedImage::from_premul_rgba8(w, h, rgba.repeat((w * h) as usize)).unwrap()
}

fn assert_px_near(actual: [u8; 4], expected: [u8; 4], tol: i32) {
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (i32::from(*a) - i32::from(e)).abs() <= tol,
            "pixel {actual:?} not within {tol} of {expected:?}"
        );
    }
}

#[test]
fn frame_has_canvas_size_and_white_background() {
    let mut r = renderer();
    let f = r.render(&RenderConfig::default(), None, 0.0);
    assert_eq!((f.width, f.height), (600, 400));
    assert_eq!(f.data.len(), 600 * 400 * 4);
    assert!(f.premultiplied);
    assert_eq!(f.pixel(5, 5), [255, 255, 255, 255]);
    assert_eq!(f.pixel(595, 395), [255, 255, 255, 255]);
}

#[test]
fn placeholder_disc_is_drawn_without_avatar() {
    let mut r = renderer();
    let f = r.render(&still(RenderConfig::default()), None, 0.0);
    assert_px_near(f.pixel(110, 260), [0xee, 0xee, 0xee, 255], 1);
    // Outside the disc but inside the avatar box.
    assert_eq!(f.pixel(52, 232), [255, 255, 255, 255]);
}

#[test]
fn bubble_and_tail_use_configured_colour() {
    let mut r = renderer();
    let cfg = still(RenderConfig {
        bubble_bg_color: "#ff0000".to_owned(),
        ..RenderConfig::default()
    });
    let f = r.render(&cfg, None, 0.0);
    assert_px_near(f.pixel(370, 150), [255, 0, 0, 255], 1);
    assert_px_near(f.pixel(220, 270), [255, 0, 0, 255], 1);
}

#[test]
fn invalid_bubble_colour_falls_back_to_white() {
    let mut r = renderer();
    let cfg = still(RenderConfig {
        bubble_bg_color: "definitely not a colour".to_owned(),
        ..RenderConfig::default()
    });
    let f = r.render(&cfg, None, 0.0);
    assert_eq!(f.pixel(370, 150), [255, 255, 255, 255]);
}

#[test]
fn shadow_darkens_just_below_the_bubble() {
    let mut r = renderer();
    let f = r.render(&still(RenderConfig::default()), None, 0.0);
    let px = f.pixel(370, 263);
    assert!(px[0] < 252, "expected shadow below bubble, got {px:?}");
    assert_eq!(px[3], 255);
    // Far from the bubble the background is untouched.
    assert_eq!(f.pixel(370, 330), [255, 255, 255, 255]);
}

#[test]
fn shadow_follows_bubble_fill_alpha() {
    let mut r = renderer();
    let opaque = r.render(&still(RenderConfig::default()), None, 0.0).pixel(370, 263);

    let half = still(RenderConfig {
        bubble_bg_color: "rgba(255, 255, 255, 0.5)".to_owned(),
        ..RenderConfig::default()
    });
    let half = r.render(&half, None, 0.0).pixel(370, 263);
    assert!(
        opaque[0] < half[0] && half[0] < 255,
        "half-alpha shadow {half:?} should be lighter than {opaque:?}"
    );

    let clear = still(RenderConfig {
        bubble_bg_color: "transparent".to_owned(),
        ..RenderConfig::default()
    });
    assert_eq!(r.render(&clear, None, 0.0).pixel(370, 263), [255, 255, 255, 255]);
}

#[test]
fn faded_shadow_paint_is_cached_by_alpha() {
    let sprite = build_shadow_sprite(&SceneLayout::default()).unwrap().unwrap();
    let mut cache = None;
    assert!(shadow_paint_for(&mut cache, &sprite, 0).is_none());
    assert!(shadow_paint_for(&mut cache, &sprite, 255).is_some());
    assert!(cache.is_none());
    assert!(shadow_paint_for(&mut cache, &sprite, 128).is_some());
    assert_eq!(cache.as_ref().map(|(a, _)| *a), Some(128));
}

#[test]
fn shadow_sprite_is_padded_by_blur_radius() {
    let layout = SceneLayout::default();
    let sprite = build_shadow_sprite(&layout).unwrap().unwrap();
    assert_eq!(sprite.origin, Point::new(164.0, 28.0));
    assert_eq!((sprite.width, sprite.height), (412.0, 252.0));

    let no_shadow = SceneLayout {
        shadow_color: Color::rgba(0.0, 0.0, 0.0, 0.0),
        ..SceneLayout::default()
    };
    assert!(build_shadow_sprite(&no_shadow).unwrap().is_none());
}

#[test]
fn rendering_is_deterministic() {
    let cfg = RenderConfig::default();
    let mut a = renderer();
    let mut b = renderer();
    for t in [0.0, 250.0, 1234.5] {
        assert_eq!(a.render(&cfg, None, t).digest(), b.render(&cfg, None, t).digest());
        assert_eq!(a.render(&cfg, None, t).digest(), a.render(&cfg, None, t).digest());
    }
}

#[test]
fn static_animation_ignores_time() {
    let mut r = renderer();
    let cfg = still(RenderConfig::default());
    let first = r.render(&cfg, None, 0.0).digest();
    assert_eq!(r.render(&cfg, None, 1234.0).digest(), first);
    assert_eq!(r.render(&cfg, None, -50.0).digest(), first);
    assert_eq!(r.render(&cfg, None, f64::NAN).digest(), first);
}

#[test]
fn breathe_changes_frames_over_time() {
    let mut r = renderer();
    let cfg = RenderConfig::default();
    assert_ne!(
        r.render(&cfg, None, 0.0).digest(),
        r.render(&cfg, None, 500.0).digest()
    );
}

#[test]
fn square_avatar_image_fills_box_and_gets_border() {
    let mut r = renderer();
    let img = solid_image([0, 0, 255, 255], 4, 4);
    let mut cfg = still(RenderConfig::default());
    cfg.avatar_shape = AvatarShape::Square;
    cfg.show_avatar_border = false;

    let f = r.render(&cfg, Some(&img), 0.0);
    assert_px_near(f.pixel(110, 290), [0, 0, 255, 255], 1);
    assert_px_near(f.pixel(60, 290), [0, 0, 255, 255], 1);

    cfg.show_avatar_border = true;
    let f = r.render(&cfg, Some(&img), 0.0);
    assert_px_near(f.pixel(110, 290), [0, 0, 255, 255], 1);
    assert_px_near(f.pixel(50, 290), [0x33, 0x33, 0x33, 255], 2);
}

#[test]
fn circle_avatar_is_clipped() {
    let mut r = renderer();
    let img = solid_image([0, 128, 0, 255], 8, 8);
    let mut cfg = still(RenderConfig::default());
    cfg.show_avatar_border = false;
    let f = r.render(&cfg, Some(&img), 0.0);
    assert_px_near(f.pixel(110, 290), [0, 128, 0, 255], 1);
    assert_eq!(f.pixel(52, 232), [255, 255, 255, 255]);
}

#[test]
fn avatar_paint_is_cached_by_fingerprint() {
    let a = solid_image([1, 2, 3, 255], 2, 2);
    let b = solid_image([9, 2, 3, 255], 2, 2);
    let mut cache = None;
    assert!(avatar_paint_for(&mut cache, &a).is_some());
    assert_eq!(cache.as_ref().map(|(fp, _)| *fp), Some(a.fingerprint));
    assert!(avatar_paint_for(&mut cache, &b).is_some());
    assert_eq!(cache.as_ref().map(|(fp, _)| *fp), Some(b.fingerprint));
}

#[test]
fn render_into_resizes_target() {
    let mut r = renderer();
    let mut target = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![0; 4],
        premultiplied: false,
    };
    r.render_into(&RenderConfig::default(), None, 0.0, &mut target);
    assert_eq!((target.width, target.height), (600, 400));
    assert_eq!(target.data.len(), 600 * 400 * 4);
    assert!(target.premultiplied);
}

#[test]
fn bubble_text_wraps_with_fallback_metrics() {
    let mut r = renderer();
    assert_eq!(r.wrap_bubble_text("Hello"), vec!["Hello".to_owned()]);
    assert_eq!(r.wrap_bubble_text(""), vec![String::new()]);

    let cjk: String = std::iter::repeat_n('字', 25).collect();
    let lines = r.wrap_bubble_text(&cjk);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].chars().count(), 10);
    assert_eq!(lines.concat(), cjk);
}

#[test]
fn bezpath_conversion_keeps_elements() {
    let mut p = BezPath::new();
    p.move_to((0.0, 0.0));
    p.line_to((1.0, 0.0));
    p.quad_to((1.0, 1.0), (0.0, 1.0));
    p.curve_to((0.0, 2.0), (1.0, 2.0), (1.0, 3.0));
    p.close_path();
    let out = bezpath_to_cpu(&p);
    assert_eq!(out.elements().len(), p.elements().len());
}

#[test]
fn pixmap_conversion_rejects_bad_length() {
    assert!(image_premul_bytes_to_pixmap(&[0; 8], 1, 1).is_err());
    assert!(image_premul_bytes_to_pixmap(&[0; 4], 1, 1).is_ok());
}
