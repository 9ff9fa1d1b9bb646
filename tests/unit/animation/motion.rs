use super::*;

fn base() -> Rect {
    Rect::new(50.0, 230.0, 170.0, 350.0)
}

#[test]
fn none_is_identity_at_every_time() {
    for t in [0.0, 17.0, 999.0, 5000.0] {
        assert_eq!(AvatarMotion::sample(AnimationType::None, t), AvatarMotion::IDENTITY);
    }
    let a = AvatarMotion::sample(AnimationType::None, 0.0).bounds(base());
    let b = AvatarMotion::sample(AnimationType::None, 5000.0).bounds(base());
    assert_eq!(a, b);
    assert_eq!(a, base());
}

#[test]
fn bounce_never_moves_down() {
    let mut t = 0.0;
    while t < 10_000.0 {
        let m = AvatarMotion::sample(AnimationType::Bounce, t);
        assert!(m.offset_y <= 0.0, "offset_y={} at t={t}", m.offset_y);
        assert!(m.offset_y >= -10.0);
        t += 7.3;
    }
}

#[test]
fn breathe_scale_stays_within_five_percent() {
    for i in 0..400 {
        let m = AvatarMotion::sample(AnimationType::Breathe, f64::from(i) * 13.0);
        assert!((0.95..=1.05).contains(&m.scale));
        assert_eq!(m.rotation, 0.0);
    }
}

#[test]
fn wave_and_slide_match_closed_forms() {
    let m = AvatarMotion::sample(AnimationType::Wave, 500.0);
    assert!((m.rotation - 0.05 * 1.5f64.sin()).abs() < 1e-12);

    let m = AvatarMotion::sample(AnimationType::Slide, 250.0);
    assert!((m.slide_x - 20.0 * 0.5f64.sin()).abs() < 1e-12);
    assert_eq!(m.placed_box(base()).x0, base().x0 + m.slide_x);
}

#[test]
fn sampling_is_order_independent() {
    let forward: Vec<_> = (0..40)
        .map(|i| AvatarMotion::sample(AnimationType::Wave, f64::from(i) * 50.0))
        .collect();
    let backward: Vec<_> = (0..40)
        .rev()
        .map(|i| AvatarMotion::sample(AnimationType::Wave, f64::from(i) * 50.0))
        .collect();
    assert!(forward.iter().eq(backward.iter().rev()));
}

#[test]
fn transform_keeps_center_fixed() {
    let m = AvatarMotion {
        scale: 1.05,
        rotation: 0.05,
        offset_y: -4.0,
        slide_x: 3.0,
    };
    let placed = m.placed_box(base());
    let c = placed.center();
    let moved = m.transform_about(placed) * c;
    assert!((moved - c).hypot() < 1e-9);
}

#[test]
fn periods_match_angular_frequencies() {
    let p = |a| period_ms(a).unwrap();
    assert!((p(AnimationType::Breathe) - 2094.395).abs() < 0.01);
    assert!((p(AnimationType::Wave) - 2094.395).abs() < 0.01);
    assert!((p(AnimationType::Bounce) - 785.398).abs() < 0.01);
    // Slide takes ~3.14 s, longer than the 2 s export window.
    assert!(p(AnimationType::Slide) > 3000.0);
    assert!(period_ms(AnimationType::None).is_none());
}
