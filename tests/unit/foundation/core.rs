use super::*;

#[test]
fn meme_canvas_is_600_by_400() {
    assert_eq!(Canvas::MEME.to_u16().unwrap(), (600, 400));
    assert_eq!(Canvas::MEME.rgba_len(), 600 * 400 * 4);
}

#[test]
fn canvas_rejects_oversized_and_empty() {
    assert!(
        Canvas {
            width: 70_000,
            height: 1
        }
        .to_u16()
        .is_err()
    );
    assert!(
        Canvas {
            width: 0,
            height: 10
        }
        .to_u16()
        .is_err()
    );
}

#[test]
fn premul_roundtrip_is_close_for_half_alpha() {
    let mut px = [200u8, 100, 50, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, [100, 50, 25, 128]);
    unpremultiply_rgba8_in_place(&mut px);
    assert!((i32::from(px[0]) - 200).abs() <= 2);
    assert!((i32::from(px[1]) - 100).abs() <= 2);
    assert!((i32::from(px[2]) - 50).abs() <= 2);
    assert_eq!(px[3], 128);
}

#[test]
fn transparent_pixels_zero_their_color() {
    let mut px = [10u8, 20, 30, 0];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, [0, 0, 0, 0]);
    assert_eq!(premul(255, 0), 0);
    assert_eq!(premul(255, 128), 128);
}
