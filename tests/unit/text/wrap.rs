use super::*;

fn mono(w: f32) -> impl FnMut(&str) -> f32 {
    move |s: &str| width(s, w)
}

fn width(s: &str, per_char: f32) -> f32 {
    s.chars().count() as f32 * per_char
}

#[test]
fn short_text_stays_on_one_line() {
    assert_eq!(wrap_chars("Hello", 100.0, mono(10.0)), vec!["Hello"]);
}

#[test]
fn empty_text_yields_one_empty_line() {
    assert_eq!(wrap_chars("", 100.0, mono(10.0)), vec![String::new()]);
}

#[test]
fn lines_never_exceed_budget() {
    let text = "the quick brown fox jumps over the lazy dog 你好世界";
    let budget = 73.0;
    let lines = wrap_chars(text, budget, mono(10.0));
    assert!(lines.len() > 1);
    for l in &lines {
        assert!(width(l, 10.0) <= budget, "{l:?} too wide");
    }
    assert_eq!(lines.concat(), text);
}

#[test]
fn cjk_wraps_by_character() {
    let text = "你好世界测试换行效果文本较长";
    let lines = wrap_chars(text, 100.0, |s| {
        s.chars().map(|c| fallback_advance(c, 32.0)).sum()
    });
    // 32px per glyph, 100px budget -> 3 glyphs per line.
    assert_eq!(lines.len(), 5);
    assert!(lines.iter().take(4).all(|l| l.chars().count() == 3));
    assert_eq!(lines.concat(), text);
}

#[test]
fn overwide_char_sits_alone() {
    let lines = wrap_chars("ab", 5.0, mono(10.0));
    assert_eq!(lines, vec!["a", "b"]);
}

#[test]
fn block_is_vertically_centered() {
    let ys = block_line_centers(3, 150.0, 40.0);
    assert_eq!(ys, vec![110.0, 150.0, 190.0]);
    let ys = block_line_centers(2, 150.0, 40.0);
    assert_eq!(ys, vec![130.0, 170.0]);
    assert_eq!(block_line_centers(1, 150.0, 40.0), vec![150.0]);
}

#[test]
fn fallback_metrics_treat_cjk_as_full_width() {
    assert_eq!(fallback_advance('你', 20.0), 20.0);
    assert!((fallback_advance('a', 20.0) - 11.0).abs() < 1e-4);
    assert!((fallback_advance(' ', 20.0) - 6.0).abs() < 1e-4);
}

#[test]
fn engine_without_font_measures_with_fallback() {
    let mut engine = TextEngine::new(&FontBook::empty()).unwrap();
    assert!(!engine.has_font());
    assert_eq!(engine.measure("你好", 32.0), 64.0);
    assert_eq!(engine.measure("", 32.0), 0.0);
    assert!(engine.layout_line("x", 32.0, TextBrushRgba8::default()).is_none());
}

#[test]
fn bad_font_bytes_are_rejected() {
    let fonts = FontBook::from_bytes(b"definitely not a font".to_vec());
    assert!(TextEngine::new(&fonts).is_err());
}
