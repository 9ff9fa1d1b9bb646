use std::io::Cursor;

use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: px.repeat((w * h) as usize),
        premultiplied: true,
    }
}

fn cfg(w: u32, h: u32, frames: u32) -> SinkConfig {
    SinkConfig {
        width: w,
        height: h,
        frame_count: frames,
        frame_interval_ms: 50,
    }
}

#[test]
fn delay_is_rounded_to_centiseconds() {
    assert_eq!(delay_cs(50), 5);
    assert_eq!(delay_cs(33), 3);
    assert_eq!(delay_cs(35), 4);
    assert_eq!(delay_cs(0), 1);
    assert_eq!(delay_cs(u32::MAX - 10), u16::MAX);
}

#[test]
fn speed_outside_range_is_rejected() {
    assert!(GifSink::new(0).is_err());
    assert!(GifSink::new(31).is_err());
    assert!(GifSink::new(1).is_ok());
    assert!(GifSink::new(MAX_SPEED).is_ok());
}

#[test]
fn sink_writes_looping_gif_with_delay() {
    let mut sink = GifSink::new(MAX_SPEED).unwrap();
    sink.begin(cfg(4, 3, 3)).unwrap();
    assert_eq!(sink.delay(), 5);
    for (i, px) in [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]]
        .into_iter()
        .enumerate()
    {
        sink.push_frame(i as u32, &solid(4, 3, px)).unwrap();
    }
    sink.end().unwrap();
    assert_eq!(sink.frames_written(), 3);
    let bytes = sink.into_bytes().unwrap();
    assert_eq!(&bytes[..6], b"GIF89a");

    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::RGBA);
    let mut dec = opts.read_info(Cursor::new(bytes)).unwrap();
    assert_eq!((dec.width(), dec.height()), (4, 3));
    let mut delays = Vec::new();
    let mut first_px = Vec::new();
    while let Some(frame) = dec.read_next_frame().unwrap() {
        delays.push(frame.delay);
        first_px.push([frame.buffer[0], frame.buffer[1], frame.buffer[2]]);
    }
    assert_eq!(delays, vec![5, 5, 5]);
    assert_eq!(first_px, vec![[255, 0, 0], [0, 255, 0], [0, 0, 255]]);
    assert_eq!(dec.repeat(), gif::Repeat::Infinite);
}

#[test]
fn mismatched_frame_size_is_an_encode_error() {
    let mut sink = GifSink::new(MAX_SPEED).unwrap();
    sink.begin(cfg(4, 3, 1)).unwrap();
    let err = sink.push_frame(0, &solid(3, 3, [0, 0, 0, 255])).unwrap_err();
    assert!(matches!(err, MemeError::Encode(_)));
}

#[test]
fn sink_must_begin_and_end() {
    let mut sink = GifSink::new(DEFAULT_SPEED).unwrap();
    assert!(sink.push_frame(0, &solid(1, 1, [0, 0, 0, 255])).is_err());
    assert!(sink.end().is_err());

    let mut sink = GifSink::new(DEFAULT_SPEED).unwrap();
    sink.begin(cfg(1, 1, 0)).unwrap();
    assert!(GifSink::new(DEFAULT_SPEED).unwrap().into_bytes().is_err());
    assert!(sink.begin(cfg(70_000, 1, 0)).is_err());
}

#[test]
fn quantize_rejects_bad_buffers() {
    let mut f = solid(2, 2, [0, 0, 0, 255]);
    f.data.pop();
    assert!(quantize_frame(&f, 10, 5).is_err());
    assert!(quantize_frame(&solid(2, 2, [0, 0, 0, 255]), 0, 5).is_err());
}
