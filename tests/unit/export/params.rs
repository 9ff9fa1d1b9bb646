use super::*;

#[test]
fn default_params_sample_forty_frames_at_fifty_ms() {
    let p = ExportParams::default();
    p.validate().unwrap();
    assert_eq!(p.frame_count(), 40);
    assert_eq!(p.frame_interval_ms(), 50);
    assert_eq!(p.frame_time_ms(0), 0.0);
    assert_eq!(p.frame_time_ms(1), 50.0);
    assert_eq!(p.frame_time_ms(39), 1950.0);
    let cfg = p.sink_config();
    assert_eq!((cfg.width, cfg.height), (600, 400));
}

#[test]
fn partial_intervals_round_up_the_frame_count() {
    let p = ExportParams {
        duration_ms: 1000,
        sample_rate_hz: 30,
        ..ExportParams::default()
    };
    assert_eq!(p.frame_count(), 30);
    assert_eq!(p.frame_interval_ms(), 33);

    let p = ExportParams {
        duration_ms: 75,
        sample_rate_hz: 20,
        ..ExportParams::default()
    };
    assert_eq!(p.frame_count(), 2);
}

#[test]
fn invalid_params_are_rejected() {
    let zero_rate = ExportParams {
        sample_rate_hz: 0,
        ..ExportParams::default()
    };
    assert!(matches!(zero_rate.validate(), Err(MemeError::Validation(_))));

    let zero_duration = ExportParams {
        duration_ms: 0,
        ..ExportParams::default()
    };
    assert!(zero_duration.validate().is_err());

    let mut huge = ExportParams::default();
    huge.layout.canvas.width = 70_000;
    assert!(huge.validate().is_err());

    let bad_speed = ExportParams {
        speed: 0,
        ..ExportParams::default()
    };
    assert!(bad_speed.validate().is_err());

    let zero_threads = ExportParams {
        threading: ExportThreading {
            parallel: true,
            threads: Some(0),
        },
        ..ExportParams::default()
    };
    assert!(zero_threads.validate().is_err());
}

#[test]
fn filename_keeps_ascii_and_cjk_only() {
    assert_eq!(suggested_filename("Hello World", 1_700_000_012_345), "Hello_Worl_2345.gif");
    assert_eq!(suggested_filename("", 42), "meme_0042.gif");
    assert_eq!(suggested_filename("你好, 世界!", 9_999), "你好__世界__9999.gif");
    assert_eq!(suggested_filename("ｆｕｌｌ", 10_000), "_____0000.gif");
    assert_eq!(
        suggested_filename("abcdefghijklmnop", 1234),
        "abcdefghij_1234.gif"
    );
}

#[test]
fn sequential_render_feeds_sink_in_order() {
    let params = ExportParams {
        duration_ms: 200,
        sample_rate_hz: 20,
        ..ExportParams::default()
    };
    let mut sink = InMemorySink::new();
    render_frames_to_sink(
        &RenderConfig::default(),
        None,
        &FontBook::empty(),
        &params,
        &mut sink,
    )
    .unwrap();

    assert!(sink.is_finished());
    assert_eq!(sink.config().map(|c| c.frame_count), Some(4));
    let idx: Vec<u32> = sink.frames().iter().map(|(i, _)| *i).collect();
    assert_eq!(idx, vec![0, 1, 2, 3]);
    // Breathe moves between samples.
    assert_ne!(sink.frames()[0].1.digest(), sink.frames()[1].1.digest());
}

#[test]
fn parallel_and_sequential_exports_match() {
    let base = ExportParams {
        duration_ms: 300,
        speed: MAX_SPEED,
        ..ExportParams::default()
    };
    let sequential = ExportParams {
        threading: ExportThreading {
            parallel: false,
            threads: None,
        },
        ..base.clone()
    };
    let parallel = ExportParams {
        threading: ExportThreading {
            parallel: true,
            threads: Some(3),
        },
        ..base
    };
    let cfg = RenderConfig::default();
    let fonts = FontBook::empty();
    let a = export_animation_at(&cfg, None, &fonts, &sequential, 1).unwrap();
    let b = export_animation_at(&cfg, None, &fonts, &parallel, 1).unwrap();
    assert_eq!(a.frame_count, 6);
    assert_eq!(a, b);
    assert_eq!(a.frame_delay_ms, 50);
    assert_eq!(a.suggested_filename, "Hello_Worl_0001.gif");
}

#[test]
fn unloadable_font_fails_in_both_threading_modes() {
    let fonts = FontBook::from_bytes(b"not a font".to_vec());
    let cfg = RenderConfig::default();
    for parallel in [false, true] {
        let params = ExportParams {
            duration_ms: 200,
            threading: ExportThreading {
                parallel,
                threads: Some(2),
            },
            ..ExportParams::default()
        };
        assert!(export_animation_at(&cfg, None, &fonts, &params, 1).is_err());
    }
}

#[test]
fn artifact_saves_under_suggested_name() {
    let dir = std::env::temp_dir().join(format!("memegif-save-{}", std::process::id()));
    let artifact = GifArtifact {
        bytes: b"GIF89a".to_vec(),
        width: 1,
        height: 1,
        frame_count: 1,
        frame_delay_ms: 50,
        suggested_filename: "meme_0001.gif".to_owned(),
    };
    let path = artifact.save_in(&dir).unwrap();
    assert_eq!(path, dir.join("meme_0001.gif"));
    assert_eq!(std::fs::read(&path).unwrap(), b"GIF89a");
    let _ = std::fs::remove_dir_all(&dir);
}
