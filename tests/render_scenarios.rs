use waveform_render::waveform::{HexColor, LoudnessMetric, LoudnessProfile, StrokePlan};
use waveform_render::{render, RenderError, RenderOptions, WaveformRenderer};

/// Options from the upload pipeline, scaled down
fn small_options() -> RenderOptions {
    RenderOptions::default()
        .with_size(100, 200)
        .with_max_line_width(10.0)
        .with_colors("#00000000".parse().unwrap(), "#000000".parse().unwrap())
}

/// Deterministic pseudo-audio in [-1, 1]
fn tone(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / 8000.0;
            0.6 * (t * 440.0 * std::f32::consts::TAU).sin() + 0.2 * (t * 3.0).sin()
        })
        .collect()
}

fn pixel(png: &[u8], x: u32, y: u32) -> [u8; 4] {
    let img = image::load_from_memory(png).unwrap().to_rgba8();
    img.get_pixel(x, y).0
}

#[test]
fn test_render_is_deterministic() {
    let samples = tone(40_000);
    let options = small_options();

    let first = render(&samples, &options).unwrap();
    let second = render(&samples, &options).unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());

    let renderer = WaveformRenderer::new(options);
    assert_eq!(renderer.render(&samples).unwrap(), first);
}

#[test]
fn test_dimensions_independent_of_sample_count() {
    let options = RenderOptions::default().with_size(120, 40);
    for len in [120, 121, 1_000, 48_000] {
        let image = render(&tone(len), &options).unwrap();
        let decoded = image::load_from_memory(image.as_bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 40), "len={}", len);
    }
}

#[test]
fn test_silence_draws_midline() {
    let options = small_options();
    let image = render(&vec![0.0; 16_000], &options).unwrap();
    let png = image.as_bytes();

    assert_eq!((image.width(), image.height()), (100, 200));

    // Line centered on y=100, 7.5px thick: rows 97..=102 fully covered
    for x in [1, 25, 50, 75, 98] {
        for y in 97..=102 {
            let [r, g, b, a] = pixel(png, x, y);
            assert_eq!((r, g, b), (0, 0, 0), "at ({}, {})", x, y);
            assert!(a >= 250, "alpha {} at ({}, {})", a, x, y);
        }
    }

    // Background stays transparent away from the line
    for (x, y) in [(50, 0), (50, 90), (50, 95), (50, 105), (10, 199)] {
        assert_eq!(pixel(png, x, y)[3], 0, "at ({}, {})", x, y);
    }
}

#[test]
fn test_silence_plan_matches_formula() {
    let options = small_options();
    let samples = vec![0.0; 16_000];
    let profile = LoudnessProfile::compute(&samples, options.width, LoudnessMetric::Mean).unwrap();
    let plan = StrokePlan::new(&profile, &options);

    assert_eq!(profile.samples_per_frame(), 160);
    assert_eq!(plan.points().len(), 100);
    assert!(plan.points().iter().all(|&(_, y)| y == 100.0));
    assert_eq!(plan.points()[99].0, 99.0);
    assert_eq!(plan.stroke_width(), 7.5);
}

#[test]
fn test_background_color_fills_canvas() {
    let options = small_options().with_colors(HexColor::rgba(255, 0, 0, 255), HexColor::BLACK);
    let image = render(&vec![0.0; 1_000], &options).unwrap();
    assert_eq!(pixel(image.as_bytes(), 50, 20), [255, 0, 0, 255]);
}

#[test]
fn test_fewer_frames_leaves_tail_blank() {
    let options = small_options().with_frames(50);
    let image = render(&vec![0.0; 1_000], &options).unwrap();
    let png = image.as_bytes();

    assert!(pixel(png, 20, 100)[3] >= 250);
    assert_eq!(pixel(png, 70, 100)[3], 0);
}

#[test]
fn test_frames_beyond_width_are_clamped() {
    let options = small_options().with_frames(500);
    let image = render(&tone(1_000), &options).unwrap();
    assert_eq!(image.width(), 100);
}

#[test]
fn test_exact_bucket_count_renders() {
    // One sample per bucket: the last point's lookahead runs off the end
    let options = small_options();
    let samples = tone(100);
    let image = render(&samples, &options).unwrap();
    assert_eq!((image.width(), image.height()), (100, 200));

    let profile = LoudnessProfile::compute(&samples, 100, LoudnessMetric::Mean).unwrap();
    let plan = StrokePlan::new(&profile, &options);
    let widths = plan.requested_widths();
    assert_eq!(widths.len(), 100);
    assert_eq!(widths[99], widths[98]);
}

#[test]
fn test_fewer_samples_than_width() {
    let result = render(&tone(99), &small_options());
    assert!(matches!(
        result,
        Err(RenderError::InsufficientSamples {
            samples: 99,
            buckets: 100
        })
    ));
}

#[test]
fn test_empty_samples() {
    let result = render(&[], &small_options());
    assert!(matches!(result, Err(RenderError::Decode(_))));
}
