//! Waveform rasterization
//!
//! The output mimics a 2D canvas drawing: fill the background, build one
//! polyline through every drawn bucket, then stroke it once with whatever
//! line width is current when the stroke happens.

use super::loudness::LoudnessProfile;
use super::options::RenderOptions;
use crate::error::{RenderError, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use tiny_skia::{Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Line width of a fresh canvas, used when no requested width is usable
const INITIAL_LINE_WIDTH: f32 = 1.0;

/// Miter limit of a fresh canvas
const CANVAS_MITER_LIMIT: f32 = 10.0;

/// PNG-encoded waveform image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformImage {
    width: u32,
    height: u32,
    png: Vec<u8>,
}

impl WaveformImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded PNG bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.png
    }
}

/// Points and widths of the stroke path, before rasterization
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePlan {
    points: Vec<(f32, f32)>,
    requested_widths: Vec<f32>,
    stroke_width: f32,
}

impl StrokePlan {
    pub fn new(profile: &LoudnessProfile, options: &RenderOptions) -> Self {
        let buckets = profile.buckets();
        let frames = (options.drawn_frames() as usize).min(buckets.len());

        let half_height = options.height as f64 / 2.0;
        let scale = 1.0 - profile.highest() + 1.0;
        let max_width = options.max_line_width as f64;

        let mut points = Vec::with_capacity(frames);
        let mut requested_widths: Vec<f32> = Vec::with_capacity(frames);

        for (i, &loudness) in buckets.iter().take(frames).enumerate() {
            let y = half_height - loudness * scale * half_height;
            points.push((i as f32, y as f32));

            // Width looks one bucket ahead; past the end it repeats the
            // previous point's width
            let width = match buckets.get(i + 1) {
                Some(&next) => (max_width - (next + 0.5) * (max_width / 2.0)) as f32,
                None => match requested_widths.last() {
                    Some(&previous) => previous,
                    None => (max_width - 0.5 * (max_width / 2.0)) as f32,
                },
            };
            requested_widths.push(width);
        }

        // A canvas ignores widths that are not finite and positive
        let stroke_width = requested_widths
            .iter()
            .rev()
            .copied()
            .find(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(INITIAL_LINE_WIDTH);

        Self {
            points,
            requested_widths,
            stroke_width,
        }
    }

    /// `(x, y)` of every drawn point, in drawing order
    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    /// Width requested at each point
    pub fn requested_widths(&self) -> &[f32] {
        &self.requested_widths
    }

    /// Width the path is stroked with
    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    fn path(&self) -> Option<tiny_skia::Path> {
        let mut builder = PathBuilder::new();
        let mut points = self.points.iter();
        let &(x, y) = points.next()?;
        builder.move_to(x, y);
        for &(x, y) in points {
            builder.line_to(x, y);
        }
        // A lone move-to yields no path, and nothing is drawn
        builder.finish()
    }
}

/// Renders sample sequences with a fixed set of options
#[derive(Debug, Clone, Default)]
pub struct WaveformRenderer {
    options: RenderOptions,
}

impl WaveformRenderer {
    pub fn new(options: RenderOptions) -> Self {
        if options.frames > options.width {
            log::warn!(
                "Requested {} frames but only {} buckets are computed; drawing {}",
                options.frames,
                options.width,
                options.width
            );
        }
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render `samples` to a PNG waveform image
    pub fn render(&self, samples: &[f32]) -> Result<WaveformImage> {
        let options = &self.options;
        if options.width == 0 || options.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: options.width,
                height: options.height,
            });
        }

        let profile = LoudnessProfile::compute(samples, options.width, options.metric)?;
        let plan = StrokePlan::new(&profile, options);

        log::debug!(
            "Rendering {}x{} waveform: {} samples, {} per bucket, {} points, stroke width {:.2}",
            options.width,
            options.height,
            samples.len(),
            profile.samples_per_frame(),
            plan.points().len(),
            plan.stroke_width()
        );

        let pixmap = rasterize(&plan, options)?;
        let png = encode_png(&pixmap)?;

        Ok(WaveformImage {
            width: options.width,
            height: options.height,
            png,
        })
    }
}

/// Render `samples` with `options`
pub fn render(samples: &[f32], options: &RenderOptions) -> Result<WaveformImage> {
    WaveformRenderer::new(options.clone()).render(samples)
}

fn rasterize(plan: &StrokePlan, options: &RenderOptions) -> Result<Pixmap> {
    let mut pixmap =
        Pixmap::new(options.width, options.height).ok_or(RenderError::InvalidDimensions {
            width: options.width,
            height: options.height,
        })?;

    pixmap.fill(options.background_color.to_skia());

    if let Some(path) = plan.path() {
        let mut paint = Paint::default();
        paint.set_color(options.line_color.to_skia());
        paint.anti_alias = true;

        let stroke = Stroke {
            width: plan.stroke_width(),
            miter_limit: CANVAS_MITER_LIMIT,
            ..Stroke::default()
        };

        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    Ok(pixmap)
}

/// Encode a premultiplied pixmap as straight-alpha RGBA PNG
fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let img = RgbaImage::from_raw(pixmap.width(), pixmap.height(), data).ok_or(
        RenderError::InvalidDimensions {
            width: pixmap.width(),
            height: pixmap.height(),
        },
    )?;

    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img).write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
