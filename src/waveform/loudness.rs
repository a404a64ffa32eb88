//! Per-bucket loudness profile

use super::options::LoudnessMetric;
use crate::error::{RenderError, Result};

/// Loudness of each of `width` equal slices of a sample sequence
#[derive(Debug, Clone, PartialEq)]
pub struct LoudnessProfile {
    buckets: Vec<f64>,
    highest: f64,
    samples_per_frame: usize,
}

impl LoudnessProfile {
    /// Reduce `samples` to `width` buckets
    ///
    /// Trailing samples that do not fill a whole bucket are ignored.
    /// `highest` starts at zero, so it is never negative even when every
    /// bucket is.
    pub fn compute(samples: &[f32], width: u32, metric: LoudnessMetric) -> Result<Self> {
        if samples.is_empty() {
            return Err(RenderError::Decode("no samples".to_string()));
        }
        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(RenderError::Decode(format!(
                "non-finite sample at index {}",
                pos
            )));
        }

        let samples_per_frame = samples.len() / width.max(1) as usize;
        if width == 0 || samples_per_frame == 0 {
            return Err(RenderError::InsufficientSamples {
                samples: samples.len(),
                buckets: width,
            });
        }

        let mut buckets = Vec::with_capacity(width as usize);
        let mut highest = 0.0f64;

        for frame in samples
            .chunks_exact(samples_per_frame)
            .take(width as usize)
        {
            let loudness = match metric {
                LoudnessMetric::Mean => mean(frame),
                LoudnessMetric::Rms => rms(frame),
            };
            if loudness > highest {
                highest = loudness;
            }
            buckets.push(loudness);
        }

        log::trace!(
            "Loudness profile: {} buckets x {} samples, highest={:.4}",
            buckets.len(),
            samples_per_frame,
            highest
        );

        Ok(Self {
            buckets,
            highest,
            samples_per_frame,
        })
    }

    pub fn buckets(&self) -> &[f64] {
        &self.buckets
    }

    /// Running maximum of the bucket values (at least 0)
    pub fn highest(&self) -> f64 {
        self.highest
    }

    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[inline]
fn mean(frame: &[f32]) -> f64 {
    frame.iter().map(|&s| s as f64).sum::<f64>() / frame.len() as f64
}

#[inline]
fn rms(frame: &[f32]) -> f64 {
    let sum_sq: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / frame.len() as f64).sqrt()
}
