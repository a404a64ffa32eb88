//! Audio decoding for uploaded files
//!
//! Any container symphonia can probe is accepted. The waveform is drawn
//! from the first channel only; the other channels are kept so a non-WAV
//! upload can be re-encoded to WAV without losing them.

use crate::error::{RenderError, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// One channel of decoded samples
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSamples {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSamples {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_ms(&self) -> f64 {
        duration_ms(self.samples.len(), self.sample_rate)
    }
}

/// Every channel of a decoded file, interleaved
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    interleaved: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl DecodedAudio {
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.interleaved.len() / self.channels
    }

    pub fn duration_ms(&self) -> f64 {
        duration_ms(self.frames(), self.sample_rate)
    }

    /// Samples of channel 0
    pub fn first_channel(&self) -> AudioSamples {
        let samples = self
            .interleaved
            .iter()
            .step_by(self.channels)
            .copied()
            .collect();
        AudioSamples::new(samples, self.sample_rate)
    }

    /// Encode as a 32-bit float WAV file with all channels
    pub fn to_wav_bytes(&self) -> hound::Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels as u16,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buffer, spec)?;
            for &sample in &self.interleaved {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(buffer.into_inner())
    }
}

/// Check for a RIFF/WAVE header
pub fn is_wave_buffer(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Decode an in-memory audio file
///
/// `extension` is a probe hint such as `"mp3"`; the container is still
/// detected from its content when the hint is absent or wrong.
pub fn decode(bytes: &[u8], extension: Option<&str>) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| RenderError::Decode(format!("unrecognized audio format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| RenderError::Decode("no audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| RenderError::Decode("no sample rate in audio track".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| RenderError::Decode(format!("failed to create decoder: {}", e)))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut channels = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                log::warn!("Error reading packet: {:?}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Error decoding packet: {:?}", e);
                continue;
            }
        };

        let spec = *decoded.spec();
        channels = spec.channels.count();

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sample_buf.samples());
    }

    if channels == 0 || interleaved.is_empty() {
        return Err(RenderError::Decode("no audio frames decoded".to_string()));
    }

    log::debug!(
        "Decoded {} frame(s) x {} channel(s) at {}Hz",
        interleaved.len() / channels,
        channels,
        sample_rate
    );

    Ok(DecodedAudio {
        interleaved,
        channels,
        sample_rate,
    })
}

fn duration_ms(frames: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    frames as f64 / sample_rate as f64 * 1e3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(channels: u16, sample_rate: u32, frames: &[Vec<i16>]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buffer, spec).unwrap();
            for frame in frames {
                for &s in frame {
                    writer.write_sample(s).unwrap();
                }
            }
            writer.finalize().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_is_wave_buffer() {
        let wav = wav_bytes(1, 8000, &[vec![0]]);
        assert!(is_wave_buffer(&wav));
        assert!(!is_wave_buffer(b"ID3\x04\x00\x00\x00\x00\x00\x00\x00\x00"));
        assert!(!is_wave_buffer(b"RIFF"));
    }

    #[test]
    fn test_decode_keeps_first_channel() {
        let frames: Vec<Vec<i16>> = (0..800).map(|_| vec![i16::MAX / 2, i16::MIN / 2]).collect();
        let decoded = decode(&wav_bytes(2, 8000, &frames), Some("wav")).unwrap();

        assert_eq!(decoded.channels(), 2);
        assert_eq!(decoded.sample_rate(), 8000);
        assert_eq!(decoded.frames(), 800);
        assert!((decoded.duration_ms() - 100.0).abs() < 1e-9);

        let left = decoded.first_channel();
        assert_eq!(left.len(), 800);
        assert!(left.samples().iter().all(|&s| (s - 0.5).abs() < 0.01));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode(b"definitely not audio", None);
        assert!(matches!(result, Err(RenderError::Decode(_))));
    }

    #[test]
    fn test_decode_empty_wav_fails() {
        let result = decode(&wav_bytes(1, 8000, &[]), Some("wav"));
        assert!(matches!(result, Err(RenderError::Decode(_))));
    }

    #[test]
    fn test_reencode_roundtrip_preserves_layout() {
        let frames: Vec<Vec<i16>> = (0..100).map(|i| vec![i * 100, -i * 100]).collect();
        let decoded = decode(&wav_bytes(2, 22050, &frames), None).unwrap();

        let wav = decoded.to_wav_bytes().unwrap();
        assert!(is_wave_buffer(&wav));

        let again = decode(&wav, Some("wav")).unwrap();
        assert_eq!(again.channels(), 2);
        assert_eq!(again.sample_rate(), 22050);
        assert_eq!(again.frames(), 100);
    }
}
