//! WAV playback into the capture track
//!
//! Stands in for a microphone: the file is converted to mono PCM16 at the
//! realtime sample rate and pushed frame by frame at real-time pace.

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use voice_coach_config::constants::audio::{FRAME_MS, SAMPLE_RATE};
use voice_coach_transport::CaptureTrack;

/// Samples per capture frame
const FRAME_SAMPLES: usize = (SAMPLE_RATE as u64 * FRAME_MS / 1000) as usize;

/// Load a WAV file as mono PCM16 at the realtime sample rate
pub fn load_pcm16(path: &Path) -> anyhow::Result<Vec<i16>> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .filter_map(Result::ok)
            .collect(),
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .filter_map(Result::ok)
                .map(|s| s as f32 / max_val)
                .collect()
        },
    };

    // Average interleaved channels down to mono
    let channels = usize::from(spec.channels.max(1));
    let mono: Vec<f32> = samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    let resampled = resample(&mono, spec.sample_rate, SAMPLE_RATE);

    tracing::debug!(
        path = %path.display(),
        source_rate = spec.sample_rate,
        channels = spec.channels,
        samples = resampled.len(),
        "Loaded audio file"
    );

    Ok(resampled
        .into_iter()
        .map(|s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)
        .collect())
}

/// Linear interpolation resampler
fn resample(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || from == 0 || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = f64::from(from) / f64::from(to);
    let len = (samples.len() as f64 / ratio).floor() as usize;
    (0..len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx];
            let b = samples.get(idx + 1).copied().unwrap_or(a);
            a + (b - a) * frac
        })
        .collect()
}

/// Push samples into the track one frame per tick; returns frames accepted
///
/// Frames pushed while the track is muted (assistant speaking) are dropped.
pub async fn stream_into(track: Arc<CaptureTrack>, samples: Vec<i16>) -> usize {
    let mut ticker = tokio::time::interval(Duration::from_millis(FRAME_MS));
    let mut accepted = 0;

    for frame in samples.chunks(FRAME_SAMPLES) {
        ticker.tick().await;
        if track.push_frame(frame.to_vec()) {
            accepted += 1;
        }
    }

    accepted
}
