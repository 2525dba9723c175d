//! WAV clip loading and recording export
//!
//! Clips of any PCM layout are normalised to `f32` in `[-1.0, 1.0)`.
//! Recordings are exported as 32-bit float WAV, oldest frame first.

use super::recording::MultiChannelRecording;
use anyhow::{anyhow, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::{Path, PathBuf};

/// Decoded interleaved clip ready for [`load_audio_data`]
///
/// [`load_audio_data`]: crate::FullDuplexLoopback::load_audio_data
#[derive(Debug, Clone, PartialEq)]
pub struct ClipData {
    pub samples: Vec<f32>,
    pub channel_count: usize,
    pub sample_rate: u32,
}

impl ClipData {
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channel_count
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }
}

/// Read a WAV file into an interleaved `f32` clip
pub fn read_clip(path: &Path) -> Result<ClipData> {
    let reader =
        WavReader::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(anyhow!("{} declares zero channels", path.display()));
    }

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let channel_count = spec.channels as usize;
    if samples.len() < channel_count {
        return Err(anyhow!("{} contains no audio frames", path.display()));
    }

    tracing::info!(
        path = %path.display(),
        frames = samples.len() / channel_count,
        channels = channel_count,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "Read clip"
    );

    Ok(ClipData {
        samples,
        channel_count,
        sample_rate: spec.sample_rate,
    })
}

/// Write a recording as 32-bit float WAV and return the file size in bytes
pub fn write_recording(
    recording: &MultiChannelRecording,
    sample_rate: u32,
    path: &Path,
) -> Result<u64> {
    let channels = u16::try_from(recording.channel_count())
        .map_err(|_| anyhow!("{} channels do not fit a WAV header", recording.channel_count()))?;
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let (older, newer) = recording.as_slices();
    for &sample in older.iter().chain(newer) {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    let bytes = std::fs::metadata(path)?.len();
    tracing::info!(
        path = %path.display(),
        frames = recording.len_frames(),
        channels,
        bytes,
        "Exported recording"
    );
    Ok(bytes)
}

/// `<dir>/<prefix>_YYYYMMDD_HHMMSS.wav` for the current local time
pub fn export_path(dir: &Path, prefix: &str) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}.wav", prefix, timestamp))
}
