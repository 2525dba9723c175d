//! Audio device enumeration and duplex session setup
//!
//! Opens an input and an output device through cpal, negotiates `f32`
//! streams at each device's default configuration, starts the loopback
//! engine with the negotiated format and wires the duplex bridge into the
//! two stream callbacks. Stopping the session drops the streams and takes
//! the audio half back, together with its recordings.

use crate::audio::duplex::{self, BridgeStats, OutputDriver};
use crate::audio::loopback::{
    CallbackResult, DuplexFormat, FullDuplexLoopback, Recordings, StreamFormat,
};
use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleFormat, Stream, SupportedStreamConfig};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// How long [`LoopbackSession::stop`] waits for the output callback to be released
const HANDBACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Errors that can occur while opening devices
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("No default input device")]
    NoInputDevice,

    #[error("No default output device")]
    NoOutputDevice,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to query {direction} config: {reason}")]
    ConfigUnavailable {
        direction: &'static str,
        reason: String,
    },

    #[error("Output stream did not release the loopback processor")]
    ProcessorNotReturned,
}

/// Audio device information
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Device name
    pub name: String,
    /// Whether this is the default input device
    pub is_default_input: bool,
    /// Whether this is the default output device
    pub is_default_output: bool,
    /// Default number of input channels (0 if capture is unsupported)
    pub input_channels: u16,
    /// Default number of output channels (0 if playback is unsupported)
    pub output_channels: u16,
    /// Common sample rates supported for output
    pub sample_rates: Vec<u32>,
}

/// List devices of the default host
pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    let host = cpal::default_host();
    let default_input = host.default_input_device().and_then(|d| d.name().ok());
    let default_output = host.default_output_device().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    for device in host.devices()? {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let input_channels = device
            .default_input_config()
            .map(|c| c.channels())
            .unwrap_or(0);
        let output_channels = device
            .default_output_config()
            .map(|c| c.channels())
            .unwrap_or(0);

        let common_rates = [8000, 16000, 44100, 48000, 96000];
        let mut sample_rates = Vec::new();
        if let Ok(configs) = device.supported_output_configs() {
            for config in configs {
                for &rate in &common_rates {
                    if (config.min_sample_rate().0..=config.max_sample_rate().0).contains(&rate)
                        && !sample_rates.contains(&rate)
                    {
                        sample_rates.push(rate);
                    }
                }
            }
        }
        sample_rates.sort();

        devices.push(DeviceInfo {
            is_default_input: default_input.as_deref() == Some(name.as_str()),
            is_default_output: default_output.as_deref() == Some(name.as_str()),
            name,
            input_channels,
            output_channels,
            sample_rates,
        });
    }

    Ok(devices)
}

fn find_device(host: &Host, name: Option<&str>, input: bool) -> Result<Device> {
    let device = match name {
        Some(name) => host
            .devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| DeviceError::DeviceNotFound(name.to_string()))?,
        None if input => host
            .default_input_device()
            .ok_or(DeviceError::NoInputDevice)?,
        None => host
            .default_output_device()
            .ok_or(DeviceError::NoOutputDevice)?,
    };
    Ok(device)
}

fn stream_format(config: &SupportedStreamConfig, direction: &str) -> StreamFormat {
    if config.sample_format() != SampleFormat::F32 {
        tracing::warn!(
            direction,
            format = ?config.sample_format(),
            "Device default is not f32, requesting f32 anyway"
        );
    }
    StreamFormat::new(config.sample_rate().0, config.channels())
}

/// Output driver owned by the output stream callback
///
/// cpal drops the callback together with the stream; the driver is then
/// sent back to the session instead of being lost.
struct DriverSlot {
    driver: Option<OutputDriver>,
    handback: Sender<OutputDriver>,
}

impl DriverSlot {
    fn process(&mut self, data: &mut [f32]) -> CallbackResult {
        match self.driver.as_mut() {
            Some(driver) => driver.process(data),
            None => CallbackResult::Stop,
        }
    }
}

impl Drop for DriverSlot {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            let _ = self.handback.try_send(driver);
        }
    }
}

/// Running duplex session; dropping it stops both streams
pub struct LoopbackSession {
    input_stream: Stream,
    output_stream: Stream,
    handback: Receiver<OutputDriver>,
    running: Arc<AtomicBool>,
    stats: Arc<BridgeStats>,
    format: DuplexFormat,
    input_name: String,
    output_name: String,
}

impl LoopbackSession {
    /// Negotiated stream format
    pub fn format(&self) -> DuplexFormat {
        self.format
    }

    /// Bridge underrun/overflow counters
    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Stop both streams and return the recordings of the session
    pub fn stop(self) -> Result<Recordings> {
        let LoopbackSession {
            input_stream,
            output_stream,
            handback,
            running,
            stats,
            ..
        } = self;

        running.store(false, Ordering::Relaxed);
        drop(output_stream);
        drop(input_stream);

        let driver = handback
            .recv_timeout(HANDBACK_TIMEOUT)
            .map_err(|_| DeviceError::ProcessorNotReturned)?;
        let recordings = driver.into_processor().into_recordings();

        tracing::info!(
            callbacks = stats.callbacks(),
            underrun_frames = stats.input_underrun_frames(),
            dropped_frames = stats.dropped_input_frames(),
            played_frames = recordings.played.frames_written(),
            recorded_frames = recordings.recorded.frames_written(),
            "Loopback session stopped"
        );
        Ok(recordings)
    }
}

/// Open devices, start `engine` and begin streaming
///
/// `None` selects the host's default device for that direction.
pub fn start_session(
    engine: &mut FullDuplexLoopback,
    input_device: Option<&str>,
    output_device: Option<&str>,
) -> Result<LoopbackSession> {
    let host = cpal::default_host();
    let input = find_device(&host, input_device, true)?;
    let output = find_device(&host, output_device, false)?;
    let input_name = input.name().unwrap_or_else(|_| "Unknown".to_string());
    let output_name = output.name().unwrap_or_else(|_| "Unknown".to_string());

    let input_config =
        input
            .default_input_config()
            .map_err(|e| DeviceError::ConfigUnavailable {
                direction: "input",
                reason: e.to_string(),
            })?;
    let output_config =
        output
            .default_output_config()
            .map_err(|e| DeviceError::ConfigUnavailable {
                direction: "output",
                reason: e.to_string(),
            })?;

    let format = DuplexFormat {
        output: stream_format(&output_config, "output"),
        input: stream_format(&input_config, "input"),
    };
    if format.output.sample_rate != format.input.sample_rate {
        tracing::warn!(
            output_rate = format.output.sample_rate,
            input_rate = format.input.sample_rate,
            "Input and output rates differ; frames are paired without resampling"
        );
    }
    if let Some(clip) = engine.clip_info() {
        if clip.sample_rate != format.output.sample_rate {
            tracing::warn!(
                clip_rate = clip.sample_rate,
                output_rate = format.output.sample_rate,
                "Clip rate differs from output rate; playback speed will be off"
            );
        }
    }

    let processor = engine.start(format)?;
    let (mut feeder, driver, stats) =
        duplex::bridge(processor, engine.config().bridge_capacity_frames);
    let running = Arc::new(AtomicBool::new(true));
    let (handback_tx, handback) = crossbeam_channel::bounded(1);
    let mut slot = DriverSlot {
        driver: Some(driver),
        handback: handback_tx,
    };

    let input_running = Arc::clone(&running);
    let input_stream = input.build_input_stream(
        &input_config.config(),
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if input_running.load(Ordering::Relaxed) {
                feeder.push(data);
            }
        },
        move |err| {
            tracing::error!("Input stream error: {}", err);
        },
        None,
    )?;

    let output_running = Arc::clone(&running);
    let output_stream = output.build_output_stream(
        &output_config.config(),
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            if !output_running.load(Ordering::Relaxed)
                || slot.process(data) == CallbackResult::Stop
            {
                data.fill(0.0);
            }
        },
        move |err| {
            tracing::error!("Output stream error: {}", err);
        },
        None,
    )?;

    input_stream.play()?;
    output_stream.play()?;

    tracing::info!(
        input = %input_name,
        output = %output_name,
        output_rate = format.output.sample_rate,
        output_channels = format.output.channel_count,
        input_rate = format.input.sample_rate,
        input_channels = format.input.channel_count,
        "Duplex streams running"
    );

    Ok(LoopbackSession {
        input_stream,
        output_stream,
        handback,
        running,
        stats,
        format,
        input_name,
        output_name,
    })
}
