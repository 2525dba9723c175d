//! Duplexloop - full-duplex audio loopback tester
//!
//! This library re-exports the loopback engine, recordings, peak meters
//! and device/WAV helpers from `duplexloop-core`.

pub use duplexloop_core::audio;
pub use duplexloop_core::config;

pub use duplexloop_core::{
    CallbackResult, DuplexFormat, FullDuplexLoopback, LoopbackConfig, LoopbackError,
    LoopbackProcessor, MultiChannelRecording, Recordings, SessionEvent, StreamFormat,
};
pub use duplexloop_core::{MAX_RECORD_SECONDS, PEAK_LEVEL_NOT_STARTED, PEAK_LEVEL_OUT_OF_RANGE};
