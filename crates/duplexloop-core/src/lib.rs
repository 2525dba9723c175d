//! Duplexloop Core - full-duplex loopback engine, recordings and peak metering
//!
//! This library plays a pre-loaded clip through an output stream while
//! capturing the input stream, keeps bounded recordings of both directions
//! and tracks per-channel input peak levels. It is used to validate
//! round-trip audio paths such as Bluetooth hands-free links.

pub mod audio;
pub mod config;

pub use audio::loopback::{
    CallbackResult, ClipInfo, Direction, DuplexFormat, FullDuplexLoopback, LoopbackError,
    LoopbackProcessor, Recordings, SessionEvent, StreamFormat, PEAK_LEVEL_NOT_STARTED,
    PEAK_LEVEL_OUT_OF_RANGE,
};
pub use audio::duplex::{BridgeStats, InputFeeder, OutputDriver};
pub use audio::recording::MultiChannelRecording;
pub use config::LoopbackConfig;

/// Maximum history kept per recording direction (5 minutes)
pub const MAX_RECORD_SECONDS: u32 = 300;

/// Default per-sample decay factor of the input peak detectors
pub const DEFAULT_PEAK_DECAY: f32 = 0.99;
