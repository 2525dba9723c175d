//! Audio processing module
//!
//! This module contains all audio-related functionality including:
//! - The full-duplex loopback callback and control plane ([`loopback`])
//! - Clip playback with looping and channel conversion ([`playback`])
//! - Bounded multi-channel history of both directions ([`recording`])
//! - Per-channel decaying peak meters ([`peak`])
//! - Pairing of separate input/output callbacks ([`duplex`])
//! - Device enumeration and stream setup ([`device`])
//! - WAV clip loading and recording export ([`wav`])

pub mod device;
pub mod duplex;
pub mod loopback;
pub mod peak;
pub mod playback;
pub mod recording;
pub mod wav;
