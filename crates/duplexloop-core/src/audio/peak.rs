//! Decaying peak meters for captured audio
//!
//! One [`PeakDetector`] per input channel. The audio thread feeds samples,
//! the control thread reads levels; levels live in atomics so neither side
//! ever waits on the other.

use atomic_float::AtomicF32;
use std::sync::atomic::Ordering;

/// Peak follower with instant attack and multiplicative release
///
/// # Example
/// ```
/// use duplexloop_core::audio::peak::PeakDetector;
///
/// let detector = PeakDetector::new(0.5);
/// detector.process(0.8);
/// assert_eq!(detector.level(), 0.8);
///
/// detector.process(0.0);
/// assert_eq!(detector.level(), 0.4);
/// ```
#[derive(Debug)]
pub struct PeakDetector {
    level: AtomicF32,
    decay: f32,
}

impl PeakDetector {
    /// Create a detector; `decay` is clamped to `0.0..=1.0`
    pub fn new(decay: f32) -> Self {
        let decay = if decay.is_finite() {
            decay.clamp(0.0, 1.0)
        } else {
            crate::DEFAULT_PEAK_DECAY
        };
        Self {
            level: AtomicF32::new(0.0),
            decay,
        }
    }

    /// Feed one sample and return the updated level
    ///
    /// Single writer only: the load/store pair is not a read-modify-write.
    #[inline]
    pub fn process(&self, sample: f32) -> f32 {
        let decayed = self.level.load(Ordering::Relaxed) * self.decay;
        let magnitude = sample.abs();
        // NaN compares false and leaves the decayed level in place
        let level = if magnitude > decayed { magnitude } else { decayed };
        self.level.store(level, Ordering::Relaxed);
        level
    }

    /// Current peak estimate
    #[inline]
    pub fn level(&self) -> f32 {
        self.level.load(Ordering::Relaxed)
    }

    /// Per-sample decay factor
    pub fn decay(&self) -> f32 {
        self.decay
    }
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self::new(crate::DEFAULT_PEAK_DECAY)
    }
}

/// Fixed set of detectors, one per input channel
#[derive(Debug)]
pub struct PeakDetectorBank {
    detectors: Box<[PeakDetector]>,
}

impl PeakDetectorBank {
    pub fn new(channel_count: usize, decay: f32) -> Self {
        Self {
            detectors: (0..channel_count).map(|_| PeakDetector::new(decay)).collect(),
        }
    }

    /// Feed one interleaved frame; extra samples beyond the bank size are ignored
    #[inline]
    pub fn process_frame(&self, frame: &[f32]) {
        for (detector, &sample) in self.detectors.iter().zip(frame) {
            detector.process(sample);
        }
    }

    /// Level of `channel`, or `None` when out of range
    pub fn level(&self, channel: usize) -> Option<f32> {
        self.detectors.get(channel).map(PeakDetector::level)
    }

    /// Snapshot of every channel level
    pub fn levels(&self) -> Vec<f32> {
        self.detectors.iter().map(PeakDetector::level).collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}
