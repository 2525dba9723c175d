//! Pairing of separate input and output callbacks
//!
//! Most hosts deliver capture and playback in two independent callbacks.
//! The input side pushes whole frames into a lock-free SPSC ring; the output
//! side pops up to one period of input and hands both blocks to
//! [`LoopbackProcessor::on_both_streams_ready`]. Neither side allocates or
//! blocks after construction.

use super::loopback::{CallbackResult, LoopbackProcessor};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Bridge health counters, readable from any thread
#[derive(Debug, Default)]
pub struct BridgeStats {
    /// Input frames discarded because the ring was full
    dropped_input_frames: AtomicU64,
    /// Output frames that had no matching input frame
    input_underrun_frames: AtomicU64,
    /// Output callbacks processed
    callbacks: AtomicU64,
}

impl BridgeStats {
    pub fn dropped_input_frames(&self) -> u64 {
        self.dropped_input_frames.load(Ordering::Relaxed)
    }

    pub fn input_underrun_frames(&self) -> u64 {
        self.input_underrun_frames.load(Ordering::Relaxed)
    }

    pub fn callbacks(&self) -> u64 {
        self.callbacks.load(Ordering::Relaxed)
    }
}

/// Input half of the bridge, moved into the input stream callback
pub struct InputFeeder {
    producer: ringbuf::HeapProd<f32>,
    channels: usize,
    stats: Arc<BridgeStats>,
}

impl InputFeeder {
    /// Queue captured interleaved samples; whole frames only
    pub fn push(&mut self, data: &[f32]) {
        let frames = data.len() / self.channels;
        let room = self.producer.vacant_len() / self.channels;
        let accepted = frames.min(room);

        let pushed = self.producer.push_slice(&data[..accepted * self.channels]);
        debug_assert_eq!(pushed, accepted * self.channels);

        if accepted < frames {
            self.stats
                .dropped_input_frames
                .fetch_add((frames - accepted) as u64, Ordering::Relaxed);
        }
    }

    /// Frames currently waiting for the output side
    pub fn queued_frames(&self) -> usize {
        self.producer.occupied_len() / self.channels
    }
}

/// Output half of the bridge, moved into the output stream callback
pub struct OutputDriver {
    consumer: ringbuf::HeapCons<f32>,
    processor: LoopbackProcessor,
    scratch: Box<[f32]>,
    input_channels: usize,
    output_channels: usize,
    stats: Arc<BridgeStats>,
}

impl OutputDriver {
    /// Fill one output period and process the matching input
    pub fn process(&mut self, output: &mut [f32]) -> CallbackResult {
        let output_frames = output.len() / self.output_channels;
        let available = self.consumer.occupied_len() / self.input_channels;
        let take = output_frames
            .min(available)
            .min(self.scratch.len() / self.input_channels);

        let read = self
            .consumer
            .pop_slice(&mut self.scratch[..take * self.input_channels]);

        if take < output_frames {
            self.stats
                .input_underrun_frames
                .fetch_add((output_frames - take) as u64, Ordering::Relaxed);
        }
        self.stats.callbacks.fetch_add(1, Ordering::Relaxed);

        self.processor
            .on_both_streams_ready(&self.scratch[..read], output)
    }

    /// Give back the audio half, e.g. to collect its recordings
    pub fn into_processor(self) -> LoopbackProcessor {
        self.processor
    }
}

/// Split a processor into input and output callback halves
///
/// `capacity_frames` bounds both the queued input and the input consumed
/// per output period.
pub fn bridge(
    processor: LoopbackProcessor,
    capacity_frames: usize,
) -> (InputFeeder, OutputDriver, Arc<BridgeStats>) {
    let input_channels = processor.input_channels();
    let output_channels = processor.output_channels();
    let capacity_samples = capacity_frames.max(1) * input_channels;

    let ring = HeapRb::<f32>::new(capacity_samples);
    let (producer, consumer) = ring.split();
    let stats = Arc::new(BridgeStats::default());

    let feeder = InputFeeder {
        producer,
        channels: input_channels,
        stats: Arc::clone(&stats),
    };
    let driver = OutputDriver {
        consumer,
        processor,
        scratch: vec![0.0; capacity_samples].into_boxed_slice(),
        input_channels,
        output_channels,
        stats: Arc::clone(&stats),
    };

    (feeder, driver, stats)
}
