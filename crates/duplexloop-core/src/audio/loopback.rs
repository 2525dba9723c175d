//! Full-duplex loopback engine
//!
//! Plays a loaded clip out of the output stream while capturing the input
//! stream, recording both directions and metering the captured channels.
//!
//! The engine is split in two halves:
//! - [`FullDuplexLoopback`] is the control half. It loads clips, toggles
//!   looping, starts sessions and answers queries. It may block and allocate.
//! - [`LoopbackProcessor`] is the audio half returned by
//!   [`FullDuplexLoopback::start`]. It is moved into the audio callback and
//!   runs [`LoopbackProcessor::on_both_streams_ready`] once per period without
//!   allocating, logging or blocking.
//!
//! Both halves share counters and the current clip through atomics. A new
//! clip is published as an immutable snapshot, so the audio half never
//! observes a partially replaced buffer. Clips the audio half lets go of are
//! sent back to the control half and freed there.
//!
//! The recordings belong to the audio half. They are read through the
//! processor once it is no longer driven, or taken with
//! [`LoopbackProcessor::into_recordings`] when the session ends.

use super::peak::PeakDetectorBank;
use super::playback::{PlaybackClip, PlaybackCursor};
use super::recording::MultiChannelRecording;
use crate::config::LoopbackConfig;
use arc_swap::ArcSwapOption;
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Returned by [`FullDuplexLoopback::peak_level`] before [`FullDuplexLoopback::start`]
pub const PEAK_LEVEL_NOT_STARTED: f64 = -1.0;

/// Returned by [`FullDuplexLoopback::peak_level`] for an invalid channel index
pub const PEAK_LEVEL_OUT_OF_RANGE: f64 = -2.0;

/// Replaced clips waiting to be freed; loads drain it, so one slot is
/// normally enough
const RETIRED_CLIP_CAPACITY: usize = 8;

/// Errors that can occur during loopback control operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoopbackError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid stream format: {0}")]
    InvalidStreamFormat(String),

    #[error("{0}() called before start()")]
    NotStarted(&'static str),

    #[error("Channel index out of range: 0 <= {index} < {channel_count}")]
    ChannelOutOfRange { index: i64, channel_count: usize },
}

/// Negotiated properties of one stream direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channels per frame
    pub channel_count: u16,
}

impl StreamFormat {
    pub fn new(sample_rate: u32, channel_count: u16) -> Self {
        Self {
            sample_rate,
            channel_count,
        }
    }

    fn validate(&self, direction: &str) -> Result<(), LoopbackError> {
        if self.sample_rate == 0 {
            return Err(LoopbackError::InvalidStreamFormat(format!(
                "{} sample rate is zero",
                direction
            )));
        }
        if self.channel_count == 0 {
            return Err(LoopbackError::InvalidStreamFormat(format!(
                "{} channel count is zero",
                direction
            )));
        }
        Ok(())
    }
}

/// Negotiated properties of both streams of a duplex session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplexFormat {
    pub output: StreamFormat,
    pub input: StreamFormat,
}

/// Value returned to the driving audio layer after each callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackResult {
    /// Keep invoking the callback
    Continue,
    /// Stop the streams
    Stop,
}

/// Recording direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// What was sent to the output stream
    Played,
    /// What was captured from the input stream
    Recorded,
}

/// Notable transitions reported by the audio half
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Non-looping playback reached the end of the clip
    PlaybackFinished {
        /// Played frame count at the end of the callback that finished
        played_frames: i64,
    },
    /// A recording evicted its first frame
    RecordingWrapped { direction: Direction },
}

/// Shape of the loaded clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipInfo {
    pub frame_count: usize,
    pub channel_count: usize,
    pub sample_rate: u32,
}

/// History of both directions of a session
#[derive(Debug)]
pub struct Recordings {
    /// Frames sent to the output, silence included
    pub played: MultiChannelRecording,
    /// Frames captured from the input
    pub recorded: MultiChannelRecording,
}

/// State shared by the control and audio halves
#[derive(Debug, Default)]
struct SharedState {
    clip: ArcSwapOption<PlaybackClip>,
    loop_playback: AtomicBool,
    played_frames: AtomicI64,
    recorded_frames: AtomicI64,
    playback_position: AtomicU64,
    next_generation: AtomicU64,
}

/// Buffers allocated by [`FullDuplexLoopback::start`]
struct ReadySession {
    format: DuplexFormat,
    meters: Arc<PeakDetectorBank>,
    events: Receiver<SessionEvent>,
}

enum SessionState {
    Uninitialized,
    Ready(ReadySession),
}

/// Control half of the full-duplex loopback
pub struct FullDuplexLoopback {
    config: LoopbackConfig,
    shared: Arc<SharedState>,
    session: SessionState,
    retired_tx: Sender<Arc<PlaybackClip>>,
    retired: Receiver<Arc<PlaybackClip>>,
}

impl FullDuplexLoopback {
    /// Create an engine with the given configuration; nothing is allocated
    /// for audio until [`start`](Self::start)
    pub fn new(config: LoopbackConfig) -> Self {
        let shared = SharedState::default();
        shared
            .loop_playback
            .store(config.loop_playback, Ordering::Relaxed);
        let (retired_tx, retired) = crossbeam_channel::bounded(RETIRED_CLIP_CAPACITY);
        Self {
            config,
            shared: Arc::new(shared),
            session: SessionState::Uninitialized,
            retired_tx,
            retired,
        }
    }

    pub fn config(&self) -> &LoopbackConfig {
        &self.config
    }

    /// Reset counters and allocate recordings and meters for `format`
    ///
    /// Must only be called while no processor from an earlier start is
    /// being driven. The returned processor is the audio half; move it into
    /// the callback of the driving layer.
    pub fn start(&mut self, format: DuplexFormat) -> Result<LoopbackProcessor, LoopbackError> {
        format.output.validate("output")?;
        format.input.validate("input")?;

        self.shared.played_frames.store(0, Ordering::Relaxed);
        self.shared.recorded_frames.store(0, Ordering::Relaxed);
        self.shared.playback_position.store(0, Ordering::Relaxed);

        let output_channels = format.output.channel_count as usize;
        let input_channels = format.input.channel_count as usize;
        let seconds = self.config.max_record_seconds as usize;

        let recordings = Recordings {
            played: MultiChannelRecording::new(
                output_channels,
                seconds * format.output.sample_rate as usize,
            )?,
            recorded: MultiChannelRecording::new(
                input_channels,
                seconds * format.input.sample_rate as usize,
            )?,
        };
        let meters = Arc::new(PeakDetectorBank::new(input_channels, self.config.peak_decay));
        let (event_tx, event_rx) = crossbeam_channel::bounded(self.config.event_capacity.max(1));

        self.session = SessionState::Ready(ReadySession {
            format,
            meters: Arc::clone(&meters),
            events: event_rx,
        });

        tracing::info!(
            output_rate = format.output.sample_rate,
            output_channels,
            input_rate = format.input.sample_rate,
            input_channels,
            max_record_seconds = self.config.max_record_seconds,
            "Loopback session started"
        );

        Ok(LoopbackProcessor {
            shared: Arc::clone(&self.shared),
            meters,
            recordings,
            events: event_tx,
            clip: None,
            retired: self.retired_tx.clone(),
            cursor: PlaybackCursor::new(),
            output_channels,
            input_channels,
            played_wrap_reported: false,
            recorded_wrap_reported: false,
        })
    }

    /// Whether [`start`](Self::start) has allocated the session buffers
    pub fn is_started(&self) -> bool {
        matches!(self.session, SessionState::Ready(_))
    }

    /// Format the session was started with
    pub fn format(&self) -> Option<DuplexFormat> {
        match &self.session {
            SessionState::Ready(ready) => Some(ready.format),
            SessionState::Uninitialized => None,
        }
    }

    /// Replace the playback clip and rewind to its first frame
    ///
    /// Copies `frame_count * channel_count` samples. On error nothing changes.
    /// Clips replaced by earlier loads are freed here.
    pub fn load_audio_data(
        &self,
        samples: &[f32],
        frame_count: usize,
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<(), LoopbackError> {
        let released = self.retired.try_iter().count();
        if released > 0 {
            tracing::debug!(released, "Freed replaced clips");
        }

        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let clip = PlaybackClip::new(samples, frame_count, channel_count, sample_rate)?
            .with_generation(generation);

        self.shared.clip.store(Some(Arc::new(clip)));
        self.shared.playback_position.store(0, Ordering::Relaxed);

        tracing::info!(
            frames = frame_count,
            channels = channel_count,
            sample_rate,
            "Loaded audio data"
        );
        Ok(())
    }

    /// Shape of the loaded clip, if any
    pub fn clip_info(&self) -> Option<ClipInfo> {
        self.shared.clip.load().as_deref().map(|clip| ClipInfo {
            frame_count: clip.frame_count(),
            channel_count: clip.channel_count(),
            sample_rate: clip.sample_rate(),
        })
    }

    /// Enable or disable looping; applies at the next wrap decision
    pub fn set_loop_playback(&self, enabled: bool) {
        self.shared.loop_playback.store(enabled, Ordering::Relaxed);
    }

    pub fn loop_playback(&self) -> bool {
        self.shared.loop_playback.load(Ordering::Relaxed)
    }

    /// Peak level of input channel `index`
    ///
    /// Returns [`PEAK_LEVEL_NOT_STARTED`] before [`start`](Self::start) and
    /// [`PEAK_LEVEL_OUT_OF_RANGE`] for an invalid index. Safe to poll at any
    /// rate; it never waits on the audio thread.
    pub fn peak_level(&self, index: i32) -> f64 {
        match self.try_peak_level(index) {
            Ok(level) => level as f64,
            Err(LoopbackError::NotStarted(_)) => PEAK_LEVEL_NOT_STARTED,
            Err(_) => PEAK_LEVEL_OUT_OF_RANGE,
        }
    }

    /// [`peak_level`](Self::peak_level) with the failure as an error value
    pub fn try_peak_level(&self, index: i32) -> Result<f32, LoopbackError> {
        let ready = match &self.session {
            SessionState::Ready(ready) => ready,
            SessionState::Uninitialized => {
                tracing::warn!("peak_level() called before start()");
                return Err(LoopbackError::NotStarted("peak_level"));
            }
        };

        let channel_count = ready.meters.len();
        usize::try_from(index)
            .ok()
            .and_then(|channel| ready.meters.level(channel))
            .ok_or_else(|| {
                tracing::warn!(index, channel_count, "peak_level() index out of range");
                LoopbackError::ChannelOutOfRange {
                    index: index as i64,
                    channel_count,
                }
            })
    }

    /// Levels of every input channel, empty before start
    pub fn peak_levels(&self) -> Vec<f32> {
        match &self.session {
            SessionState::Ready(ready) => ready.meters.levels(),
            SessionState::Uninitialized => Vec::new(),
        }
    }

    /// Number of metered input channels, zero before start
    pub fn input_channel_count(&self) -> usize {
        match &self.session {
            SessionState::Ready(ready) => ready.meters.len(),
            SessionState::Uninitialized => 0,
        }
    }

    /// Output frames processed since the last start
    pub fn played_frame_count(&self) -> i64 {
        self.shared.played_frames.load(Ordering::Relaxed)
    }

    /// Input frames processed since the last start
    pub fn recorded_frame_count(&self) -> i64 {
        self.shared.recorded_frames.load(Ordering::Relaxed)
    }

    /// Playback cursor as of the last completed callback, in clip frames
    pub fn playback_position(&self) -> u64 {
        self.shared.playback_position.load(Ordering::Relaxed)
    }

    /// Drain events reported by the audio half
    pub fn poll_events(&self) -> Vec<SessionEvent> {
        match &self.session {
            SessionState::Ready(ready) => ready.events.try_iter().collect(),
            SessionState::Uninitialized => Vec::new(),
        }
    }
}

impl Default for FullDuplexLoopback {
    fn default() -> Self {
        Self::new(LoopbackConfig::default())
    }
}

/// Audio half of the full-duplex loopback
///
/// Owned by the audio thread. Every method is bounded and allocation free.
pub struct LoopbackProcessor {
    shared: Arc<SharedState>,
    meters: Arc<PeakDetectorBank>,
    recordings: Recordings,
    events: Sender<SessionEvent>,
    /// Clip being played; holding it keeps the last reference off the
    /// arc-swap guard
    clip: Option<Arc<PlaybackClip>>,
    retired: Sender<Arc<PlaybackClip>>,
    cursor: PlaybackCursor,
    output_channels: usize,
    input_channels: usize,
    played_wrap_reported: bool,
    recorded_wrap_reported: bool,
}

impl LoopbackProcessor {
    /// Process one period of interleaved input and output
    ///
    /// Fills `output` from the playback clip, records what was played and
    /// what was captured, updates the input peak meters and advances the
    /// frame counters. Always returns [`CallbackResult::Continue`]; only the
    /// driving layer ends a session.
    pub fn on_both_streams_ready(&mut self, input: &[f32], output: &mut [f32]) -> CallbackResult {
        let input_frames = input.len() / self.input_channels;
        let input = &input[..input_frames * self.input_channels];

        self.adopt_latest_clip();
        let outcome = self.cursor.render(
            self.clip.as_deref(),
            &self.shared.loop_playback,
            output,
            self.output_channels,
        );
        let output_frames = outcome.frames;
        let played = &output[..output_frames * self.output_channels];

        for frame in input.chunks_exact(self.input_channels) {
            self.meters.process_frame(frame);
        }

        self.recordings.played.write(played);
        self.recordings.recorded.write(input);

        if !self.played_wrap_reported && self.recordings.played.has_wrapped() {
            self.played_wrap_reported = true;
            let _ = self.events.try_send(SessionEvent::RecordingWrapped {
                direction: Direction::Played,
            });
        }
        if !self.recorded_wrap_reported && self.recordings.recorded.has_wrapped() {
            self.recorded_wrap_reported = true;
            let _ = self.events.try_send(SessionEvent::RecordingWrapped {
                direction: Direction::Recorded,
            });
        }

        let played_total = self
            .shared
            .played_frames
            .fetch_add(output_frames as i64, Ordering::Relaxed)
            + output_frames as i64;
        self.shared
            .recorded_frames
            .fetch_add(input_frames as i64, Ordering::Relaxed);
        self.shared
            .playback_position
            .store(self.cursor.position() as u64, Ordering::Relaxed);

        if outcome.finished {
            let _ = self.events.try_send(SessionEvent::PlaybackFinished {
                played_frames: played_total,
            });
        }

        CallbackResult::Continue
    }

    /// Switch to the most recently published clip, if it changed
    ///
    /// The replaced clip goes back to the control half so its buffer is not
    /// freed on the audio thread.
    fn adopt_latest_clip(&mut self) {
        let latest = self.shared.clip.load();
        let unchanged = match (&self.clip, &*latest) {
            (Some(held), Some(current)) => Arc::ptr_eq(held, current),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        let replaced = std::mem::replace(&mut self.clip, (*latest).clone());
        if let Some(replaced) = replaced {
            let _ = self.retired.try_send(replaced);
        }
    }

    /// Both recordings; only observable while this half is not being driven
    pub fn recordings(&self) -> &Recordings {
        &self.recordings
    }

    /// End of session: give up the audio half and keep its recordings
    pub fn into_recordings(self) -> Recordings {
        self.recordings
    }

    /// Current playback cursor in clip frames
    pub fn playback_position(&self) -> usize {
        self.cursor.position()
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    pub fn input_channels(&self) -> usize {
        self.input_channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stereo_48k() -> DuplexFormat {
        DuplexFormat {
            output: StreamFormat::new(48000, 2),
            input: StreamFormat::new(48000, 2),
        }
    }

    fn small_config() -> LoopbackConfig {
        LoopbackConfig {
            max_record_seconds: 1,
            ..LoopbackConfig::default()
        }
    }

    #[test]
    fn test_engine_creation() {
        let engine = FullDuplexLoopback::default();
        assert!(!engine.is_started());
        assert!(engine.loop_playback());
        assert_eq!(engine.format(), None);
        assert_eq!(engine.input_channel_count(), 0);
        assert_eq!(engine.played_frame_count(), 0);
    }

    #[test]
    fn test_start_rejects_empty_format() {
        let mut engine = FullDuplexLoopback::default();
        let mut format = stereo_48k();
        format.input.channel_count = 0;
        assert!(matches!(
            engine.start(format),
            Err(LoopbackError::InvalidStreamFormat(_))
        ));

        format = stereo_48k();
        format.output.sample_rate = 0;
        assert!(engine.start(format).is_err());
        assert!(!engine.is_started());
    }

    #[test]
    fn test_start_sizes_recordings() {
        let mut engine = FullDuplexLoopback::new(small_config());
        let format = DuplexFormat {
            output: StreamFormat::new(48000, 2),
            input: StreamFormat::new(16000, 1),
        };
        let processor = engine.start(format).unwrap();
        assert_eq!(processor.output_channels(), 2);
        assert_eq!(processor.input_channels(), 1);

        let recordings = processor.recordings();
        assert_eq!(recordings.played.capacity_frames(), 48000);
        assert_eq!(recordings.played.channel_count(), 2);
        assert_eq!(recordings.recorded.capacity_frames(), 16000);
        assert_eq!(recordings.recorded.channel_count(), 1);
    }

    #[test]
    fn test_load_rejects_invalid_data() {
        let engine = FullDuplexLoopback::default();
        assert!(engine.load_audio_data(&[], 0, 1, 48000).is_err());
        assert!(engine.load_audio_data(&[0.5], 1, 0, 48000).is_err());
        assert!(engine.load_audio_data(&[0.5], 2, 1, 48000).is_err());
        assert_eq!(engine.clip_info(), None);
    }

    #[test]
    fn test_load_reports_clip_info() {
        let engine = FullDuplexLoopback::default();
        engine.load_audio_data(&[0.0; 20], 10, 2, 44100).unwrap();
        assert_eq!(
            engine.clip_info(),
            Some(ClipInfo {
                frame_count: 10,
                channel_count: 2,
                sample_rate: 44100
            })
        );
    }

    #[test]
    fn test_peak_level_sentinels() {
        let mut engine = FullDuplexLoopback::default();
        assert_eq!(engine.peak_level(0), PEAK_LEVEL_NOT_STARTED);
        assert_eq!(
            engine.try_peak_level(0),
            Err(LoopbackError::NotStarted("peak_level"))
        );

        let _processor = engine.start(stereo_48k()).unwrap();
        assert_eq!(engine.peak_level(-1), PEAK_LEVEL_OUT_OF_RANGE);
        assert_eq!(engine.peak_level(2), PEAK_LEVEL_OUT_OF_RANGE);
        assert_eq!(engine.peak_level(0), 0.0);
        assert_ne!(PEAK_LEVEL_NOT_STARTED, PEAK_LEVEL_OUT_OF_RANGE);
    }

    #[test]
    fn test_callback_meters_input() {
        let mut engine = FullDuplexLoopback::new(small_config());
        let mut processor = engine.start(stereo_48k()).unwrap();

        let input = [0.5, -0.25, 0.0, 0.0];
        let mut output = [0.0f32; 4];
        processor.on_both_streams_ready(&input, &mut output);

        assert_relative_eq!(engine.peak_level(0), 0.5 * 0.99, max_relative = 1e-6);
        assert_relative_eq!(engine.peak_level(1), 0.25 * 0.99, max_relative = 1e-6);
    }

    #[test]
    fn test_callback_counts_and_records() {
        let mut engine = FullDuplexLoopback::new(small_config());
        let mut processor = engine.start(stereo_48k()).unwrap();
        engine.load_audio_data(&[0.1, 0.2, 0.3], 3, 1, 48000).unwrap();

        let input = [0.4f32; 6];
        let mut output = [0.0f32; 8];
        let result = processor.on_both_streams_ready(&input, &mut output);

        assert_eq!(result, CallbackResult::Continue);
        assert_eq!(engine.played_frame_count(), 4);
        assert_eq!(engine.recorded_frame_count(), 3);
        assert_eq!(engine.playback_position(), 1);

        let recordings = processor.recordings();
        assert_eq!(recordings.played.to_interleaved(), output.to_vec());
        assert_eq!(recordings.recorded.to_interleaved(), input.to_vec());
    }

    #[test]
    fn test_inspecting_recordings_loses_no_frames() {
        let mut engine = FullDuplexLoopback::new(small_config());
        let mut processor = engine.start(stereo_48k()).unwrap();
        engine.load_audio_data(&[0.3; 4], 4, 1, 48000).unwrap();

        let mut output = [0.0f32; 8];
        processor.on_both_streams_ready(&[0.1; 8], &mut output);
        assert_eq!(processor.recordings().played.frames_written(), 4);
        processor.on_both_streams_ready(&[0.1; 8], &mut output);

        let recordings = processor.into_recordings();
        assert_eq!(
            recordings.played.frames_written() as i64,
            engine.played_frame_count()
        );
        assert_eq!(
            recordings.recorded.frames_written() as i64,
            engine.recorded_frame_count()
        );
        assert_eq!(recordings.played.len_frames(), 8);
        assert!(recordings.played.frames().all(|f| f == [0.3, 0.3]));
    }

    #[test]
    fn test_replaced_clip_is_freed_by_control_half() {
        let mut engine = FullDuplexLoopback::new(small_config());
        let mut processor = engine.start(stereo_48k()).unwrap();
        let mut output = [0.0f32; 4];

        engine.load_audio_data(&[0.1; 3], 3, 1, 48000).unwrap();
        processor.on_both_streams_ready(&[], &mut output);
        engine.load_audio_data(&[0.2; 5], 5, 1, 48000).unwrap();
        processor.on_both_streams_ready(&[], &mut output);
        assert_eq!(output, [0.2; 4]);

        let retired = engine.retired.try_recv().unwrap();
        assert_eq!(retired.frame_count(), 3);
        assert_eq!(Arc::strong_count(&retired), 1);
        assert!(engine.retired.is_empty());

        processor.on_both_streams_ready(&[], &mut output);
        assert!(engine.retired.is_empty(), "Unchanged clip is kept");
    }

    #[test]
    fn test_playback_finished_event() {
        let mut engine = FullDuplexLoopback::new(small_config());
        engine.set_loop_playback(false);
        let mut processor = engine.start(stereo_48k()).unwrap();
        engine.load_audio_data(&[0.5; 3], 3, 1, 48000).unwrap();

        let mut output = [0.0f32; 8];
        processor.on_both_streams_ready(&[], &mut output);
        processor.on_both_streams_ready(&[], &mut output);

        assert_eq!(
            engine.poll_events(),
            vec![SessionEvent::PlaybackFinished { played_frames: 4 }]
        );
    }

    #[test]
    fn test_recording_wrapped_event() {
        let config = LoopbackConfig {
            max_record_seconds: 1,
            ..LoopbackConfig::default()
        };
        let mut engine = FullDuplexLoopback::new(config);
        let format = DuplexFormat {
            output: StreamFormat::new(4, 1),
            input: StreamFormat::new(8, 1),
        };
        let mut processor = engine.start(format).unwrap();

        let mut output = [0.0f32; 6];
        processor.on_both_streams_ready(&[0.0; 6], &mut output);
        processor.on_both_streams_ready(&[0.0; 6], &mut output);

        assert_eq!(
            engine.poll_events(),
            vec![
                SessionEvent::RecordingWrapped {
                    direction: Direction::Played
                },
                SessionEvent::RecordingWrapped {
                    direction: Direction::Recorded
                },
            ]
        );
        assert!(engine.poll_events().is_empty());
    }

    #[test]
    fn test_restart_resets_counters() {
        let mut engine = FullDuplexLoopback::new(small_config());
        let mut processor = engine.start(stereo_48k()).unwrap();
        let mut output = [0.0f32; 4];
        processor.on_both_streams_ready(&[0.1; 4], &mut output);
        assert_eq!(engine.played_frame_count(), 2);
        drop(processor);

        let _processor = engine.start(stereo_48k()).unwrap();
        assert_eq!(engine.played_frame_count(), 0);
        assert_eq!(engine.recorded_frame_count(), 0);
        assert_eq!(engine.peak_level(0), 0.0);
    }
}
