//! Clip playback for the loopback output
//!
//! A [`PlaybackClip`] is immutable once built; the control thread publishes
//! a new one for every load. The [`PlaybackCursor`] lives on the audio thread
//! and turns the current clip into output frames, looping or running out into
//! silence, and mapping the clip's channels onto the output's channels.

use super::loopback::LoopbackError;
use std::sync::atomic::{AtomicBool, Ordering};

/// Interleaved clip loaded for playback
#[derive(Debug, Clone)]
pub struct PlaybackClip {
    samples: Box<[f32]>,
    frame_count: usize,
    channel_count: usize,
    sample_rate: u32,
    /// Identity of this load; the cursor restarts when it changes
    generation: u64,
}

impl PlaybackClip {
    /// Copy `frame_count * channel_count` samples into a new clip
    pub fn new(
        samples: &[f32],
        frame_count: usize,
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self, LoopbackError> {
        if frame_count == 0 {
            return Err(LoopbackError::InvalidArgument(
                "frame count must be positive".into(),
            ));
        }
        if channel_count == 0 {
            return Err(LoopbackError::InvalidArgument(
                "channel count must be positive".into(),
            ));
        }
        let total = frame_count
            .checked_mul(channel_count)
            .ok_or_else(|| LoopbackError::InvalidArgument("clip size overflows".into()))?;
        if samples.len() < total {
            return Err(LoopbackError::InvalidArgument(format!(
                "expected {} samples for {} frames x {} channels, got {}",
                total,
                frame_count,
                channel_count,
                samples.len()
            )));
        }

        Ok(Self {
            samples: samples[..total].into(),
            frame_count,
            channel_count,
            sample_rate,
            generation: 0,
        })
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved samples of frame `index`
    #[inline]
    pub fn frame(&self, index: usize) -> &[f32] {
        let start = index * self.channel_count;
        &self.samples[start..start + self.channel_count]
    }
}

/// Outcome of one [`PlaybackCursor::render`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Frames written into the output, silence included
    pub frames: usize,
    /// Non-looping playback reached the end of the clip during this call
    pub finished: bool,
}

/// Read position into the current clip, owned by the audio thread
#[derive(Debug, Default)]
pub struct PlaybackCursor {
    position: usize,
    generation: u64,
    ended: bool,
    /// Clip length and loop flag as of the last render
    frame_count: usize,
    looping: bool,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame the cursor will play next
    ///
    /// The wrap itself happens when the next frame is needed, so a looping
    /// cursor resting on the end of the clip reports 0.
    pub fn position(&self) -> usize {
        if self.looping && self.frame_count > 0 && self.position >= self.frame_count {
            0
        } else {
            self.position
        }
    }

    /// Whether non-looping playback has run off the end of the clip
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Fill `output` with whole frames of `output_channels` channels
    ///
    /// Destination channel `c` reads source channel `c % clip channels`.
    /// `looping` is consulted at every wrap decision, which is taken when a
    /// frame past the end of the clip is needed. Never allocates.
    pub fn render(
        &mut self,
        clip: Option<&PlaybackClip>,
        looping: &AtomicBool,
        output: &mut [f32],
        output_channels: usize,
    ) -> RenderOutcome {
        let frames = if output_channels == 0 {
            0
        } else {
            output.len() / output_channels
        };
        let mut outcome = RenderOutcome {
            frames,
            ..RenderOutcome::default()
        };

        let clip = match clip {
            Some(clip) if clip.frame_count > 0 => clip,
            _ => {
                output.fill(0.0);
                return outcome;
            }
        };

        if clip.generation != self.generation {
            self.generation = clip.generation;
            self.position = 0;
            self.ended = false;
        }

        let used = frames * output_channels;
        let (body, tail) = output.split_at_mut(used);
        tail.fill(0.0);

        for index in 0..frames {
            if self.position >= clip.frame_count {
                if looping.load(Ordering::Relaxed) {
                    self.position = 0;
                    self.ended = false;
                } else {
                    if !self.ended {
                        self.ended = true;
                        outcome.finished = true;
                    }
                    body[index * output_channels..].fill(0.0);
                    break;
                }
            }

            let source = clip.frame(self.position);
            let frame = &mut body[index * output_channels..(index + 1) * output_channels];
            for (channel, sample) in frame.iter_mut().enumerate() {
                *sample = source[channel % clip.channel_count];
            }

            self.position += 1;
        }

        self.frame_count = clip.frame_count;
        self.looping = looping.load(Ordering::Relaxed);
        outcome
    }
}
