//! Bounded multi-channel sample history
//!
//! Holds the most recent `capacity_frames` interleaved frames. When full the
//! oldest frames are overwritten; `frames_written` keeps counting so callers
//! can tell how much history was evicted.

use super::loopback::LoopbackError;

/// Circular interleaved recording with a fixed channel count
#[derive(Debug, Clone)]
pub struct MultiChannelRecording {
    data: Box<[f32]>,
    channel_count: usize,
    capacity_frames: usize,
    /// Next frame slot to write, always `< capacity_frames` (or 0)
    write_index: usize,
    frames_written: u64,
}

impl MultiChannelRecording {
    /// Allocate a recording holding up to `capacity_frames` frames
    pub fn new(channel_count: usize, capacity_frames: usize) -> Result<Self, LoopbackError> {
        if channel_count == 0 {
            return Err(LoopbackError::InvalidArgument(
                "recording needs at least one channel".into(),
            ));
        }
        let samples = channel_count
            .checked_mul(capacity_frames)
            .ok_or_else(|| LoopbackError::InvalidArgument("recording size overflows".into()))?;
        Ok(Self {
            data: vec![0.0; samples].into_boxed_slice(),
            channel_count,
            capacity_frames,
            write_index: 0,
            frames_written: 0,
        })
    }

    /// Append whole interleaved frames; a trailing partial frame is ignored
    ///
    /// Never allocates. Returns the number of frames consumed from `samples`.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let frames = samples.len() / self.channel_count;
        self.frames_written += frames as u64;
        if self.capacity_frames == 0 || frames == 0 {
            return frames;
        }

        // Only the newest `capacity_frames` frames can survive this write
        let skip = frames.saturating_sub(self.capacity_frames);
        if skip > 0 {
            self.write_index = (self.write_index + skip) % self.capacity_frames;
        }
        let mut remaining = &samples[skip * self.channel_count..frames * self.channel_count];

        while !remaining.is_empty() {
            let room = self.capacity_frames - self.write_index;
            let chunk_frames = room.min(remaining.len() / self.channel_count);
            let chunk_samples = chunk_frames * self.channel_count;
            let start = self.write_index * self.channel_count;

            self.data[start..start + chunk_samples].copy_from_slice(&remaining[..chunk_samples]);
            remaining = &remaining[chunk_samples..];

            self.write_index += chunk_frames;
            if self.write_index == self.capacity_frames {
                self.write_index = 0;
            }
        }

        frames
    }

    /// Total frames ever appended, including evicted ones
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Frames currently retained
    pub fn len_frames(&self) -> usize {
        (self.frames_written.min(self.capacity_frames as u64)) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len_frames() == 0
    }

    /// Whether any frame has been evicted
    pub fn has_wrapped(&self) -> bool {
        self.frames_written > self.capacity_frames as u64
    }

    pub fn capacity_frames(&self) -> usize {
        self.capacity_frames
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Retained samples as (older, newer) slices in chronological order
    pub fn as_slices(&self) -> (&[f32], &[f32]) {
        let used = self.len_frames() * self.channel_count;
        if self.frames_written <= self.capacity_frames as u64 {
            (&self.data[..used], &self.data[..0])
        } else {
            let split = self.write_index * self.channel_count;
            (&self.data[split..], &self.data[..split])
        }
    }

    /// Iterate retained frames, oldest first
    pub fn frames(&self) -> impl Iterator<Item = &[f32]> {
        let (older, newer) = self.as_slices();
        older
            .chunks_exact(self.channel_count)
            .chain(newer.chunks_exact(self.channel_count))
    }

    /// Copy of the retained samples, interleaved, oldest first
    pub fn to_interleaved(&self) -> Vec<f32> {
        let (older, newer) = self.as_slices();
        let mut out = Vec::with_capacity(older.len() + newer.len());
        out.extend_from_slice(older);
        out.extend_from_slice(newer);
        out
    }

    /// Copy one channel of the retained history, oldest first
    pub fn channel(&self, channel: usize) -> Option<Vec<f32>> {
        if channel >= self.channel_count {
            return None;
        }
        Some(self.frames().map(|frame| frame[channel]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, channels: usize) -> Vec<f32> {
        (0..frames * channels).map(|i| i as f32).collect()
    }

    #[test]
    fn test_empty_recording() {
        let rec = MultiChannelRecording::new(2, 8).unwrap();
        assert!(rec.is_empty());
        assert!(!rec.has_wrapped());
        assert_eq!(rec.frames().count(), 0);
        assert_eq!(rec.capacity_frames(), 8);
        assert_eq!(rec.channel_count(), 2);
    }

    #[test]
    fn test_write_within_capacity() {
        let mut rec = MultiChannelRecording::new(2, 8).unwrap();
        assert_eq!(rec.write(&ramp(3, 2)), 3);
        assert_eq!(rec.len_frames(), 3);
        assert_eq!(rec.to_interleaved(), ramp(3, 2));
    }

    #[test]
    fn test_partial_frame_ignored() {
        let mut rec = MultiChannelRecording::new(2, 8).unwrap();
        assert_eq!(rec.write(&[1.0, 2.0, 3.0]), 1);
        assert_eq!(rec.to_interleaved(), vec![1.0, 2.0]);
        assert_eq!(rec.frames_written(), 1);
    }

    #[test]
    fn test_evicts_oldest() {
        let mut rec = MultiChannelRecording::new(1, 4).unwrap();
        for i in 0..6 {
            rec.write(&[i as f32]);
        }
        assert!(rec.has_wrapped());
        assert_eq!(rec.frames_written(), 6);
        assert_eq!(rec.len_frames(), 4);
        assert_eq!(rec.to_interleaved(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_write_straddles_wrap_point() {
        let mut rec = MultiChannelRecording::new(2, 5).unwrap();
        rec.write(&ramp(3, 2));
        rec.write(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0]);

        let frames: Vec<Vec<f32>> = rec.frames().map(|f| f.to_vec()).collect();
        assert_eq!(
            frames,
            vec![
                vec![4.0, 5.0],
                vec![10.0, 11.0],
                vec![12.0, 13.0],
                vec![14.0, 15.0],
                vec![16.0, 17.0],
            ]
        );
    }

    #[test]
    fn test_write_larger_than_capacity() {
        let mut rec = MultiChannelRecording::new(1, 3).unwrap();
        rec.write(&[0.0]);
        rec.write(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(rec.frames_written(), 7);
        assert_eq!(rec.to_interleaved(), vec![4.0, 5.0, 6.0]);

        rec.write(&[7.0]);
        assert_eq!(rec.to_interleaved(), vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_zero_capacity_only_counts() {
        let mut rec = MultiChannelRecording::new(2, 0).unwrap();
        assert_eq!(rec.write(&ramp(4, 2)), 4);
        assert_eq!(rec.frames_written(), 4);
        assert!(rec.is_empty());
        assert!(rec.to_interleaved().is_empty());
    }

    #[test]
    fn test_channel_extraction() {
        let mut rec = MultiChannelRecording::new(2, 4).unwrap();
        rec.write(&[0.1, -0.1, 0.2, -0.2]);
        assert_eq!(rec.channel(1), Some(vec![-0.1, -0.2]));
        assert_eq!(rec.channel(2), None);
    }

    #[test]
    fn test_zero_channels_rejected() {
        assert!(matches!(
            MultiChannelRecording::new(0, 4),
            Err(LoopbackError::InvalidArgument(_))
        ));
        assert!(MultiChannelRecording::new(usize::MAX, 2).is_err());
    }
}
