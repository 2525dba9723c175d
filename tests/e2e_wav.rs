//! E2E tests for clip loading and recording export
//!
//! Loads a WAV clip into a session, runs it, exports both directions and
//! checks the exported files with hound.

use duplexloop::audio::wav;
use duplexloop::{DuplexFormat, FullDuplexLoopback, LoopbackConfig, StreamFormat};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

#[test]
fn test_clip_to_exported_recordings() {
    let dir = tempfile::tempdir().unwrap();
    let clip_path = dir.path().join("clip.wav");

    let spec = WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&clip_path, spec).unwrap();
    for i in 0..100 {
        writer.write_sample((i % 10) as f32 / 20.0).unwrap();
    }
    writer.finalize().unwrap();

    let clip = wav::read_clip(&clip_path).unwrap();
    assert_eq!(clip.frame_count(), 100);

    let mut engine = FullDuplexLoopback::new(LoopbackConfig {
        max_record_seconds: 1,
        ..LoopbackConfig::default()
    });
    let format = DuplexFormat {
        output: StreamFormat::new(16000, 2),
        input: StreamFormat::new(16000, 1),
    };
    let mut processor = engine.start(format).unwrap();
    engine
        .load_audio_data(
            &clip.samples,
            clip.frame_count(),
            clip.channel_count,
            clip.sample_rate,
        )
        .unwrap();

    let input = vec![-0.5f32; 160];
    let mut output = vec![0.0f32; 160 * 2];
    for _ in 0..3 {
        processor.on_both_streams_ready(&input, &mut output);
    }

    let recordings = processor.into_recordings();
    let played_path = wav::export_path(dir.path(), "hfp_played");
    let recorded_path = dir.path().join("exports").join("recorded.wav");
    wav::write_recording(&recordings.played, format.output.sample_rate, &played_path).unwrap();
    wav::write_recording(&recordings.recorded, format.input.sample_rate, &recorded_path).unwrap();

    let mut played = WavReader::open(&played_path).unwrap();
    assert_eq!(played.spec().channels, 2);
    assert_eq!(played.spec().sample_rate, 16000);
    let played: Vec<f32> = played.samples::<f32>().map(|s| s.unwrap()).collect();
    assert_eq!(played.len(), 480 * 2);
    for (i, frame) in played.chunks(2).enumerate() {
        let expected = clip.samples[i % 100];
        assert_eq!(frame, [expected, expected], "frame {}", i);
    }

    let mut recorded = WavReader::open(&recorded_path).unwrap();
    assert_eq!(recorded.spec().channels, 1);
    assert_eq!(recorded.duration(), 480);
    assert!(recorded.samples::<f32>().all(|s| s.unwrap() == -0.5));
}
