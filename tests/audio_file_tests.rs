// Integration tests for WAV loading and PCM chunking
//
// Fixtures are generated with hound into a temporary directory.

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use loqa_stt_stream::audio::AudioFile;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_wav(dir: &Path, name: &str, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<PathBuf> {
    let path = dir.join(name);
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(path)
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let samples: Vec<i16> = (0..16000).map(|i| (i % 100) as i16).collect();
    let path = write_wav(dir.path(), "one-second.wav", 16000, 1, &samples)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples, samples);
    assert!((audio.duration_seconds - 1.0).abs() < 1e-9);
    assert!(audio.path.contains("one-second.wav"));

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_content_type_describes_pcm() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "stereo.wav", 48000, 2, &[0; 96])?;

    let audio = AudioFile::open(&path)?;
    assert_eq!(
        audio.content_type(),
        "audio/l16;rate=48000;channels=2;endianness=little-endian"
    );

    Ok(())
}

#[test]
fn test_pcm_chunks_cover_all_samples() -> Result<()> {
    let dir = TempDir::new()?;
    // 250ms at 16kHz mono
    let samples: Vec<i16> = (0..4000).map(|i| i as i16).collect();
    let path = write_wav(dir.path(), "quarter.wav", 16000, 1, &samples)?;
    let audio = AudioFile::open(&path)?;

    let chunks = audio.pcm_chunks(100);

    // 1600 samples per 100ms chunk: 1600 + 1600 + 800
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].len(), 3200);
    assert_eq!(chunks[2].len(), 1600);

    let decoded: Vec<i16> = chunks
        .concat()
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();
    assert_eq!(decoded, samples);

    Ok(())
}
