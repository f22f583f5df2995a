//! WAV file writer utility
//!
//! Writes the engine's mono i16 output as 16-bit PCM.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

/// Format of every file written here
pub fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Write a mono 16-bit PCM WAV file
///
/// # Arguments
/// * `path` - Output file path
/// * `samples` - Mixed engine output
/// * `sample_rate` - Sample rate in Hz (only for header)
///
/// # Example
/// ```no_run
/// use playtune::wav::write_wav_16bit;
///
/// let samples = vec![0i16; 44100]; // 1 second of silence
/// write_wav_16bit("/tmp/output.wav", &samples, 44100).unwrap();
/// ```
pub fn write_wav_16bit<P: AsRef<Path>>(
    path: P,
    samples: &[i16],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, wav_spec(sample_rate))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_wav_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("header.wav");
        write_wav_16bit(&path, &[0; 100], 44100).unwrap();

        let data = fs::read(&path).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(&data[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([data[20], data[21]]), 1); // PCM
        assert_eq!(u16::from_le_bytes([data[22], data[23]]), 1); // Mono
        assert_eq!(
            u32::from_le_bytes([data[24], data[25], data[26], data[27]]),
            44100
        );
        assert_eq!(data.len(), 44 + 200);
    }

    #[test]
    fn test_samples_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.wav");
        let samples = [i16::MAX, i16::MIN, 1234, -1234, 0];
        write_wav_16bit(&path, &samples, 22050).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec(), wav_spec(22050));
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.wav");
        assert!(write_wav_16bit(&path, &[0; 4], 44100).is_err());
    }
}
