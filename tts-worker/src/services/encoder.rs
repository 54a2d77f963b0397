//! WAV serialization of generated speech.

use base64::Engine;
use std::io::Cursor;

/// Header size of a canonical PCM WAV file.
const WAV_HEADER_BYTES: usize = 44;

/// Serialize mono float samples as 16-bit PCM WAV.
///
/// Samples outside [-1.0, 1.0] are clamped.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_BYTES + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

/// WAV-encode and base64 the result for transport.
pub fn encode_wav_base64(samples: &[f32], sample_rate: u32) -> Result<String, hound::Error> {
    let wav = encode_wav(samples, sample_rate)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(wav))
}
