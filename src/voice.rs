use time::{Duration, OffsetDateTime};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("already recording")]
    AlreadyRecording,

    #[error("not recording")]
    NotRecording,

    #[error("audio device error: {0}")]
    Device(String),
}

/// Result of one start/stop cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Recording {
    pub duration: Duration,
    /// Mono 16-bit WAV, when the capture keeps audio.
    ///
    /// Nothing reads it yet: sessions only use `duration` for the placeholder transcript.
    // TODO: upload to a transcription endpoint once one is configured.
    pub wav: Option<Vec<u8>>,
}

/// A platform audio input that can be started and stopped.
pub trait AudioCapture {
    fn start(&mut self) -> Result<(), CaptureError>;
    fn stop(&mut self) -> Result<Recording, CaptureError>;
}

/// Transcript substituted for a recording until speech-to-text exists.
pub fn placeholder_transcript(duration: Duration) -> String {
    let secs = duration.whole_seconds().max(0);
    format!(
        "[Voice message {}:{:02}] Transcription is not available yet.",
        secs / 60,
        secs % 60
    )
}

/// Capture that only measures how long it ran.
#[derive(Default)]
pub struct SilentCapture {
    started_at: Option<OffsetDateTime>,
}

impl AudioCapture for SilentCapture {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.started_at.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        self.started_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    fn stop(&mut self) -> Result<Recording, CaptureError> {
        let started_at = self.started_at.take().ok_or(CaptureError::NotRecording)?;
        Ok(Recording {
            duration: OffsetDateTime::now_utc() - started_at,
            wav: None,
        })
    }
}

#[cfg(all(feature = "capture", not(target_arch = "wasm32")))]
pub use microphone::MicrophoneCapture;

/// The microphone when built with `capture`, a timer otherwise.
pub fn default_capture() -> Box<dyn AudioCapture> {
    #[cfg(all(feature = "capture", not(target_arch = "wasm32")))]
    {
        Box::new(MicrophoneCapture::default())
    }
    #[cfg(not(all(feature = "capture", not(target_arch = "wasm32"))))]
    {
        Box::new(SilentCapture::default())
    }
}

#[cfg(all(feature = "capture", not(target_arch = "wasm32")))]
mod microphone {
    use super::{AudioCapture, CaptureError, Recording};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::{Arc, Mutex};
    use time::OffsetDateTime;

    const TARGET_RATE: u32 = 16000;

    /// Default input device through cpal, kept as 16kHz mono samples.
    #[derive(Default)]
    pub struct MicrophoneCapture {
        stream: Option<cpal::Stream>,
        buffer: Arc<Mutex<Vec<f32>>>,
        sample_rate: u32,
        started_at: Option<OffsetDateTime>,
    }

    impl MicrophoneCapture {
        fn open_stream(&self) -> Result<(cpal::Stream, u32), CaptureError> {
            let device_err = |err: &dyn std::fmt::Display| CaptureError::Device(err.to_string());

            let host = cpal::default_host();
            let device = host
                .default_input_device()
                .ok_or_else(|| CaptureError::Device("no input device found".into()))?;

            let default_config = device
                .default_input_config()
                .map_err(|e| device_err(&e))?;
            let rate = default_config.sample_rate();
            let factor = (rate / TARGET_RATE).max(1) as usize;
            let actual_rate = rate / factor as u32;
            tracing::info!("capturing at {rate}Hz, downsampling by {factor}x to ~{actual_rate}Hz");

            let config = default_config.config();
            let channels = config.channels as usize;
            let buffer = self.buffer.clone();
            let stream = device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let Ok(mut buf) = buffer.lock() else {
                            return;
                        };
                        for (i, frame) in data.chunks(channels).enumerate() {
                            if i % factor == 0 {
                                buf.push(frame.iter().sum::<f32>() / channels as f32);
                            }
                        }
                    },
                    |err| tracing::error!("input stream error: {err}"),
                    None,
                )
                .map_err(|e| device_err(&e))?;
            stream.play().map_err(|e| device_err(&e))?;
            Ok((stream, actual_rate))
        }
    }

    impl AudioCapture for MicrophoneCapture {
        fn start(&mut self) -> Result<(), CaptureError> {
            if self.stream.is_some() {
                return Err(CaptureError::AlreadyRecording);
            }
            if let Ok(mut buf) = self.buffer.lock() {
                buf.clear();
            }
            let (stream, sample_rate) = self.open_stream()?;
            self.stream = Some(stream);
            self.sample_rate = sample_rate;
            self.started_at = Some(OffsetDateTime::now_utc());
            Ok(())
        }

        fn stop(&mut self) -> Result<Recording, CaptureError> {
            // Dropping the stream stops the device.
            self.stream.take().ok_or(CaptureError::NotRecording)?;
            let duration = self
                .started_at
                .take()
                .map(|start| OffsetDateTime::now_utc() - start)
                .unwrap_or_default();
            let samples = self
                .buffer
                .lock()
                .map(|mut buf| std::mem::take(&mut *buf))
                .unwrap_or_default();
            let wav = samples_to_wav(&samples, self.sample_rate)
                .map_err(|e| CaptureError::Device(e.to_string()))?;
            Ok(Recording {
                duration,
                wav: Some(wav),
            })
        }
    }

    /// Convert f32 samples to WAV bytes (mono 16-bit PCM).
    fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
        Ok(cursor.into_inner())
    }

    #[cfg(test)]
    mod tests {
        use super::samples_to_wav;

        #[test]
        fn test_wav_header() {
            let wav = samples_to_wav(&[0.0, 0.5, -0.5], 16000).unwrap();
            assert_eq!(&wav[..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
        }
    }
}
