use super::SpeechError;
use hound::{ SampleFormat, WavSpec, WavWriter };
use log::{ debug, error };
use std::io::Cursor;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Container the browser client records in (MediaRecorder `audio/webm`).
pub const INPUT_FORMAT: &str = "webm";
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Pipes a compressed recording through `ffmpeg` and returns 16 kHz mono
/// 16-bit PCM wrapped in a WAV container.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    sample_rate: u32,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            sample_rate: TARGET_SAMPLE_RATE,
        }
    }

    pub async fn to_wav(&self, container: &[u8]) -> Result<Vec<u8>, SpeechError> {
        let samples = self.decode_pcm(container).await?;
        debug!(
            "Transcoded {} byte {} payload into {} samples @ {} Hz",
            container.len(),
            INPUT_FORMAT,
            samples.len(),
            self.sample_rate
        );
        encode_wav(&samples, self.sample_rate)
    }

    async fn decode_pcm(&self, container: &[u8]) -> Result<Vec<i16>, SpeechError> {
        if container.is_empty() {
            return Err(SpeechError::Transcode("empty audio payload".into()));
        }

        let rate = self.sample_rate.to_string();
        let mut child = Command::new(&self.ffmpeg_path)
            .args([
                "-hide_banner",
                "-loglevel", "error",
                "-f", INPUT_FORMAT,
                "-i", "pipe:0",
                "-ar", rate.as_str(),
                "-ac", "1",
                "-f", "s16le",
                "-acodec", "pcm_s16le",
                "pipe:1",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpeechError::Transcode(format!("failed to start {}: {}", self.ffmpeg_path, e)))?;

        let mut stdin = child.stdin
            .take()
            .ok_or_else(|| SpeechError::Transcode("ffmpeg stdin unavailable".into()))?;
        let input = container.to_vec();
        // Feed stdin from its own task so a full stdout pipe cannot stall us.
        let writer = tokio::spawn(async move {
            let result = stdin.write_all(&input).await;
            drop(stdin);
            result
        });

        let output = child.wait_with_output().await?;
        if let Ok(Err(e)) = writer.await {
            debug!("ffmpeg closed stdin early: {}", e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("FFmpeg error: {}", stderr.trim());
            return Err(SpeechError::Transcode(format!("ffmpeg exited with {}: {}", output.status, stderr.trim())));
        }

        let samples = pcm_from_le_bytes(&output.stdout);
        if samples.is_empty() {
            return Err(SpeechError::Transcode("no audio samples decoded".into()));
        }
        Ok(samples)
    }
}

fn pcm_from_le_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect()
}

/// Wraps mono 16-bit samples in a WAV container.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, SpeechError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
