use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::info;
use uuid::Uuid;

use super::types::{
    AlertHistory, AlertSettings, ClassificationResult, EndedSession, ServiceStatus, SessionList,
    SessionTranscript, StartedSession, SupportedLanguages, TranscriptionResult,
};
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the backend's request/response endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// One-shot transcription of a pre-recorded audio file.
    pub async fn upload_audio(&self, path: &Path, language: &str) -> Result<TranscriptionResult> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();
        self.upload_audio_bytes(bytes, filename, language).await
    }

    /// One-shot transcription of raw captured PCM, wrapped in an
    /// in-memory WAV container.
    pub async fn upload_samples(
        &self,
        samples: &[i16],
        sample_rate: u32,
        language: &str,
    ) -> Result<TranscriptionResult> {
        let bytes = wav_bytes(samples, sample_rate)?;
        let filename = format!("clip-{}.wav", Uuid::new_v4());
        self.upload_audio_bytes(bytes, filename, language).await
    }

    async fn upload_audio_bytes(
        &self,
        bytes: Vec<u8>,
        filename: String,
        language: &str,
    ) -> Result<TranscriptionResult> {
        info!("uploading {} ({} bytes) for transcription", filename, bytes.len());

        let mime = audio_mime(&filename);
        let part = Part::bytes(bytes).file_name(filename).mime_str(mime)?;
        let form = Form::new()
            .part("file", part)
            .text("language", language.to_string());

        let result: TranscriptionResult = self
            .http
            .post(self.url("/api/speech/upload"))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !result.success {
            return Err(Error::UploadFailure(
                "server rejected the upload".to_string(),
            ));
        }
        Ok(result)
    }

    /// Classifies ambient sound in a file, returning the ranked top-k
    /// predictions.
    pub async fn classify_audio(&self, path: &Path, top_k: usize) -> Result<ClassificationResult> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();
        let mime = audio_mime(&filename);
        let part = Part::bytes(bytes).file_name(filename).mime_str(mime)?;
        let form = Form::new().part("file", part);

        Ok(self
            .http
            .post(self.url(&format!("/api/audio/classify?top_k={top_k}")))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    pub async fn speech_status(&self) -> Result<ServiceStatus> {
        self.get_json("/api/speech/status").await
    }

    pub async fn classifier_status(&self) -> Result<ServiceStatus> {
        self.get_json("/api/audio/status").await
    }

    pub async fn supported_languages(&self) -> Result<SupportedLanguages> {
        self.get_json("/api/speech/languages").await
    }

    pub async fn alert_settings(&self) -> Result<AlertSettings> {
        self.get_json("/api/alerts/settings").await
    }

    pub async fn alert_history(
        &self,
        limit: usize,
        sound_type: Option<&str>,
    ) -> Result<AlertHistory> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(kind) = sound_type {
            query.push(("sound_type", kind.to_string()));
        }
        Ok(self
            .http
            .get(self.url("/api/alerts/history"))
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    /// Starts a stored transcription session outside the live pathway.
    pub async fn start_session(
        &self,
        language: &str,
        participants: &[String],
    ) -> Result<StartedSession> {
        let mut query = vec![("language", language.to_string())];
        for participant in participants {
            query.push(("participants", participant.clone()));
        }
        Ok(self
            .http
            .post(self.url("/api/transcription/session/start"))
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    pub async fn end_session(&self, session_id: &str) -> Result<EndedSession> {
        Ok(self
            .http
            .post(self.url(&format!("/api/transcription/session/{session_id}/end")))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    pub async fn session_transcript(&self, session_id: &str) -> Result<SessionTranscript> {
        self.get_json(&format!("/api/transcription/session/{session_id}/transcript"))
            .await
    }

    pub async fn list_sessions(&self, limit: usize) -> Result<SessionList> {
        self.get_json(&format!("/api/transcription/sessions?limit={limit}"))
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(self
            .http
            .get(self.url(path))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Encodes mono PCM into an in-memory WAV container.
fn wav_bytes(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| Error::UploadFailure(format!("wav encoding failed: {e}")))?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| Error::UploadFailure(format!("wav encoding failed: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| Error::UploadFailure(format!("wav encoding failed: {e}")))?;
    }
    Ok(cursor.into_inner())
}

fn audio_mime(filename: &str) -> &'static str {
    let extension = filename
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        _ => "audio/wav",
    }
}
