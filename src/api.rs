//! HTTP client for the narration backend.
//!
//! One client instance is shared by the whole app. Each submission is a
//! single multipart POST carrying the content, the selected voice id, and the
//! configured narration language; responses are normalized to an optional
//! audio URL. A missing `audioUrl` in a 2xx body means "no audio produced",
//! not an error.

use crate::config::AppConfig;
use crate::voices::{Voice, parse_voice_list};
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

static YOUTUBE_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:youtube\.com|youtu\.be)").expect("valid host pattern"));

/// True when the input carries a recognized YouTube host marker.
pub fn is_youtube_url(url: &str) -> bool {
    !url.trim().is_empty() && YOUTUBE_HOST.is_match(url)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NarrationResponse {
    #[serde(default)]
    audio_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NarrationClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl NarrationClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Building HTTP client")?;
        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Audio references may come back relative to the backend.
    pub fn resolve_audio_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        if reference.starts_with('/') {
            return format!("{}{}", self.base_url, reference);
        }
        format!("{}/{}", self.base_url, reference)
    }

    /// One read of the voice-listing endpoint.
    pub async fn fetch_voices(&self) -> Result<Vec<Voice>> {
        let url = self.endpoint("/api/voices");
        debug!(%url, "Fetching voice catalog");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Requesting voice catalog")?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("voice catalog request returned {status}: {detail}");
        }
        let body = response.text().await.context("Reading voice catalog")?;
        let voices = parse_voice_list(&body)?;
        info!(count = voices.len(), "Fetched voice catalog");
        Ok(voices)
    }

    pub async fn submit_youtube(&self, url: &str, voice_id: &str) -> Result<Option<String>> {
        let form = Form::new()
            .text("url", url.to_string())
            .text("voice_id", voice_id.to_string())
            .text("language", self.language.clone());
        self.submit("/api/youtube", form).await
    }

    pub async fn submit_pdf(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        voice_id: &str,
    ) -> Result<Option<String>> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .context("Building PDF part")?;
        let form = Form::new()
            .part("file", part)
            .text("voice_id", voice_id.to_string())
            .text("language", self.language.clone());
        self.submit("/api/pdf", form).await
    }

    pub async fn submit_text(&self, text: &str, voice_id: &str) -> Result<Option<String>> {
        let form = Form::new()
            .text("text", text.to_string())
            .text("voice_id", voice_id.to_string())
            .text("language", self.language.clone());
        self.submit("/api/tts", form).await
    }

    async fn submit(&self, path: &str, form: Form) -> Result<Option<String>> {
        let url = self.endpoint(path);
        debug!(%url, "Sending narration request");
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Sending narration request to {path}"))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("narration service returned {status}: {detail}");
        }
        let body: NarrationResponse = response
            .json()
            .await
            .context("Parsing narration response")?;
        info!(
            %url,
            has_audio = body.audio_url.is_some(),
            "Narration request settled"
        );
        Ok(body.audio_url)
    }

    pub async fn download_audio(&self, url: &str) -> Result<Vec<u8>> {
        debug!(%url, "Downloading rendered audio");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("Requesting rendered audio")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("audio download returned {status}");
        }
        let bytes = response.bytes().await.context("Reading rendered audio")?;
        info!(%url, size = bytes.len(), "Downloaded rendered audio");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> NarrationClient {
        NarrationClient::new(&AppConfig::default()).expect("client")
    }

    #[test]
    fn recognizes_youtube_hosts() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_youtube_url("https://youtu.be/abc"));
        assert!(is_youtube_url("youtube.com/watch?v=abc"));
    }

    #[test]
    fn rejects_non_youtube_input() {
        assert!(!is_youtube_url(""));
        assert!(!is_youtube_url("   "));
        assert!(!is_youtube_url("https://vimeo.com/123"));
        assert!(!is_youtube_url("just some words"));
    }

    #[test]
    fn endpoints_join_base_and_path() {
        let client = client();
        assert_eq!(
            client.endpoint("/api/tts"),
            "http://localhost:8000/api/tts"
        );
    }

    #[test]
    fn absolute_audio_urls_pass_through() {
        let client = client();
        assert_eq!(
            client.resolve_audio_url("https://x/a.mp3"),
            "https://x/a.mp3"
        );
    }

    #[test]
    fn relative_audio_urls_resolve_against_backend() {
        let client = client();
        assert_eq!(
            client.resolve_audio_url("/audio/a.mp3"),
            "http://localhost:8000/audio/a.mp3"
        );
        assert_eq!(
            client.resolve_audio_url("audio/a.mp3"),
            "http://localhost:8000/audio/a.mp3"
        );
    }
}
