//! OpenAI-compatible speech endpoint client (Kokoro-FastAPI and friends).
//!
//! POST {server_url}/audio/speech
//! Request: {"model", "input", "voice", "response_format"} (JSON)
//! Response: audio bytes in the requested format

use super::{SpeechClient, SpeechRequest};
use crate::config::Settings;
use crate::error::{Result, WikiVoxError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Speech client for one server.
pub struct OpenAiSpeechClient {
    http: Client,
    server_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiSpeechClient {
    pub fn new(server_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.tts.server_url, &settings.tts.model, settings.tts.api_key.clone())
    }

    fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.server_url)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.server_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl SpeechClient for OpenAiSpeechClient {
    #[instrument(skip(self, request), fields(chars = request.input.chars().count(), voice = %request.voice))]
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let url = self.speech_url();
        let body = SpeechBody {
            model: &self.model,
            input: &request.input,
            voice: &request.voice,
            response_format: request.format.extension(),
        };

        debug!(url = %url, format = %request.format, "Sending speech request");

        let response = self
            .authorized(self.http.post(&url))
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| WikiVoxError::network(&url, &e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WikiVoxError::http_status(&url, status, &text));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| WikiVoxError::network(&url, &e))?
            .to_vec();

        if audio.is_empty() {
            return Err(WikiVoxError::Api(format!("{} returned no audio", url)));
        }

        debug!(audio_size = audio.len(), "Speech request completed");
        Ok(audio)
    }

    fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn health_check(&self) -> bool {
        match self
            .authorized(self.http.get(self.models_url()))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
