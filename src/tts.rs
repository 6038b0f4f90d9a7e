use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Synthesized speech with its media type.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Opaque speech collaborator: text plus language in, audio out.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<AudioClip>;
}

/// OpenAI speech endpoint client.
#[derive(Clone)]
pub struct OpenAiSpeech {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    timeout: Duration,
}

impl OpenAiSpeech {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        voice: String,
        timeout: Duration,
    ) -> Self {
        OpenAiSpeech {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            voice,
            timeout,
        }
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str, _lang: &str) -> Result<AudioClip> {
        let request = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::speech(None, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(AppError::speech(Some(status.as_u16()), body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::speech(None, format!("Failed to read audio body: {}", e)))?;

        Ok(AudioClip {
            bytes: bytes.to_vec(),
            content_type: "audio/mpeg".to_string(),
        })
    }
}
