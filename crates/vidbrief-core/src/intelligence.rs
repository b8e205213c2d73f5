use async_trait::async_trait;
use serde_json::json;

use crate::error::{Result, VidbriefError};
use crate::prompts::{AUDIO_SUMMARY_PROMPT, CONSOLIDATION_PROMPT, VISUAL_SUMMARY_PROMPT};
use crate::types::EncodedFrame;

const TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const TRANSCRIPTION_MODEL: &str = "whisper-1";
const CHAT_MODEL: &str = "gpt-4o";

/// Generation-length ceilings per call. The consolidation ceiling is larger
/// since that call holds both summaries plus the synthesis.
const SUMMARY_MAX_TOKENS: u32 = 1500;
const CONSOLIDATION_MAX_TOKENS: u32 = 2000;

/// Seam over the third-party speech-to-text and completion services. Every
/// call is blocking for its full duration and is never retried; failures
/// surface as the owning stage's error.
#[async_trait]
pub trait Intelligence: Send + Sync {
    /// Transcribe an extracted audio track to plain text.
    async fn transcribe(&self, api_key: &str, audio: &[u8]) -> Result<String>;
    /// Describe the visual content of an ordered frame sequence.
    async fn describe_frames(&self, api_key: &str, frames: &[EncodedFrame]) -> Result<String>;
    /// Summarize the spoken content from a transcript.
    async fn summarize_transcript(&self, api_key: &str, transcript: &str) -> Result<String>;
    /// Synthesize the visual and audio summaries into one overview.
    async fn consolidate(&self, api_key: &str, visual: &str, audio: &str) -> Result<String>;
}

/// OpenAI-backed implementation: whisper for speech-to-text, multimodal chat
/// completions for the three summaries.
pub struct OpenAiIntelligence {
    client: reqwest::Client,
    transcription_url: String,
    chat_url: String,
}

impl OpenAiIntelligence {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            transcription_url: TRANSCRIPTION_URL.to_string(),
            chat_url: CHAT_URL.to_string(),
        }
    }

    /// Point the adapter at a different OpenAI-compatible host.
    pub fn with_base_url(base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            transcription_url: format!("{}/v1/audio/transcriptions", base.trim_end_matches('/')),
            chat_url: format!("{}/v1/chat/completions", base.trim_end_matches('/')),
        }
    }

    /// One chat-completion call; returns `choices[0].message.content`.
    async fn chat(
        &self,
        api_key: &str,
        messages: serde_json::Value,
        max_tokens: u32,
    ) -> Result<String> {
        let failed = |reason: String| VidbriefError::SummarizationFailed { reason };

        let response = self
            .client
            .post(&self.chat_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&json!({
                "model": CHAT_MODEL,
                "messages": messages,
                "max_tokens": max_tokens,
            }))
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?
            .json::<serde_json::Value>()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| failed(format!("Invalid API response: {response:?}")))?;

        Ok(content.to_string())
    }
}

impl Default for OpenAiIntelligence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Intelligence for OpenAiIntelligence {
    async fn transcribe(&self, api_key: &str, audio: &[u8]) -> Result<String> {
        let failed = |reason: String| VidbriefError::TranscriptionFailed { reason };

        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.mp3")
            .mime_str("audio/mpeg")
            .map_err(|e| failed(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", TRANSCRIPTION_MODEL)
            .text("response_format", "text");

        let response = self
            .client
            .post(&self.transcription_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!("service returned {status}: {body}")));
        }

        response.text().await.map_err(|e| failed(e.to_string()))
    }

    async fn describe_frames(&self, api_key: &str, frames: &[EncodedFrame]) -> Result<String> {
        let mut content = vec![json!({ "type": "text", "text": VISUAL_SUMMARY_PROMPT })];
        for frame in frames {
            content.push(json!({
                "type": "image_url",
                "image_url": { "url": format!("data:image/jpeg;base64,{}", frame.data) },
            }));
        }

        self.chat(
            api_key,
            json!([{ "role": "user", "content": content }]),
            SUMMARY_MAX_TOKENS,
        )
        .await
    }

    async fn summarize_transcript(&self, api_key: &str, transcript: &str) -> Result<String> {
        self.chat(
            api_key,
            json!([
                { "role": "system", "content": AUDIO_SUMMARY_PROMPT },
                { "role": "user", "content": transcript },
            ]),
            SUMMARY_MAX_TOKENS,
        )
        .await
    }

    async fn consolidate(&self, api_key: &str, visual: &str, audio: &str) -> Result<String> {
        let user = format!(
            "VISUAL SUMMARY:\n{visual}\n\nAUDIO SUMMARY:\n{audio}"
        );
        self.chat(
            api_key,
            json!([
                { "role": "system", "content": CONSOLIDATION_PROMPT },
                { "role": "user", "content": user },
            ]),
            CONSOLIDATION_MAX_TOKENS,
        )
        .await
    }
}
