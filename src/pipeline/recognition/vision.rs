//! Vision-model recognizer: reads prescription photos through an Ollama server.
//!
//! Vision models return text without per-word confidence, so every line gets
//! the same heuristic score derived from the reply's length and structure.

use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::types::{PrescriptionImage, RawRecognitionResult, RecognizedLine, Recognizer};
use super::RecognitionError;

const SYSTEM_PROMPT: &str = "\
You are a prescription transcriber. Copy ALL visible text from the provided \
prescription image exactly as written, one printed or handwritten line per output line. \
Do not summarise, correct, translate or add anything.";

const USER_PROMPT: &str = "\
Transcribe every line of this prescription, top to bottom, keeping list numbers, \
dashes and punctuation as they appear.";

/// Production recognizer backed by a vision model on an Ollama server.
pub struct OllamaVisionRecognizer {
    base_url: String,
    model_name: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaVisionRecognizer {
    pub fn new(
        base_url: &str,
        model_name: &str,
        timeout_secs: u64,
    ) -> Result<Self, RecognitionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RecognitionError::Unavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
            client,
            timeout_secs,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> RecognitionError {
        if e.is_timeout() {
            RecognitionError::TimedOut {
                secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            RecognitionError::Unavailable(format!("Ollama is not running at {}", self.base_url))
        } else {
            RecognitionError::Unavailable(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl Recognizer for OllamaVisionRecognizer {
    fn recognize(
        &self,
        image: &PrescriptionImage,
    ) -> Result<RawRecognitionResult, RecognitionError> {
        let _span = tracing::info_span!(
            "vision_recognize",
            image_id = %image.id,
            model = %self.model_name,
            image_size = image.bytes.len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let encoded = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        let body = ChatRequest {
            model: &self.model_name,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                    images: vec![],
                },
                ChatMessage {
                    role: "user",
                    content: USER_PROMPT,
                    images: vec![encoded],
                },
            ],
            stream: false,
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Vision model returned an error");
            return Err(RecognitionError::Unavailable(format!(
                "Ollama returned status {}: {body}",
                status.as_u16()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| RecognitionError::ResponseParsing(e.to_string()))?;

        let lines = lines_from_vision_reply(&parsed.message.content);

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            line_count = lines.len(),
            "Vision recognition complete"
        );

        Ok(RawRecognitionResult::new(image.id, lines))
    }
}

/// Split a vision-model reply into lines, stripping Markdown code fences the
/// model sometimes wraps around its transcription.
pub fn lines_from_vision_reply(reply: &str) -> Vec<RecognizedLine> {
    let text: String = reply
        .lines()
        .filter(|l| !l.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");

    let confidence = heuristic_confidence(&text);
    text.lines()
        .map(|l| RecognizedLine::new(l, confidence))
        .collect()
}

/// Estimate confidence from the shape of the reply.
///
/// Base score by length: empty → 0.0, <50 chars → 0.2, <200 → 0.4,
/// <500 → 0.6, otherwise 0.8. Numbered items and dash bullets each add a small
/// bonus. Capped at 0.95 since the score is a guess, not a measurement.
fn heuristic_confidence(text: &str) -> f32 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let len = trimmed.chars().count();
    let base: f32 = if len < 50 {
        0.2
    } else if len < 200 {
        0.4
    } else if len < 500 {
        0.6
    } else {
        0.8
    };

    let has_numbered = trimmed.lines().any(|l| {
        let l = l.trim_start();
        let digits = l.chars().take_while(|c| c.is_ascii_digit()).count();
        digits > 0 && matches!(l[digits..].chars().next(), Some('.') | Some(')'))
    });
    let has_bullets = trimmed
        .lines()
        .any(|l| l.trim_start().starts_with("- ") || l.trim_start().starts_with("• "));

    let bonus: f32 = if has_numbered { 0.05 } else { 0.0 } + if has_bullets { 0.03 } else { 0.0 };

    (base + bonus).min(0.95)
}
