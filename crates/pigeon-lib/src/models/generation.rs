// Generation data models
// Requests, long-running operations and results exchanged with the gateway

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of creative content a panel can ask the gateway for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    /// Concept briefs and other plain text
    Text,
    /// Keyframe images
    Image,
    /// Voice narration (speech synthesis)
    Audio,
    /// Motion reels, served as a long-running operation
    Video,
    /// Trend summaries grounded in web search
    SearchGrounded,
    /// Voice brief recordings turned into text
    Transcription,
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationKind::Text => write!(f, "text"),
            GenerationKind::Image => write!(f, "image"),
            GenerationKind::Audio => write!(f, "audio"),
            GenerationKind::Video => write!(f, "video"),
            GenerationKind::SearchGrounded => write!(f, "search_grounded"),
            GenerationKind::Transcription => write!(f, "transcription"),
        }
    }
}

impl GenerationKind {
    /// Premium kinds need a selected studio key before they are submitted
    pub fn is_premium(&self) -> bool {
        matches!(self, GenerationKind::Image | GenerationKind::Video)
    }

    /// Long-running kinds come back as an operation handle that must be polled
    pub fn is_long_running(&self) -> bool {
        matches!(self, GenerationKind::Video)
    }
}

/// Payload of a generation request
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationInput {
    Prompt(String),
    Recording(AudioClip),
}

/// Per-request model tuning. Unset fields fall back to gateway defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Image/video framing such as "16:9"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Prebuilt narration voice name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Video resolution such as "720p"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// A single user-triggered generation request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    id: Uuid,
    kind: GenerationKind,
    input: GenerationInput,
    options: ModelOptions,
    submitted_at: DateTime<Utc>,
}

impl GenerationRequest {
    fn new(kind: GenerationKind, input: GenerationInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            input,
            options: ModelOptions::default(),
            submitted_at: Utc::now(),
        }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        Self::new(GenerationKind::Text, GenerationInput::Prompt(prompt.into()))
    }

    pub fn image(prompt: impl Into<String>) -> Self {
        Self::new(GenerationKind::Image, GenerationInput::Prompt(prompt.into()))
    }

    pub fn narration(script: impl Into<String>) -> Self {
        Self::new(GenerationKind::Audio, GenerationInput::Prompt(script.into()))
    }

    pub fn video(prompt: impl Into<String>) -> Self {
        Self::new(GenerationKind::Video, GenerationInput::Prompt(prompt.into()))
    }

    pub fn search(query: impl Into<String>) -> Self {
        Self::new(GenerationKind::SearchGrounded, GenerationInput::Prompt(query.into()))
    }

    pub fn transcription(clip: AudioClip) -> Self {
        Self::new(GenerationKind::Transcription, GenerationInput::Recording(clip))
    }

    /// Build a request of any kind from a prompt
    pub fn from_prompt(kind: GenerationKind, prompt: impl Into<String>) -> Self {
        Self::new(kind, GenerationInput::Prompt(prompt.into()))
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> GenerationKind {
        self.kind
    }

    pub fn input(&self) -> &GenerationInput {
        &self.input
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn prompt(&self) -> Option<&str> {
        match &self.input {
            GenerationInput::Prompt(prompt) => Some(prompt),
            GenerationInput::Recording(_) => None,
        }
    }

    pub fn recording(&self) -> Option<&AudioClip> {
        match &self.input {
            GenerationInput::Recording(clip) => Some(clip),
            GenerationInput::Prompt(_) => None,
        }
    }

    /// True when there is nothing worth sending
    pub fn is_blank(&self) -> bool {
        match &self.input {
            GenerationInput::Prompt(prompt) => prompt.trim().is_empty(),
            GenerationInput::Recording(clip) => clip.bytes.is_empty(),
        }
    }
}

/// Opaque reference to a long-running remote job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationHandle(pub String);

impl OperationHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque pointer to a finished payload, e.g. a download URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultRef(pub String);

impl ResultRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// In-flight long-running job, owned by a lifecycle controller
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOperation {
    pub handle: OperationHandle,
    pub done: bool,
    pub result_ref: Option<ResultRef>,
}

impl GenerationOperation {
    pub fn pending(handle: OperationHandle) -> Self {
        Self {
            handle,
            done: false,
            result_ref: None,
        }
    }
}

/// Web page a search-grounded answer drew from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoBlob {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub source_uri: String,
}

/// Decoded PCM audio, samples interleaved in [-1.0, 1.0]
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    /// Decode signed 16-bit little-endian PCM. A dangling odd byte is dropped.
    pub fn from_pcm16_le(bytes: &[u8], sample_rate: u32, channels: u16) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
            .collect();
        Self {
            sample_rate,
            channels: channels.max(1),
            samples,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }
}

/// Microphone recording captured for a voice brief
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub duration: Duration,
}

/// Terminal output of a successful request
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Text {
        text: String,
        sources: Vec<GroundingSource>,
    },
    Image(ImageData),
    Audio(AudioBuffer),
    Video(VideoBlob),
}

impl GenerationResult {
    pub fn text(text: impl Into<String>) -> Self {
        GenerationResult::Text {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            GenerationResult::Text { .. } => "text",
            GenerationResult::Image(_) => "image",
            GenerationResult::Audio(_) => "audio",
            GenerationResult::Video(_) => "video",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_and_long_running_kinds() {
        assert!(GenerationKind::Image.is_premium());
        assert!(GenerationKind::Video.is_premium());
        assert!(!GenerationKind::Text.is_premium());
        assert!(GenerationKind::Video.is_long_running());
        assert!(!GenerationKind::Audio.is_long_running());
    }

    #[test]
    fn test_blank_prompt_detection() {
        assert!(GenerationRequest::text("   \n").is_blank());
        assert!(!GenerationRequest::text("A fintech rebrand").is_blank());

        let empty_clip = AudioClip {
            mime_type: "audio/webm".to_string(),
            bytes: Vec::new(),
            duration: Duration::ZERO,
        };
        assert!(GenerationRequest::transcription(empty_clip).is_blank());
    }

    #[test]
    fn test_request_accessors() {
        let request = GenerationRequest::video("neon city flythrough").with_options(ModelOptions {
            aspect_ratio: Some("16:9".to_string()),
            ..Default::default()
        });
        assert_eq!(request.kind(), GenerationKind::Video);
        assert_eq!(request.prompt(), Some("neon city flythrough"));
        assert!(request.recording().is_none());
        assert_eq!(request.options().aspect_ratio.as_deref(), Some("16:9"));
    }

    #[test]
    fn test_pcm16_decoding() {
        // 0, i16::MAX, i16::MIN, plus one stray byte
        let bytes = [0x00, 0x00, 0xFF, 0x7F, 0x00, 0x80, 0x01];
        let buffer = AudioBuffer::from_pcm16_le(&bytes, 24_000, 1);
        assert_eq!(buffer.samples.len(), 3);
        assert_eq!(buffer.samples[0], 0.0);
        assert!(buffer.samples[1] > 0.99);
        assert_eq!(buffer.samples[2], -1.0);
    }

    #[test]
    fn test_audio_duration() {
        let buffer = AudioBuffer {
            sample_rate: 24_000,
            channels: 2,
            samples: vec![0.0; 48_000],
        };
        assert_eq!(buffer.frame_count(), 24_000);
        assert_eq!(buffer.duration(), Duration::from_secs(1));
    }
}
