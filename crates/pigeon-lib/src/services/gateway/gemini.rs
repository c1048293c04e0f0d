// Gemini Gateway Implementation
//
// Google's Generative Language API serves every kind the studio panels use:
// text, search-grounded text, images, speech, transcription, and Veo video
// through long-running operations.
// Default endpoint: https://generativelanguage.googleapis.com/v1beta

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};

use super::{GatewayError, GatewayResponse, GatewayResult, GenerationGateway, OperationStatus};
use crate::models::{
    AudioBuffer, GenerationKind, GenerationRequest, GenerationResult, GroundingSource, ImageData,
    OperationHandle, ResultRef,
};
use crate::utils::config::GatewayConfig;

/// Shown when the model answers with no text at all
pub const EMPTY_TEXT_FALLBACK: &str = "No response generated.";

const DEFAULT_VOICE: &str = "Kore";
const DEFAULT_SPEECH_SAMPLE_RATE: u32 = 24_000;
const TRANSCRIBE_INSTRUCTION: &str =
    "Transcribe this voice brief word for word. Return only the transcript.";

/// Gemini Gateway
pub struct GeminiGateway {
    config: GatewayConfig,
    client: Client,
    api_key: String,
}

impl GeminiGateway {
    pub fn new(config: GatewayConfig, api_key: String) -> Self {
        Self {
            config,
            client: Client::new(),
            api_key,
        }
    }

    fn api_url(&self, path: &str) -> String {
        let base = self.config.endpoint.trim_end_matches('/');
        format!("{}/{}?key={}", base, path.trim_start_matches('/'), self.api_key)
    }

    fn content_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn model_for(&self, request: &GenerationRequest) -> String {
        request
            .options()
            .model
            .clone()
            .unwrap_or_else(|| self.config.models.model_for(request.kind()).to_string())
    }

    /// Append the key to a download URI that may already carry a query
    fn authorized_download_url(&self, uri: &str) -> GatewayResult<String> {
        let mut url = url::Url::parse(uri)
            .map_err(|e| GatewayError::ParseError(format!("invalid result uri {}: {}", uri, e)))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url.to_string())
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<R> {
        let url = self.api_url(path);
        let response = self
            .client
            .post(&url)
            .headers(self.content_headers())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(map_error_response(status.as_u16(), &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> GatewayResult<GenerateContentResponse> {
        let model = self.model_for(request);
        let body = build_content_request(request);
        log::debug!("Gemini {} request to {}", request.kind(), model);
        self.post_json(&format!("models/{}:generateContent", model), &body)
            .await
    }

    async fn start_video(&self, request: &GenerationRequest) -> GatewayResult<GatewayResponse> {
        let model = self.model_for(request);
        let options = request.options();
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: request.prompt().unwrap_or_default().to_string(),
            }],
            parameters: PredictParameters {
                aspect_ratio: options.aspect_ratio.clone(),
                resolution: options.resolution.clone(),
                number_of_videos: 1,
            },
        };

        let operation: OperationResponse = self
            .post_json(&format!("models/{}:predictLongRunning", model), &body)
            .await?;
        log::info!("Gemini video operation started: {}", operation.name);
        Ok(GatewayResponse::Pending(OperationHandle(operation.name)))
    }
}

// Gemini API types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    /// Base64 encoded payload
    data: String,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: serde_json::Value,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<String>,
    number_of_videos: u32,
}

/// Long-running operation resource
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<OperationResult>,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResult {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<u16>,
    #[serde(default)]
    message: String,
    status: Option<String>,
}

fn build_content_request(request: &GenerationRequest) -> GenerateContentRequest {
    let options = request.options();
    let mut parts = Vec::new();

    if let Some(clip) = request.recording() {
        parts.push(Part::text(TRANSCRIBE_INSTRUCTION));
        parts.push(Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: clip.mime_type.clone(),
                data: BASE64.encode(&clip.bytes),
            }),
        });
    } else {
        parts.push(Part::text(request.prompt().unwrap_or_default()));
    }

    let mut generation_config = GenerationConfig {
        temperature: options.temperature,
        ..Default::default()
    };
    match request.kind() {
        GenerationKind::Audio => {
            generation_config.response_modalities = Some(vec!["AUDIO".to_string()]);
            generation_config.speech_config = Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: options
                            .voice
                            .clone()
                            .unwrap_or_else(|| DEFAULT_VOICE.to_string()),
                    },
                },
            });
        }
        GenerationKind::Image => {
            generation_config.response_modalities = Some(vec!["IMAGE".to_string()]);
            generation_config.image_config = options.aspect_ratio.clone().map(|aspect_ratio| {
                ImageConfig { aspect_ratio }
            });
        }
        _ => {}
    }

    let tools = (request.kind() == GenerationKind::SearchGrounded).then(|| {
        vec![Tool {
            google_search: serde_json::json!({}),
        }]
    });

    let has_config = generation_config.temperature.is_some()
        || generation_config.response_modalities.is_some();

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        system_instruction: options.system_instruction.as_ref().map(|instruction| Content {
            role: None,
            parts: vec![Part::text(instruction.clone())],
        }),
        generation_config: has_config.then_some(generation_config),
        tools,
    }
}

/// Map a non-success HTTP response onto a gateway error
fn map_error_response(status: u16, body: &str) -> GatewayError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error);

    let Some(error) = detail else {
        return GatewayError::ApiError(format!("Gemini API error ({}): {}", status, body));
    };
    classify_error_detail(error, status)
}

fn classify_error_detail(error: ErrorDetail, http_status: u16) -> GatewayError {
    let code = error.code.unwrap_or(http_status);
    let status = error.status.as_deref().unwrap_or("");

    if code == 401 || code == 403 || status == "UNAUTHENTICATED" || status == "PERMISSION_DENIED" {
        return GatewayError::AuthFailed(error.message);
    }
    if code == 404 || status == "NOT_FOUND" {
        return GatewayError::NotFound(error.message);
    }
    if code == 429 || status == "RESOURCE_EXHAUSTED" {
        log::warn!("Gemini RESOURCE_EXHAUSTED: {}", error.message);
        return GatewayError::RateLimited(error.message);
    }
    GatewayError::ApiError(error.message)
}

fn collect_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .first()
        .map(|candidate| {
            candidate
                .content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn first_inline_data(response: &GenerateContentResponse) -> Option<&InlineData> {
    response
        .candidates
        .iter()
        .flat_map(|candidate| candidate.content.parts.iter())
        .find_map(|part| part.inline_data.as_ref())
}

fn collect_sources(response: &GenerateContentResponse) -> Vec<GroundingSource> {
    let mut sources: Vec<GroundingSource> = Vec::new();
    let chunks = response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.grounding_metadata.as_ref())
        .flat_map(|metadata| metadata.grounding_chunks.iter())
        .filter_map(|chunk| chunk.web.as_ref());

    for web in chunks {
        let Some(uri) = web.uri.clone() else { continue };
        if sources.iter().any(|s| s.uri == uri) {
            continue;
        }
        let title = web.title.clone().unwrap_or_else(|| uri.clone());
        sources.push(GroundingSource { title, uri });
    }
    sources
}

/// Pull the sample rate out of a mime type like `audio/L16;codec=pcm;rate=24000`
fn parse_sample_rate(mime_type: &str) -> u32 {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
        .unwrap_or(DEFAULT_SPEECH_SAMPLE_RATE)
}

fn into_result(
    kind: GenerationKind,
    response: GenerateContentResponse,
) -> GatewayResult<GenerationResult> {
    match kind {
        GenerationKind::Image => {
            let inline = first_inline_data(&response)
                .ok_or_else(|| GatewayError::EmptyResponse("image".to_string()))?;
            Ok(GenerationResult::Image(ImageData {
                mime_type: inline.mime_type.clone(),
                bytes: BASE64.decode(&inline.data)?,
            }))
        }
        GenerationKind::Audio => {
            let inline = first_inline_data(&response)
                .ok_or_else(|| GatewayError::EmptyResponse("audio".to_string()))?;
            let pcm = BASE64.decode(&inline.data)?;
            Ok(GenerationResult::Audio(AudioBuffer::from_pcm16_le(
                &pcm,
                parse_sample_rate(&inline.mime_type),
                1,
            )))
        }
        _ => {
            let text = collect_text(&response);
            let text = if text.trim().is_empty() {
                EMPTY_TEXT_FALLBACK.to_string()
            } else {
                text
            };
            let sources = if kind == GenerationKind::SearchGrounded {
                collect_sources(&response)
            } else {
                Vec::new()
            };
            Ok(GenerationResult::Text { text, sources })
        }
    }
}

fn into_status(operation: OperationResponse) -> OperationStatus {
    if let Some(error) = operation.error {
        return OperationStatus {
            done: true,
            result_ref: None,
            error: Some(error.message),
        };
    }

    let result_ref = operation
        .response
        .and_then(|r| r.generate_video_response)
        .and_then(|r| r.generated_samples.into_iter().next())
        .and_then(|sample| sample.video)
        .and_then(|video| video.uri)
        .map(ResultRef);

    OperationStatus {
        done: operation.done,
        result_ref,
        error: None,
    }
}

#[async_trait]
impl GenerationGateway for GeminiGateway {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate_content(
        &self,
        request: &GenerationRequest,
    ) -> GatewayResult<GatewayResponse> {
        if request.kind().is_long_running() {
            return self.start_video(request).await;
        }

        let response = self.generate(request).await?;
        let result = into_result(request.kind(), response)?;
        Ok(GatewayResponse::Completed(result))
    }

    async fn get_operation_status(
        &self,
        handle: &OperationHandle,
    ) -> GatewayResult<OperationStatus> {
        let url = self.api_url(handle.as_str());
        let response = self
            .client
            .get(&url)
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(map_error_response(status.as_u16(), &body));
        }

        let operation: OperationResponse = serde_json::from_str(&body)?;
        log::debug!("Gemini operation {} done={}", operation.name, operation.done);
        Ok(into_status(operation))
    }

    async fn resolve_result(&self, result_ref: &ResultRef) -> GatewayResult<Vec<u8>> {
        let url = self.authorized_download_url(result_ref.as_str())?;
        let response = self
            .client
            .get(&url)
            .timeout(self.config.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_error_response(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        log::info!("Gemini result downloaded ({} bytes)", bytes.len());
        Ok(bytes.to_vec())
    }
}
