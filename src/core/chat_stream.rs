use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{
    ApiContent, ApiGenerationConfig, ApiGoogleSearch, ApiInlineData, ApiPart,
    ApiSystemInstruction, ApiTool, GenerateContentRequest, GenerateContentResponse,
};
use crate::core::attachment::{data_uri_payload, ASSUMED_IMAGE_MIME};
use crate::core::message::{GroundingSource, Message};
use crate::core::persona::GenerationSettings;
use crate::utils::url::stream_content_url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One increment of a streamed response, as seen by the rest of the crate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamChunk {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

impl StreamChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<GroundingSource>) -> Self {
        self.sources = sources;
        self
    }
}

impl From<GenerateContentResponse> for StreamChunk {
    fn from(response: GenerateContentResponse) -> Self {
        let Some(candidate) = response.candidates.into_iter().next() else {
            return StreamChunk::default();
        };

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        let sources = candidate
            .grounding_metadata
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .filter_map(|web| {
                        let uri = web.uri?;
                        let title = web.title.unwrap_or_else(|| uri.clone());
                        Some(GroundingSource { title, uri })
                    })
                    .collect()
            })
            .unwrap_or_default();

        StreamChunk { text, sources }
    }
}

#[derive(Debug)]
pub enum GenerationError {
    MissingApiKey,
    Transport(reqwest::Error),
    Status { status: u16, message: String },
    /// The stream carried an error payload.
    Api(String),
    Decode {
        payload: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::MissingApiKey => {
                write!(f, "No API key found. Set GEMINI_API_KEY (or API_KEY).")
            }
            GenerationError::Transport(source) => write!(f, "Request failed: {source}"),
            GenerationError::Status { status, message } => {
                write!(f, "API returned {status}: {message}")
            }
            GenerationError::Api(message) => write!(f, "API error: {message}"),
            GenerationError::Decode { payload, source } => {
                write!(f, "Failed to decode stream payload ({source}): {payload}")
            }
        }
    }
}

impl StdError for GenerationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            GenerationError::Transport(source) => Some(source),
            GenerationError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(value: reqwest::Error) -> Self {
        GenerationError::Transport(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

impl From<&Message> for Content {
    fn from(message: &Message) -> Self {
        let mut parts = vec![Part::Text(message.content.clone())];
        if let Some(image) = &message.image {
            parts.push(Part::InlineData {
                mime_type: ASSUMED_IMAGE_MIME.to_string(),
                data: data_uri_payload(image).to_string(),
            });
        }
        Content {
            role: message.role.to_api_role(),
            parts,
        }
    }
}

/// Everything the generation collaborator needs for one response.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub system_instruction: String,
    pub temperature: f32,
    pub search_enabled: bool,
}

impl GenerationRequest {
    pub fn new(settings: GenerationSettings, history: &[Message], temperature: f32) -> Self {
        Self {
            model: settings.model,
            contents: history.iter().map(Content::from).collect(),
            system_instruction: settings.system_instruction,
            temperature,
            search_enabled: settings.search_enabled,
        }
    }

    pub fn to_api(&self) -> GenerateContentRequest {
        let contents = self
            .contents
            .iter()
            .map(|content| ApiContent {
                role: Some(content.role.to_string()),
                parts: content.parts.iter().map(api_part).collect(),
            })
            .collect();

        let system_instruction = (!self.system_instruction.is_empty()).then(|| {
            ApiSystemInstruction {
                parts: vec![ApiPart {
                    text: Some(self.system_instruction.clone()),
                    inline_data: None,
                }],
            }
        });

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: ApiGenerationConfig {
                temperature: self.temperature,
            },
            tools: self.search_enabled.then(|| {
                vec![ApiTool {
                    google_search: ApiGoogleSearch::default(),
                }]
            }),
        }
    }
}

fn api_part(part: &Part) -> ApiPart {
    match part {
        Part::Text(text) => ApiPart {
            text: Some(text.clone()),
            inline_data: None,
        },
        Part::InlineData { mime_type, data } => ApiPart {
            text: None,
            inline_data: Some(ApiInlineData {
                mime_type: mime_type.clone(),
                data: data.clone(),
            }),
        },
    }
}

pub type ChunkStream = BoxStream<'static, Result<StreamChunk, GenerationError>>;

/// A streaming text generator.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn stream(&self, request: GenerationRequest) -> Result<ChunkStream, GenerationError>;
}

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client with the key from `GEMINI_API_KEY`, falling back to
    /// `API_KEY`.
    pub fn from_env(base_url: impl Into<String>) -> Result<Self, GenerationError> {
        let api_key = ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)?;
        Ok(Self::new(reqwest::Client::new(), base_url, api_key))
    }

    fn endpoint(&self, model: &str) -> String {
        stream_content_url(&self.base_url, model)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn stream(&self, request: GenerationRequest) -> Result<ChunkStream, GenerationError> {
        debug!(
            model = %request.model,
            search = request.search_enabled,
            turns = request.contents.len(),
            "Opening generation stream"
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request.to_api())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(GenerationError::Status {
                status,
                message: summarize_api_error(&body),
            });
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();
        Ok(decode_sse_stream(body))
    }
}

/// Splits a byte stream into SSE `data:` payloads, buffering partial lines
/// across network chunks.
#[derive(Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if let Some(payload) = payload_from_line(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a final line that arrived without a trailing newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        payload_from_line(&rest)
    }
}

fn payload_from_line(line: &[u8]) -> Option<String> {
    match std::str::from_utf8(line) {
        Ok(text) => extract_data_payload(text.trim()).map(str::to_owned),
        Err(e) => {
            warn!("Invalid UTF-8 in stream: {e}");
            None
        }
    }
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

#[derive(Debug, PartialEq)]
enum SsePayload {
    Chunk(StreamChunk),
    Done,
    Skip,
}

fn parse_payload(payload: &str) -> Result<SsePayload, GenerationError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Ok(SsePayload::Skip);
    }
    if trimmed == "[DONE]" {
        return Ok(SsePayload::Done);
    }

    let decode_err = |source| GenerationError::Decode {
        payload: trimmed.to_string(),
        source,
    };
    let value: serde_json::Value = serde_json::from_str(trimmed).map_err(decode_err)?;
    if value.get("error").is_some() {
        return Err(GenerationError::Api(summarize_api_error(trimmed)));
    }

    let response: GenerateContentResponse = serde_json::from_value(value).map_err(decode_err)?;
    Ok(SsePayload::Chunk(StreamChunk::from(response)))
}

struct SseState<E> {
    body: BoxStream<'static, Result<Vec<u8>, E>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<StreamChunk, GenerationError>>,
    finished: bool,
}

impl<E> SseState<E> {
    /// Queue the chunk or error for `payload`. Returns true once the stream
    /// has nothing more to yield after the queue drains.
    fn accept(&mut self, payload: &str) -> bool {
        match parse_payload(payload) {
            Ok(SsePayload::Chunk(chunk)) => {
                self.pending.push_back(Ok(chunk));
                false
            }
            Ok(SsePayload::Skip) => false,
            Ok(SsePayload::Done) => true,
            Err(err) => {
                self.pending.push_back(Err(err));
                true
            }
        }
    }
}

/// Turn a raw SSE byte stream into a stream of chunks. The stream ends after
/// the body closes, a `[DONE]` marker, or the first error.
pub fn decode_sse_stream<E>(body: BoxStream<'static, Result<Vec<u8>, E>>) -> ChunkStream
where
    E: Into<GenerationError> + Send + 'static,
{
    let state = SseState {
        body,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.pending.clear();
                    state.finished = true;
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    for payload in state.decoder.push(&bytes) {
                        if state.accept(&payload) {
                            state.finished = true;
                            break;
                        }
                    }
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(err.into()), state));
                }
                None => {
                    if let Some(payload) = state.decoder.finish() {
                        state.accept(&payload);
                    }
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// One-line description of an error body returned by the API.
pub fn summarize_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    // Error bodies sometimes arrive as a one-element JSON array.
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let value = match value {
            serde_json::Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        if let Some(summary) = extract_error_summary(&value).filter(|s| !s.is_empty()) {
            return summary;
        }
    }

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Progress of a background stream, delivered to whoever owns the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Chunk(StreamChunk),
    Failed(String),
    End,
}

/// Runs generation streams on background tasks and forwards their events,
/// tagged with the target session id, over one channel.
#[derive(Clone)]
pub struct StreamDispatcher {
    tx: mpsc::UnboundedSender<(String, StreamEvent)>,
    generator: Arc<dyn Generator>,
    shutdown: CancellationToken,
}

impl StreamDispatcher {
    pub fn new(
        generator: Arc<dyn Generator>,
    ) -> (Self, mpsc::UnboundedReceiver<(String, StreamEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                generator,
                shutdown: CancellationToken::new(),
            },
            rx,
        )
    }

    pub fn spawn(&self, session_id: String, request: GenerationRequest) {
        let tx = self.tx.clone();
        let generator = Arc::clone(&self.generator);
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = forward_stream(generator.as_ref(), request, &session_id, &tx) => {}
                _ = shutdown.cancelled() => {
                    debug!(%session_id, "Dropping generation stream on shutdown");
                }
            }
        });
    }

    /// Stop every background stream. Used when the application exits.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    #[cfg(test)]
    pub fn send_for_test(&self, session_id: &str, event: StreamEvent) {
        let _ = self.tx.send((session_id.to_string(), event));
    }
}

async fn forward_stream(
    generator: &dyn Generator,
    request: GenerationRequest,
    session_id: &str,
    tx: &mpsc::UnboundedSender<(String, StreamEvent)>,
) {
    let send = |event: StreamEvent| {
        let _ = tx.send((session_id.to_string(), event));
    };

    let mut stream = match generator.stream(request).await {
        Ok(stream) => stream,
        Err(err) => {
            send(StreamEvent::Failed(err.to_string()));
            return;
        }
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => send(StreamEvent::Chunk(chunk)),
            Err(err) => {
                send(StreamEvent::Failed(err.to_string()));
                return;
            }
        }
    }
    send(StreamEvent::End);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::core::persona::{ModelPolicy, Persona};
    use crate::utils::test_utils::ScriptedGenerator;

    const GROUNDED_PAYLOAD: &str = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"},{"text":"lo"}]},"groundingMetadata":{"groundingChunks":[{"web":{"uri":"https://a.test","title":"A"}},{"retrievedContext":{}},{"web":{"uri":"https://b.test"}}]}}]}"#;

    fn byte_stream(parts: Vec<&'static str>) -> BoxStream<'static, Result<Vec<u8>, GenerationError>> {
        stream::iter(parts.into_iter().map(|p| Ok(p.as_bytes().to_vec()))).boxed()
    }

    #[test]
    fn decoder_buffers_partial_lines_and_handles_spacing_variants() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        let payloads = decoder.push(b":1}\r\n\ndata:{\"b\":2}\nevent: ping\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
        assert_eq!(decoder.finish(), None);

        decoder.push(b"data: tail");
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
    }

    #[test]
    fn payload_converts_text_parts_and_web_sources() {
        let parsed = parse_payload(GROUNDED_PAYLOAD).expect("payload");
        let SsePayload::Chunk(chunk) = parsed else {
            panic!("expected chunk, got {parsed:?}");
        };
        assert_eq!(chunk.text, "Hello");
        assert_eq!(
            chunk.sources,
            vec![
                GroundingSource::new("A", "https://a.test"),
                GroundingSource::new("https://b.test", "https://b.test"),
            ]
        );
    }

    #[test]
    fn payload_without_candidates_is_an_empty_chunk() {
        assert_eq!(
            parse_payload(r#"{"usageMetadata":{}}"#).expect("payload"),
            SsePayload::Chunk(StreamChunk::default())
        );
        assert_eq!(parse_payload("[DONE]").expect("done"), SsePayload::Done);
        assert_eq!(parse_payload("  ").expect("skip"), SsePayload::Skip);
    }

    #[test]
    fn error_payloads_are_summarized() {
        let err = parse_payload(r#"{"error":{"code":429,"message":"Resource   exhausted"}}"#)
            .expect_err("error payload");
        match err {
            GenerationError::Api(message) => assert_eq!(message, "Resource exhausted"),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn summarize_handles_arrays_and_plain_text() {
        assert_eq!(
            summarize_api_error(r#"[{"error":{"message":"API key not valid"}}]"#),
            "API key not valid"
        );
        assert_eq!(summarize_api_error("bad\n gateway"), "bad gateway");
        assert_eq!(summarize_api_error(""), "<empty>");
        assert_eq!(summarize_api_error(r#"{"status":"failed"}"#), r#"{"status":"failed"}"#);
    }

    #[tokio::test]
    async fn sse_stream_yields_chunks_across_network_boundaries() {
        let body = byte_stream(vec![
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi\"}]}}]}\n",
            "\ndata: {\"candidates\":[{\"content\":{\"par",
            "ts\":[{\"text\":\" there\"}]}}]}\n\n",
        ]);
        let chunks: Vec<_> = decode_sse_stream(body).collect().await;
        let texts: Vec<String> = chunks
            .into_iter()
            .map(|c| c.expect("chunk").text)
            .collect();
        assert_eq!(texts, vec!["Hi".to_string(), " there".to_string()]);
    }

    #[tokio::test]
    async fn sse_stream_stops_after_first_error() {
        let body = byte_stream(vec![
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"partial\"}]}}]}\n",
            "data: {\"error\":{\"message\":\"boom\"}}\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"never\"}]}}]}\n",
        ]);
        let items: Vec<_> = decode_sse_stream(body).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(GenerationError::Api(_))));
    }

    #[tokio::test]
    async fn sse_stream_flushes_unterminated_final_line() {
        let body = byte_stream(vec![
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"end\"}]}}]}",
        ]);
        let items: Vec<_> = decode_sse_stream(body).collect().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().expect("chunk").text, "end");
    }

    #[test]
    fn request_maps_roles_images_and_search_tool() {
        let user = Message::user("look", Some("data:image/png;base64,QUJD".into()));
        let assistant = Message::new(Role::Assistant, "seen");
        let history = vec![user, assistant];

        let settings = ModelPolicy::default().settings(Persona::DataAnalyst, true);
        let request = GenerationRequest::new(settings, &history, 0.7);
        assert_eq!(request.contents[0].role, "user");
        assert_eq!(request.contents[1].role, "model");
        assert_eq!(
            request.contents[0].parts[1],
            Part::InlineData {
                mime_type: "image/jpeg".into(),
                data: "QUJD".into()
            }
        );

        let json = serde_json::to_value(request.to_api()).expect("serialize");
        assert_eq!(json["tools"][0]["googleSearch"], serde_json::json!({}));
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            Persona::DataAnalyst.system_instruction()
        );
        let temperature = json["generationConfig"]["temperature"].as_f64().expect("temp");
        assert!((temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn request_without_search_omits_tools() {
        let settings = ModelPolicy::default().settings(Persona::GeneralAssistant, false);
        let request = GenerationRequest::new(settings, &[Message::user("hi", None)], 0.7);
        let json = serde_json::to_value(request.to_api()).expect("serialize");
        assert!(json.get("tools").is_none());
        assert_eq!(json["contents"][0]["parts"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn endpoint_uses_sse_stream_route() {
        let client = GeminiClient::new(reqwest::Client::new(), "https://example.test/v1beta/", "k");
        assert_eq!(
            client.endpoint("gemini-3-flash-preview"),
            "https://example.test/v1beta/models/gemini-3-flash-preview:streamGenerateContent?alt=sse"
        );
    }

    #[tokio::test]
    async fn dispatcher_forwards_chunks_then_end() {
        let generator =
            ScriptedGenerator::new(vec![StreamChunk::text("a"), StreamChunk::text("b")]);
        let (dispatcher, mut rx) = StreamDispatcher::new(Arc::new(generator));
        let request = GenerationRequest::new(
            ModelPolicy::default().settings(Persona::GeneralAssistant, false),
            &[],
            0.7,
        );
        dispatcher.spawn("s1".into(), request);

        let mut events = Vec::new();
        while let Some((session_id, event)) = rx.recv().await {
            assert_eq!(session_id, "s1");
            let done = matches!(event, StreamEvent::End | StreamEvent::Failed(_));
            events.push(event);
            if done {
                break;
            }
        }
        assert_eq!(
            events,
            vec![
                StreamEvent::Chunk(StreamChunk::text("a")),
                StreamEvent::Chunk(StreamChunk::text("b")),
                StreamEvent::End,
            ]
        );
    }

    #[tokio::test]
    async fn dispatcher_reports_failures_without_end_marker() {
        let generator =
            ScriptedGenerator::failing_after(vec![StreamChunk::text("a")], "network down");
        let (dispatcher, mut rx) = StreamDispatcher::new(Arc::new(generator));
        let request = GenerationRequest::new(
            ModelPolicy::default().settings(Persona::GeneralAssistant, false),
            &[],
            0.7,
        );
        dispatcher.spawn("s1".into(), request);

        let (_, first) = rx.recv().await.expect("chunk");
        assert_eq!(first, StreamEvent::Chunk(StreamChunk::text("a")));
        let (_, second) = rx.recv().await.expect("failure");
        assert!(matches!(second, StreamEvent::Failed(ref m) if m.contains("network down")));
    }
}
