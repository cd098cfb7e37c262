//! Wire payloads for the Gemini `streamGenerateContent` endpoint.
//!
//! Only the fields the client reads or writes are modelled; everything else
//! in a response is ignored during deserialization.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<ApiSystemInstruction>,
    pub generation_config: ApiGenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ApiTool>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiContent {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<ApiPart>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<ApiInlineData>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiInlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ApiSystemInstruction {
    pub parts: Vec<ApiPart>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ApiGenerationConfig {
    pub temperature: f32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiTool {
    pub google_search: ApiGoogleSearch,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct ApiGoogleSearch {}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ApiCandidate>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiCandidate {
    #[serde(default)]
    pub content: Option<ApiContent>,
    #[serde(default)]
    pub grounding_metadata: Option<ApiGroundingMetadata>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<ApiGroundingChunk>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ApiGroundingChunk {
    #[serde(default)]
    pub web: Option<ApiWebSource>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ApiWebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}
