use crate::config::ProviderConfig;
use crate::error::AdapterError;
use serde::{Deserialize, Serialize};

use super::{http_client, MAX_TOKENS, TEMPERATURE};

/// Gemini API 请求格式
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// Gemini API 响应格式
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

fn build_request(prompt: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart {
                text: prompt.to_string(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_TOKENS,
        },
    }
}

/// 取首个候选并拼接其全部文本片段
fn extract_reply(resp: GeminiResponse) -> Result<String, AdapterError> {
    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AdapterError::Malformed("Gemini 响应中没有 candidates".to_string()))?;

    let reply = candidate
        .content
        .parts
        .into_iter()
        .map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");
    Ok(reply)
}

/// 调用 Gemini generateContent 接口
pub async fn complete(config: &ProviderConfig, prompt: &str) -> Result<String, AdapterError> {
    // 构建 URL（不在 URL 中暴露 API 密钥）
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        config.endpoint.trim_end_matches('/'),
        config.model
    );
    let api_key = config.credential.as_deref().unwrap_or_default();

    // 通过 HTTP 头传递 API 密钥
    let response = http_client()
        .post(&url)
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", api_key)
        .json(&build_request(prompt))
        .send()
        .await
        .map_err(|e| AdapterError::from_transport("Gemini", e))?;

    // 检查状态码
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdapterError::from_status("Gemini", status.as_u16(), &body));
    }

    let resp: GeminiResponse = response
        .json()
        .await
        .map_err(|e| AdapterError::from_transport("Gemini", e))?;
    extract_reply(resp)
}
