use crate::config::ProviderConfig;
use crate::error::AdapterError;
use serde::{Deserialize, Serialize};

use super::{http_client, MAX_TOKENS, TEMPERATURE};

/// OpenAI Chat Completions 请求格式
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI Chat Completions 响应格式
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

fn build_request(model: &str, prompt: &str) -> OpenAiRequest {
    OpenAiRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

fn extract_reply(resp: OpenAiResponse) -> Result<String, AdapterError> {
    resp.choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| AdapterError::Malformed("OpenAI 响应中没有 choices".to_string()))
}

/// 调用 OpenAI Chat Completions 接口
pub async fn complete(config: &ProviderConfig, prompt: &str) -> Result<String, AdapterError> {
    let url = format!("{}/chat/completions", config.endpoint.trim_end_matches('/'));
    let api_key = config.credential.as_deref().unwrap_or_default();

    let response = http_client()
        .post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&build_request(&config.model, prompt))
        .send()
        .await
        .map_err(|e| AdapterError::from_transport("OpenAI", e))?;

    // 检查状态码
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdapterError::from_status("OpenAI", status.as_u16(), &body));
    }

    let resp: OpenAiResponse = response
        .json()
        .await
        .map_err(|e| AdapterError::from_transport("OpenAI", e))?;
    extract_reply(resp)
}
