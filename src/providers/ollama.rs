use crate::config::ProviderConfig;
use crate::error::AdapterError;
use serde::{Deserialize, Serialize};

use super::http_client;

/// Ollama generate 请求格式
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Ollama generate 响应格式（stream=false 时为单个对象）
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

fn transport(err: reqwest::Error) -> AdapterError {
    if err.is_decode() {
        AdapterError::Malformed(format!("Ollama 响应解析失败: {}", err))
    } else {
        AdapterError::Unreachable(format!("Ollama 请求失败: {}，请确认 Ollama 服务已启动", err))
    }
}

/// 调用本地 Ollama 的 generate 接口，无需认证
pub async fn complete(config: &ProviderConfig, prompt: &str) -> Result<String, AdapterError> {
    let url = format!("{}/api/generate", config.endpoint.trim_end_matches('/'));

    let body = OllamaRequest {
        model: config.model.clone(),
        prompt: prompt.to_string(),
        stream: false,
    };

    let response = http_client()
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(transport)?;

    // 检查状态码
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdapterError::from_status("Ollama", status.as_u16(), &body));
    }

    let resp: OllamaResponse = response.json().await.map_err(transport)?;
    Ok(resp.response)
}
