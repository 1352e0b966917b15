use crate::config::ProviderConfig;
use crate::error::AdapterError;
use serde::{Deserialize, Serialize};

use super::{http_client, TEMPERATURE};

// Inference API 的文本生成长度上限，与聊天补全的 token 上限不是一回事
const MAX_LENGTH: u32 = 200;

/// Hugging Face Inference API 请求格式
#[derive(Debug, Serialize)]
struct HfRequest {
    inputs: String,
    parameters: HfParameters,
}

#[derive(Debug, Serialize)]
struct HfParameters {
    max_length: u32,
    temperature: f32,
    do_sample: bool,
}

/// 响应是生成结果数组
#[derive(Debug, Deserialize)]
struct HfGeneration {
    #[serde(default)]
    generated_text: String,
}

fn build_request(prompt: &str) -> HfRequest {
    HfRequest {
        inputs: prompt.to_string(),
        parameters: HfParameters {
            max_length: MAX_LENGTH,
            temperature: TEMPERATURE,
            do_sample: true,
        },
    }
}

/// 取首个生成结果，并剥离模型回显的提示词前缀
fn extract_reply(generations: Vec<HfGeneration>, prompt: &str) -> Result<String, AdapterError> {
    let text = generations
        .into_iter()
        .next()
        .map(|g| g.generated_text)
        .ok_or_else(|| AdapterError::Malformed("Hugging Face 响应格式异常".to_string()))?;

    // 文本生成类模型会把输入原样带在输出开头
    if let Some(stripped) = text.strip_prefix(prompt) {
        Ok(stripped.trim().to_string())
    } else {
        Ok(text)
    }
}

/// 调用 Hugging Face Inference API
pub async fn complete(config: &ProviderConfig, prompt: &str) -> Result<String, AdapterError> {
    let url = format!(
        "{}/models/{}",
        config.endpoint.trim_end_matches('/'),
        config.model
    );
    let api_key = config.credential.as_deref().unwrap_or_default();

    let response = http_client()
        .post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&build_request(prompt))
        .send()
        .await
        .map_err(|e| AdapterError::from_transport("Hugging Face", e))?;

    // 检查状态码
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdapterError::from_status(
            "Hugging Face",
            status.as_u16(),
            &body,
        ));
    }

    let generations: Vec<HfGeneration> = response
        .json()
        .await
        .map_err(|e| AdapterError::from_transport("Hugging Face", e))?;
    extract_reply(generations, prompt)
}
