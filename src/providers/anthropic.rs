use crate::config::ProviderConfig;
use crate::error::AdapterError;
use serde::{Deserialize, Serialize};

use super::{http_client, MAX_TOKENS};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages 请求格式
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

/// Anthropic Messages 响应格式
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

fn build_request(model: &str, prompt: &str) -> AnthropicRequest {
    AnthropicRequest {
        model: model.to_string(),
        max_tokens: MAX_TOKENS,
        messages: vec![AnthropicMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
    }
}

/// 提取首个 text 类型内容块
fn extract_reply(resp: AnthropicResponse) -> Result<String, AdapterError> {
    resp.content
        .into_iter()
        .find(|block| block.kind == "text")
        .map(|block| block.text)
        .ok_or_else(|| AdapterError::Malformed("Anthropic 响应中没有文本内容".to_string()))
}

/// 调用 Anthropic Messages 接口
pub async fn complete(config: &ProviderConfig, prompt: &str) -> Result<String, AdapterError> {
    let url = format!("{}/v1/messages", config.endpoint.trim_end_matches('/'));
    let api_key = config.credential.as_deref().unwrap_or_default();

    let response = http_client()
        .post(&url)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .header("Content-Type", "application/json")
        .json(&build_request(&config.model, prompt))
        .send()
        .await
        .map_err(|e| AdapterError::from_transport("Anthropic", e))?;

    // 检查状态码
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdapterError::from_status(
            "Anthropic",
            status.as_u16(),
            &body,
        ));
    }

    let resp: AnthropicResponse = response
        .json()
        .await
        .map_err(|e| AdapterError::from_transport("Anthropic", e))?;
    extract_reply(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderName;
    use crate::error::ErrorKind;
    use mockito::{Server, ServerGuard};

    async fn setup_mock_server() -> ServerGuard {
        Server::new_async().await
    }

    fn create_test_config(endpoint: &str) -> ProviderConfig {
        ProviderConfig::keyed(
            ProviderName::Anthropic,
            Some("sk-ant-test".to_string()),
            "claude-3-sonnet-20240229",
            endpoint,
        )
    }

    #[test]
    fn test_extract_reply_skips_non_text_blocks() {
        let resp = AnthropicResponse {
            content: vec![
                ContentBlock {
                    kind: "thinking".to_string(),
                    text: String::new(),
                },
                ContentBlock {
                    kind: "text".to_string(),
                    text: "回答在这里".to_string(),
                },
            ],
        };
        assert_eq!(extract_reply(resp).unwrap(), "回答在这里");
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mut server = setup_mock_server().await;

        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-ant-test")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "model": "claude-3-sonnet-20240229",
                "max_tokens": 1000,
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .with_status(200)
            .with_body(
                r#"{
                "id": "msg_01",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "Hello! I'm Claude."}],
                "model": "claude-3-sonnet-20240229"
            }"#,
            )
            .create_async()
            .await;

        let config = create_test_config(&server.url());
        let reply = complete(&config, "Hello").await.unwrap();
        assert_eq!(reply, "Hello! I'm Claude.");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_unauthorized() {
        let mut server = setup_mock_server().await;

        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body(r#"{"type": "error", "error": {"type": "authentication_error"}}"#)
            .create_async()
            .await;

        let config = create_test_config(&server.url());
        let err = complete(&config, "Hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_overloaded_is_unreachable() {
        let mut server = setup_mock_server().await;

        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type": "error", "error": {"type": "overloaded_error"}}"#)
            .create_async()
            .await;

        let config = create_test_config(&server.url());
        let err = complete(&config, "Hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unreachable);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_empty_content() {
        let mut server = setup_mock_server().await;

        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"id": "msg_01", "content": []}"#)
            .create_async()
            .await;

        let config = create_test_config(&server.url());
        let err = complete(&config, "Hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);

        mock.assert_async().await;
    }
}
