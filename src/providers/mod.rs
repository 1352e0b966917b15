pub mod anthropic;
pub mod google;
pub mod huggingface;
pub mod ollama;
pub mod openai;
pub mod openrouter;

use crate::config::{ProviderConfig, ProviderName};
use crate::error::AdapterError;
use reqwest::Client;
use std::time::Duration;

/// 单次上游调用的总超时（含连接与读取）
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// 聊天补全的统一生成参数
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

/// 获取全局 HTTP 客户端（连接池复用）
fn http_client() -> &'static Client {
    use once_cell::sync::Lazy;
    static CLIENT: Lazy<Client> = Lazy::new(|| {
        Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(10)
            .build()
            .unwrap()
    });
    &CLIENT
}

/// 按提供商分派一次补全调用
///
/// match 覆盖整个枚举，新增提供商时编译器会强制补齐分支。
pub async fn dispatch(config: &ProviderConfig, prompt: &str) -> Result<String, AdapterError> {
    match config.name {
        ProviderName::Google => google::complete(config, prompt).await,
        ProviderName::OpenAi => openai::complete(config, prompt).await,
        ProviderName::Anthropic => anthropic::complete(config, prompt).await,
        ProviderName::HuggingFace => huggingface::complete(config, prompt).await,
        ProviderName::OpenRouter => openrouter::complete(config, prompt).await,
        ProviderName::Ollama => ollama::complete(config, prompt).await,
    }
}
