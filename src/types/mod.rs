use crate::config::ProviderName;
use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};

/// 入站聊天请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// 期望的提供商，缺省时由网关选择主提供商
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(message: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    /// 验证请求参数
    pub fn validate(&self) -> Result<(), String> {
        if self.message.trim().is_empty() {
            return Err("message 不能为空".to_string());
        }
        Ok(())
    }
}

/// 一次网关调度的最终结果
///
/// 失败是正常返回值而非 Err，调用方总能拿到完整的尝试记录。
#[derive(Debug, Clone, PartialEq)]
pub enum ChatResult {
    Success {
        /// 提供商返回的原文，不做任何改写
        reply: String,
        provider: ProviderName,
        /// 胜出那次上游调用的耗时
        latency_ms: u64,
    },
    Failure {
        kind: ErrorKind,
        message: String,
        attempted: Vec<Attempt>,
    },
}

impl ChatResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ChatResult::Success { .. })
    }
}

/// 单次失败尝试的记录
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub provider: ProviderName,
    pub kind: ErrorKind,
    pub detail: String,
}

/// GET /api/providers 的响应载荷
#[derive(Debug, Clone, Serialize)]
pub struct ProvidersStatus {
    pub configured_providers: Vec<ConfiguredProvider>,
    pub available_providers: Vec<String>,
    pub primary_provider: Option<String>,
    pub total_configured: usize,
}

/// 已就绪提供商的状态条目
#[derive(Debug, Clone, Serialize)]
pub struct ConfiguredProvider {
    pub id: String,
    pub name: String,
    pub status: String,
}
