use crate::config::{ProviderConfig, ProviderName, ProviderRegistry};
use crate::error::ErrorKind;
use crate::metrics;
use crate::providers;
use crate::types::{Attempt, ChatRequest, ChatResult, ConfiguredProvider, ProvidersStatus};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Career Compass 人设，所有出站提示词都以它开头
pub const PERSONA_PROMPT: &str = "You are 'Career Compass', a helpful AI career advisor \
for a global talent marketplace called LifeCompass AI. A user has asked the following \
question. Provide a helpful and encouraging response.";

/// 把用户消息包进人设提示词
pub fn compose_prompt(message: &str) -> String {
    format!("{} User's question: {}", PERSONA_PROMPT, message)
}

/// 提供商网关：候选排序、调用分派与受限回退
pub struct ChatGateway {
    registry: Arc<ProviderRegistry>,
}

impl ChatGateway {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// 计算候选顺序：[指定提供商, 主提供商]，去重
    ///
    /// 候选最多两个。指定项未启用（或根本没指定）时只剩主提供商，
    /// 绝不扩大为全量轮询。
    pub fn candidates(&self, requested: Option<ProviderName>) -> Vec<&ProviderConfig> {
        let mut out = Vec::with_capacity(2);

        if let Some(name) = requested {
            match self.registry.get(name) {
                Some(config) if config.enabled => out.push(config),
                _ => warn!("提供商 {} 未启用，改用主提供商", name),
            }
        }

        if let Some(primary) = self.registry.primary() {
            if !out.iter().any(|c: &&ProviderConfig| c.name == primary.name) {
                out.push(primary);
            }
        }

        out
    }

    /// 调度一次聊天请求
    ///
    /// 按候选顺序依次调用，第一个成功立即返回；全部失败时把每次
    /// 尝试的记录聚合成 Failure。失败是正常返回值，不走 Err 通道。
    pub async fn send(&self, request: &ChatRequest) -> ChatResult {
        let requested = request.provider.as_deref().and_then(|raw| {
            let parsed = ProviderName::parse(raw);
            if parsed.is_none() {
                warn!("未知的提供商名称: {}，改用主提供商", raw);
            }
            parsed
        });

        let candidates = self.candidates(requested);
        if candidates.is_empty() {
            return ChatResult::Failure {
                kind: ErrorKind::NoProviderConfigured,
                message: "未配置任何 AI 提供商，请至少设置一个 API 密钥".to_string(),
                attempted: Vec::new(),
            };
        }

        let prompt = compose_prompt(&request.message);
        let mut attempted = Vec::with_capacity(candidates.len());

        for config in candidates {
            debug!("调用提供商 {} (model={})", config.name, config.model);
            let started = Instant::now();

            match providers::dispatch(config, &prompt).await {
                Ok(reply) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    if !attempted.is_empty() {
                        info!("回退提供商 {} 调用成功 ({} ms)", config.name, latency_ms);
                        metrics::global_metrics().record_fallback();
                    }
                    return ChatResult::Success {
                        reply,
                        provider: config.name,
                        latency_ms,
                    };
                }
                Err(e) => {
                    warn!("提供商 {} 调用失败 [{}]: {}", config.name, e.kind(), e.detail());
                    attempted.push(Attempt {
                        provider: config.name,
                        kind: e.kind(),
                        detail: e.detail().to_string(),
                    });
                }
            }
        }

        ChatResult::Failure {
            kind: ErrorKind::AllProvidersFailed,
            message: "所有候选提供商均调用失败".to_string(),
            attempted,
        }
    }

    /// 提供商状态汇总，供 /api/providers 使用
    pub fn status(&self) -> ProvidersStatus {
        let configured_providers: Vec<ConfiguredProvider> = self
            .registry
            .enabled()
            .map(|config| ConfiguredProvider {
                id: config.name.as_str().to_string(),
                name: config.display_name(),
                status: "ready".to_string(),
            })
            .collect();
        let total_configured = configured_providers.len();

        ProvidersStatus {
            configured_providers,
            available_providers: ProviderName::ALL
                .iter()
                .map(|n| n.as_str().to_string())
                .collect(),
            primary_provider: self.registry.primary().map(|c| c.name.as_str().to_string()),
            total_configured,
        }
    }
}
