use std::fmt;
use tracing::{info, warn};

const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
const ENV_GOOGLE_MODEL: &str = "GOOGLE_MODEL";
const ENV_GOOGLE_API_BASE: &str = "GOOGLE_API_BASE";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
const ENV_OPENAI_API_BASE: &str = "OPENAI_API_BASE";
const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
const ENV_ANTHROPIC_MODEL: &str = "ANTHROPIC_MODEL";
const ENV_ANTHROPIC_API_BASE: &str = "ANTHROPIC_API_BASE";
const ENV_HUGGINGFACE_API_KEY: &str = "HUGGINGFACE_API_KEY";
const ENV_HUGGINGFACE_MODEL: &str = "HUGGINGFACE_MODEL";
const ENV_HUGGINGFACE_API_BASE: &str = "HUGGINGFACE_API_BASE";
const ENV_OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
const ENV_OPENROUTER_MODEL: &str = "OPENROUTER_MODEL";
const ENV_OPENROUTER_API_BASE: &str = "OPENROUTER_API_BASE";
const ENV_OLLAMA_URL: &str = "OLLAMA_URL";
const ENV_OLLAMA_MODEL: &str = "OLLAMA_MODEL";
const ENV_PRIMARY_PROVIDER: &str = "PRIMARY_AI_PROVIDER";

const DEFAULT_GOOGLE_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GOOGLE_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-sonnet-20240229";
const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com";
const DEFAULT_HUGGINGFACE_MODEL: &str = "microsoft/DialoGPT-medium";
const DEFAULT_HUGGINGFACE_ENDPOINT: &str = "https://api-inference.huggingface.co";
const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-flash-1.5";
const DEFAULT_OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1";
const DEFAULT_OLLAMA_MODEL: &str = "llama2";
const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// 支持的提供商（封闭集合）
///
/// 路由只会在这个枚举内分派，未知名称在解析阶段就被挡下，
/// 不存在运行时才发现"无此提供商"的分支。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderName {
    Google,
    OpenAi,
    Anthropic,
    HuggingFace,
    OpenRouter,
    Ollama,
}

impl ProviderName {
    /// 注册顺序，决定默认主提供商的选择
    pub const ALL: [ProviderName; 6] = [
        ProviderName::Google,
        ProviderName::OpenAi,
        ProviderName::Anthropic,
        ProviderName::HuggingFace,
        ProviderName::OpenRouter,
        ProviderName::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Google => "google",
            ProviderName::OpenAi => "openai",
            ProviderName::Anthropic => "anthropic",
            ProviderName::HuggingFace => "huggingface",
            ProviderName::OpenRouter => "openrouter",
            ProviderName::Ollama => "ollama",
        }
    }

    /// 解析线上名称（大小写与首尾空白不敏感）
    pub fn parse(s: &str) -> Option<ProviderName> {
        match s.trim().to_lowercase().as_str() {
            "google" => Some(ProviderName::Google),
            "openai" => Some(ProviderName::OpenAi),
            "anthropic" => Some(ProviderName::Anthropic),
            "huggingface" => Some(ProviderName::HuggingFace),
            "openrouter" => Some(ProviderName::OpenRouter),
            "ollama" => Some(ProviderName::Ollama),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个提供商的完整配置
#[derive(Clone)]
pub struct ProviderConfig {
    pub name: ProviderName,
    /// API 密钥，Ollama 这类本地服务为 None
    pub credential: Option<String>,
    pub model: String,
    /// 基础 URL，路径由各适配器自行拼接
    pub endpoint: String,
    pub enabled: bool,
}

// 手写 Debug，避免密钥进入日志
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("credential", &self.credential.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl ProviderConfig {
    /// 需要密钥的提供商，密钥缺失即禁用
    pub fn keyed(
        name: ProviderName,
        credential: Option<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        let enabled = credential.is_some();
        ProviderConfig {
            name,
            credential,
            model: model.into(),
            endpoint: endpoint.into(),
            enabled,
        }
    }

    /// 无需密钥的本地提供商（Ollama）
    pub fn local(name: ProviderName, model: impl Into<String>, endpoint: impl Into<String>) -> Self {
        ProviderConfig {
            name,
            credential: None,
            model: model.into(),
            endpoint: endpoint.into(),
            enabled: true,
        }
    }

    /// 状态接口里展示的人类可读名称
    pub fn display_name(&self) -> String {
        match self.name {
            ProviderName::Google => "Google Gemini".to_string(),
            ProviderName::OpenAi => format!("OpenAI ({})", self.model),
            ProviderName::Anthropic => format!("Anthropic ({})", self.model),
            ProviderName::HuggingFace => format!("Hugging Face ({})", self.model),
            ProviderName::OpenRouter => format!("OpenRouter ({})", self.model),
            ProviderName::Ollama => format!("Ollama ({})", self.model),
        }
    }
}

/// 启动时从环境构建的只读提供商表
///
/// 六个提供商全部保留条目（含禁用项），主提供商在构建时解析完成，
/// 之后的所有路由决策都不再读环境。
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
    primary: Option<ProviderName>,
}

impl ProviderRegistry {
    /// 从环境变量构建注册表
    ///
    /// 密钥缺失或为空白只会禁用对应提供商，不会报错；
    /// 零提供商可用也是合法状态，由网关在请求时返回配置错误。
    pub fn from_env() -> Self {
        let ollama = match env_non_empty(ENV_OLLAMA_URL) {
            Some(url) => ProviderConfig::local(
                ProviderName::Ollama,
                env_or(ENV_OLLAMA_MODEL, DEFAULT_OLLAMA_MODEL),
                url,
            ),
            None => ProviderConfig {
                name: ProviderName::Ollama,
                credential: None,
                model: env_or(ENV_OLLAMA_MODEL, DEFAULT_OLLAMA_MODEL),
                endpoint: DEFAULT_OLLAMA_ENDPOINT.to_string(),
                enabled: false,
            },
        };

        let providers = vec![
            ProviderConfig::keyed(
                ProviderName::Google,
                env_non_empty(ENV_GOOGLE_API_KEY),
                env_or(ENV_GOOGLE_MODEL, DEFAULT_GOOGLE_MODEL),
                env_or(ENV_GOOGLE_API_BASE, DEFAULT_GOOGLE_ENDPOINT),
            ),
            ProviderConfig::keyed(
                ProviderName::OpenAi,
                env_non_empty(ENV_OPENAI_API_KEY),
                env_or(ENV_OPENAI_MODEL, DEFAULT_OPENAI_MODEL),
                env_or(ENV_OPENAI_API_BASE, DEFAULT_OPENAI_ENDPOINT),
            ),
            ProviderConfig::keyed(
                ProviderName::Anthropic,
                env_non_empty(ENV_ANTHROPIC_API_KEY),
                env_or(ENV_ANTHROPIC_MODEL, DEFAULT_ANTHROPIC_MODEL),
                env_or(ENV_ANTHROPIC_API_BASE, DEFAULT_ANTHROPIC_ENDPOINT),
            ),
            ProviderConfig::keyed(
                ProviderName::HuggingFace,
                env_non_empty(ENV_HUGGINGFACE_API_KEY),
                env_or(ENV_HUGGINGFACE_MODEL, DEFAULT_HUGGINGFACE_MODEL),
                env_or(ENV_HUGGINGFACE_API_BASE, DEFAULT_HUGGINGFACE_ENDPOINT),
            ),
            ProviderConfig::keyed(
                ProviderName::OpenRouter,
                env_non_empty(ENV_OPENROUTER_API_KEY),
                env_or(ENV_OPENROUTER_MODEL, DEFAULT_OPENROUTER_MODEL),
                env_or(ENV_OPENROUTER_API_BASE, DEFAULT_OPENROUTER_ENDPOINT),
            ),
            ollama,
        ];

        for provider in providers.iter().filter(|p| p.enabled) {
            info!("提供商已启用: {}", provider.display_name());
        }

        let preferred = env_non_empty(ENV_PRIMARY_PROVIDER).and_then(|raw| {
            let parsed = ProviderName::parse(&raw);
            if parsed.is_none() {
                warn!("未知的主提供商名称: {}", raw);
            }
            parsed
        });
        if let Some(name) = preferred {
            let usable = providers.iter().any(|p| p.name == name && p.enabled);
            if !usable {
                warn!("主提供商 {} 未配置凭证，改用第一个可用的提供商", name);
            }
        }

        Self::with_primary(providers, preferred)
    }

    /// 按注册顺序构建，主提供商取第一个可用项
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self::with_primary(providers, None)
    }

    /// 指定首选主提供商构建；首选项不可用时回退到第一个可用项
    pub fn with_primary(providers: Vec<ProviderConfig>, preferred: Option<ProviderName>) -> Self {
        let primary = preferred
            .filter(|name| providers.iter().any(|p| p.name == *name && p.enabled))
            .or_else(|| providers.iter().find(|p| p.enabled).map(|p| p.name));
        ProviderRegistry { providers, primary }
    }

    pub fn get(&self, name: ProviderName) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// 解析后的主提供商配置
    pub fn primary(&self) -> Option<&ProviderConfig> {
        self.primary.and_then(|name| self.get(name))
    }

    /// 按注册顺序遍历可用提供商
    pub fn enabled(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().count()
    }
}

/// 读取环境变量，空白值视为未设置
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_non_empty(key).unwrap_or_else(|| default.to_string())
}
