use thiserror::Error;

/// 错误分类，贯穿网关与适配器两层
///
/// 前四种由单次提供商调用产生，后两种只会出现在网关聚合结果里。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    RateLimited,
    Unreachable,
    Malformed,
    NoProviderConfigured,
    AllProvidersFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Unreachable => "unreachable",
            ErrorKind::Malformed => "malformed",
            ErrorKind::NoProviderConfigured => "no_provider_configured",
            ErrorKind::AllProvidersFailed => "all_providers_failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个提供商适配器的失败结果
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("认证失败: {0}")]
    Unauthorized(String),

    #[error("触发限流: {0}")]
    RateLimited(String),

    #[error("上游不可达: {0}")]
    Unreachable(String),

    #[error("响应格式异常: {0}")]
    Malformed(String),
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Unauthorized(_) => ErrorKind::Unauthorized,
            AdapterError::RateLimited(_) => ErrorKind::RateLimited,
            AdapterError::Unreachable(_) => ErrorKind::Unreachable,
            AdapterError::Malformed(_) => ErrorKind::Malformed,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            AdapterError::Unauthorized(msg)
            | AdapterError::RateLimited(msg)
            | AdapterError::Unreachable(msg)
            | AdapterError::Malformed(msg) => msg,
        }
    }

    /// 根据上游 HTTP 状态码归类错误
    ///
    /// 401/403 视为认证问题，429 视为限流，408 与 5xx 视为上游暂时不可达，
    /// 其余非 2xx 状态一律归为格式异常。
    pub fn from_status(label: &str, status: u16, body: &str) -> Self {
        // 限制错误响应体大小，防止 DoS 攻击
        let body: String = body.chars().take(4096).collect();
        let detail = format!("{} API 错误 ({}): {}", label, status, body);
        match status {
            401 | 403 => AdapterError::Unauthorized(detail),
            429 => AdapterError::RateLimited(detail),
            408 | 500..=599 => AdapterError::Unreachable(detail),
            _ => AdapterError::Malformed(detail),
        }
    }

    /// 归类 reqwest 传输层错误（超时、连接失败、解码失败）
    pub fn from_transport(label: &str, err: reqwest::Error) -> Self {
        if err.is_decode() {
            AdapterError::Malformed(format!("{} 响应解析失败: {}", label, err))
        } else {
            AdapterError::Unreachable(format!("{} 请求失败: {}", label, err))
        }
    }
}

/// 网关自身的基础设施错误（非业务失败）
///
/// 上游调用的失败走 AdapterError，HTTP 层的失败走 hyper 的错误通道，
/// 这里只剩启动阶段真正会发生的两类。
#[derive(Error, Debug)]
pub enum CompassGateError {
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),
}

impl CompassGateError {
    pub fn config(msg: impl Into<String>) -> Self {
        CompassGateError::ConfigError(msg.into())
    }
}
