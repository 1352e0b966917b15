use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 简单的指标收集器
#[derive(Debug, Default)]
pub struct Metrics {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    fallback_requests: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录成功请求
    pub fn record_success(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录失败请求
    pub fn record_failure(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次回退成功（首选提供商失败后由备选完成）
    pub fn record_fallback(&self) {
        self.fallback_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// 导出 Prometheus 格式
    pub fn export_prometheus(&self) -> String {
        format!(
            "# HELP compassgate_requests_total Total number of chat requests\n\
             # TYPE compassgate_requests_total counter\n\
             compassgate_requests_total {}\n\
             # HELP compassgate_requests_successful Successful chat requests\n\
             # TYPE compassgate_requests_successful counter\n\
             compassgate_requests_successful {}\n\
             # HELP compassgate_requests_failed Failed chat requests\n\
             # TYPE compassgate_requests_failed counter\n\
             compassgate_requests_failed {}\n\
             # HELP compassgate_requests_fallback Requests answered by a fallback provider\n\
             # TYPE compassgate_requests_fallback counter\n\
             compassgate_requests_fallback {}\n",
            self.total_requests.load(Ordering::Relaxed),
            self.successful_requests.load(Ordering::Relaxed),
            self.failed_requests.load(Ordering::Relaxed),
            self.fallback_requests.load(Ordering::Relaxed)
        )
    }
}

/// 获取全局指标实例
pub fn global_metrics() -> &'static Arc<Metrics> {
    use once_cell::sync::Lazy;
    static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| Arc::new(Metrics::new()));
    &METRICS
}
