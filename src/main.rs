use clap::Parser;
use compassgate::config::ProviderRegistry;
use compassgate::gateway::ChatGateway;
use compassgate::server::{self, ServerOptions};
use compassgate::CompassGateError;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "compassgate")]
#[command(about = "LifeCompass AI 提供商网关", long_about = None)]
struct Args {
    /// 监听地址
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// 允许跨域访问的前端来源
    #[arg(long, default_value = "http://localhost:5173")]
    cors_origin: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // 解析命令行参数
    let args = Args::parse();

    // 从环境变量构建提供商注册表，零凭证不阻止启动
    let registry = ProviderRegistry::from_env();
    match registry.primary() {
        Some(primary) => info!(
            "已启用 {} 个提供商，主提供商: {}",
            registry.enabled_count(),
            primary.name
        ),
        None => warn!("未检测到任何 AI 提供商凭证，聊天请求将返回配置错误"),
    }

    let gateway = Arc::new(ChatGateway::new(Arc::new(registry)));

    // 解析监听地址
    let addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|_| CompassGateError::config(format!("监听地址格式无效: {}", args.bind)))?;

    // 启动服务器
    let options = ServerOptions {
        cors_origin: args.cors_origin,
    };
    server::start_server(gateway, options, addr).await?;

    Ok(())
}
