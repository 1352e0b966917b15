pub mod handlers;

use crate::gateway::ChatGateway;
use crate::Result;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// 服务器选项
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// 允许跨域访问的前端来源
    pub cors_origin: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            cors_origin: "http://localhost:5173".to_string(),
        }
    }
}

/// 启动 HTTP 服务器（带优雅关闭）
pub async fn start_server(
    gateway: Arc<ChatGateway>,
    options: ServerOptions,
    addr: SocketAddr,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("CompassGate 服务器运行在 http://{}", addr);

    let options = Arc::new(options);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());

    // 先启动接收循环，再阻塞等待关闭信号
    let server_handle = tokio::spawn(serve_loop(listener, gateway, options, shutdown_rx));

    wait_for_shutdown().await;
    let _ = shutdown_tx.send(());

    // 等待服务器处理完现有连接
    info!("等待现有连接处理完成...");
    if let Err(e) = server_handle.await {
        error!("等待服务器关闭时出错: {}", e);
    }

    info!("服务器已优雅关闭");
    Ok(())
}

/// 接收循环：每个连接交给独立任务处理
async fn serve_loop(
    listener: TcpListener,
    gateway: Arc<ChatGateway>,
    options: Arc<ServerOptions>,
    mut shutdown_rx: tokio::sync::watch::Receiver<()>,
) {
    loop {
        tokio::select! {
            // 等待新连接
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let gateway = Arc::clone(&gateway);
                        let options = Arc::clone(&options);

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let gateway = Arc::clone(&gateway);
                                let options = Arc::clone(&options);
                                handlers::handle_request(req, gateway, options)
                            });

                            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                error!("服务连接错误: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("接受连接失败: {}", e);
                        break;
                    }
                }
            }
            // 等待关闭信号
            _ = shutdown_rx.changed() => {
                info!("收到关闭信号，停止接受新连接");
                break;
            }
        }
    }
}

/// 阻塞等待 SIGTERM 或 Ctrl+C
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let sigterm = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("设置 SIGTERM 信号处理失败")
                .recv()
                .await;
        };

        let sigint = async {
            signal::ctrl_c().await.expect("设置 Ctrl+C 信号处理失败");
        };

        tokio::select! {
            _ = sigterm => {
                warn!("收到 SIGTERM 信号，开始优雅关闭...");
            }
            _ = sigint => {
                warn!("收到 Ctrl+C 信号，开始优雅关闭...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.expect("设置 Ctrl+C 信号处理失败");
        warn!("收到 Ctrl+C 信号，开始优雅关闭...");
    }
}

/// 启动 HTTP 服务器（仅用于测试，不监听关闭信号）
pub async fn start_server_test(
    gateway: Arc<ChatGateway>,
    options: ServerOptions,
    addr: SocketAddr,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("CompassGate 测试服务器运行在 http://{}", addr);

    let options = Arc::new(options);
    loop {
        let (stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("接受连接失败: {}", e);
                continue;
            }
        };

        let io = TokioIo::new(stream);
        let gateway = Arc::clone(&gateway);
        let options = Arc::clone(&options);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let gateway = Arc::clone(&gateway);
                let options = Arc::clone(&options);
                handlers::handle_request(req, gateway, options)
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("服务连接错误: {}", e);
            }
        });
    }
}
