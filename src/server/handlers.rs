use crate::error::ErrorKind;
use crate::gateway::ChatGateway;
use crate::metrics;
use crate::types::{ChatRequest, ChatResult};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::ServerOptions;

// 统一的 Body 类型
type BoxError = Box<dyn std::error::Error + Send + Sync>;
type BoxBody = http_body_util::combinators::BoxBody<Bytes, BoxError>;

/// 处理 HTTP 请求的主路由
///
/// 每个响应都带 x-request-id 与 CORS 头，便于前端与日志对账。
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    gateway: Arc<ChatGateway>,
    options: Arc<ServerOptions>,
) -> Result<Response<BoxBody>, BoxError> {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = match (&method, path.as_str()) {
        (&Method::GET, "/") => welcome(),
        (&Method::GET, "/health") => health_check(),
        (&Method::GET, "/api/providers") => providers_status(gateway)?,
        (&Method::GET, "/metrics") => metrics_endpoint(),
        (&Method::OPTIONS, _) => preflight(),
        (&Method::POST, "/api/chat") => chat(req, gateway).await?,
        _ => not_found(),
    };

    let headers = response.headers_mut();
    if let Ok(origin) = HeaderValue::from_str(&options.cors_origin) {
        headers.insert("Access-Control-Allow-Origin", origin);
        headers.insert(
            "Access-Control-Allow-Credentials",
            HeaderValue::from_static("true"),
        );
    }
    headers.insert("x-request-id", HeaderValue::from_str(&request_id.to_string())?);

    debug!(
        "[{}] {} {} -> {}",
        request_id,
        method,
        path,
        response.status().as_u16()
    );
    Ok(response)
}

fn full(body: impl Into<Bytes>) -> BoxBody {
    Full::new(body.into())
        .map_err(|e| Box::new(e) as BoxError)
        .boxed()
}

fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<BoxBody> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(full(body.to_string()))
        .unwrap()
}

/// 根路径欢迎页
fn welcome() -> Response<BoxBody> {
    let body = json!({
        "message": "Welcome to the LifeCompass AI Backend!"
    });
    json_response(StatusCode::OK, &body)
}

/// 健康检查端点
fn health_check() -> Response<BoxBody> {
    let body = json!({
        "status": "ok",
        "service": "compassgate"
    });
    json_response(StatusCode::OK, &body)
}

/// 提供商状态端点
fn providers_status(gateway: Arc<ChatGateway>) -> Result<Response<BoxBody>, BoxError> {
    let body = serde_json::to_value(gateway.status())?;
    Ok(json_response(StatusCode::OK, &body))
}

/// 指标端点
fn metrics_endpoint() -> Response<BoxBody> {
    let metrics = metrics::global_metrics();
    let body = metrics.export_prometheus();

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/plain")
        .body(full(body))
        .unwrap()
}

/// CORS 预检响应，Allow-Origin 由统一出口补上
fn preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .header("Access-Control-Max-Age", "86400")
        .body(full(""))
        .unwrap()
}

/// 聊天端点
async fn chat(
    req: Request<hyper::body::Incoming>,
    gateway: Arc<ChatGateway>,
) -> Result<Response<BoxBody>, BoxError> {
    let metrics = metrics::global_metrics();

    // 读取请求体
    let whole_body = req.collect().await?.to_bytes();
    let chat_req: ChatRequest = match serde_json::from_slice(&whole_body) {
        Ok(parsed) => parsed,
        Err(e) => return Ok(invalid_request(format!("请求体解析失败: {}", e))),
    };

    // 验证请求参数
    if let Err(e) = chat_req.validate() {
        return Ok(invalid_request(e));
    }

    match gateway.send(&chat_req).await {
        ChatResult::Success {
            reply,
            provider,
            latency_ms,
        } => {
            metrics.record_success();
            info!("聊天请求完成: provider={} latency={}ms", provider, latency_ms);
            let body = json!({
                "reply": reply,
                "provider": provider.as_str()
            });
            Ok(json_response(StatusCode::OK, &body))
        }
        ChatResult::Failure {
            kind,
            message,
            attempted,
        } => {
            metrics.record_failure();
            let status = match kind {
                ErrorKind::NoProviderConfigured => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            };
            let attempted_names: Vec<&str> =
                attempted.iter().map(|a| a.provider.as_str()).collect();
            let body = json!({
                "error": message,
                "attempted": attempted_names
            });
            Ok(json_response(status, &body))
        }
    }
}

/// 400 响应，与其他错误共用 {error, attempted} 结构
fn invalid_request(message: impl Into<String>) -> Response<BoxBody> {
    let body = json!({
        "error": message.into(),
        "attempted": []
    });
    json_response(StatusCode::BAD_REQUEST, &body)
}

/// 404 响应
fn not_found() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(full("Not Found"))
        .unwrap()
}
