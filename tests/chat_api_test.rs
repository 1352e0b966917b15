use compassgate::config::{ProviderConfig, ProviderName, ProviderRegistry};
use compassgate::gateway::ChatGateway;
use compassgate::server::{self, ServerOptions};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn enabled(name: ProviderName, endpoint: &str) -> ProviderConfig {
    match name {
        ProviderName::Ollama => ProviderConfig::local(name, "llama2", endpoint),
        _ => ProviderConfig::keyed(name, Some("test-key".to_string()), "test-model", endpoint),
    }
}

fn disabled(name: ProviderName) -> ProviderConfig {
    ProviderConfig::keyed(name, None, "test-model", "http://localhost:9999")
}

/// 启动测试服务器并等待就绪
async fn spawn_server(port: u16, registry: ProviderRegistry) -> String {
    let gateway = Arc::new(ChatGateway::new(Arc::new(registry)));
    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();

    tokio::spawn(async move {
        let _ = server::start_server_test(gateway, ServerOptions::default(), addr).await;
    });

    // 等待服务器启动
    tokio::time::sleep(Duration::from_millis(300)).await;
    format!("http://127.0.0.1:{}", port)
}

async fn post_chat(base: &str, body: serde_json::Value) -> reqwest::Response {
    let client = reqwest::Client::new();
    timeout(
        Duration::from_secs(5),
        client.post(format!("{}/api/chat", base)).json(&body).send(),
    )
    .await
    .expect("请求超时")
    .expect("请求失败")
}

#[tokio::test]
async fn test_chat_success_end_to_end() {
    let mut upstream = mockito::Server::new_async().await;
    let mock = upstream
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(r#"{"model": "llama2", "response": "做你热爱的事", "done": true}"#)
        .create_async()
        .await;

    let base = spawn_server(
        18180,
        ProviderRegistry::new(vec![enabled(ProviderName::Ollama, &upstream.url())]),
    )
    .await;

    let response = post_chat(&base, serde_json::json!({"message": "职业建议？"})).await;
    assert_eq!(response.status(), 200);

    // 每个响应都带请求 ID 与 CORS 头
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:5173"
    );

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["reply"], "做你热爱的事");
    assert_eq!(body["provider"], "ollama");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_falls_back_to_primary() {
    let mut google_upstream = mockito::Server::new_async().await;
    let google_mock = google_upstream
        .mock("POST", "/v1beta/models/test-model:generateContent")
        .with_status(429)
        .with_body(r#"{"error": {"message": "quota exceeded"}}"#)
        .create_async()
        .await;

    let mut openai_upstream = mockito::Server::new_async().await;
    let openai_mock = openai_upstream
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "备选回答"}}]}"#)
        .create_async()
        .await;

    let registry = ProviderRegistry::with_primary(
        vec![
            enabled(ProviderName::Google, &google_upstream.url()),
            enabled(ProviderName::OpenAi, &openai_upstream.url()),
        ],
        Some(ProviderName::OpenAi),
    );
    let base = spawn_server(18181, registry).await;

    let response = post_chat(
        &base,
        serde_json::json!({"message": "你好", "provider": "google"}),
    )
    .await;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["reply"], "备选回答");
    assert_eq!(body["provider"], "openai");

    google_mock.assert_async().await;
    openai_mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_all_providers_failed() {
    let mut google_upstream = mockito::Server::new_async().await;
    let google_mock = google_upstream
        .mock("POST", "/v1beta/models/test-model:generateContent")
        .with_status(503)
        .with_body(r#"{"error": {"message": "unavailable"}}"#)
        .create_async()
        .await;

    let mut openai_upstream = mockito::Server::new_async().await;
    let openai_mock = openai_upstream
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("server error")
        .create_async()
        .await;

    let registry = ProviderRegistry::with_primary(
        vec![
            enabled(ProviderName::Google, &google_upstream.url()),
            enabled(ProviderName::OpenAi, &openai_upstream.url()),
        ],
        Some(ProviderName::OpenAi),
    );
    let base = spawn_server(18182, registry).await;

    let response = post_chat(
        &base,
        serde_json::json!({"message": "你好", "provider": "google"}),
    )
    .await;
    assert_eq!(response.status(), 502);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("所有候选提供商"));
    assert_eq!(body["attempted"], serde_json::json!(["google", "openai"]));

    google_mock.assert_async().await;
    openai_mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_single_provider_failed() {
    let mut upstream = mockito::Server::new_async().await;
    let mock = upstream
        .mock("POST", "/api/generate")
        .with_status(500)
        .with_body(r#"{"error": "llama runner crashed"}"#)
        .expect(1)
        .create_async()
        .await;

    // 注册表里只有一个可用提供商，失败后 attempted 只含它自己
    let base = spawn_server(
        18187,
        ProviderRegistry::new(vec![enabled(ProviderName::Ollama, &upstream.url())]),
    )
    .await;

    let response = post_chat(&base, serde_json::json!({"message": "你好"})).await;
    assert_eq!(response.status(), 502);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("所有候选提供商"));
    assert_eq!(body["attempted"], serde_json::json!(["ollama"]));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_chat_no_provider_configured() {
    let registry = ProviderRegistry::new(vec![
        disabled(ProviderName::Google),
        disabled(ProviderName::OpenAi),
    ]);
    let base = spawn_server(18183, registry).await;

    let response = post_chat(&base, serde_json::json!({"message": "你好"})).await;
    assert_eq!(response.status(), 503);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("未配置"));
    assert!(body["attempted"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_invalid_request() {
    let registry = ProviderRegistry::new(vec![disabled(ProviderName::Google)]);
    let base = spawn_server(18184, registry).await;

    // 缺少 message 字段
    let response = post_chat(&base, serde_json::json!({"note": "hi"})).await;
    assert_eq!(response.status(), 400);

    // message 为空白
    let response = post_chat(&base, serde_json::json!({"message": "   "})).await;
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("message"));
    assert!(body["attempted"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_info_endpoints() {
    let registry = ProviderRegistry::new(vec![
        enabled(ProviderName::Google, "http://localhost:9999"),
        disabled(ProviderName::OpenAi),
    ]);
    let base = spawn_server(18185, registry).await;
    let client = reqwest::Client::new();

    // 根路径欢迎页
    let response = client.get(&base).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Welcome to the LifeCompass AI Backend!");

    // 健康检查
    let response = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // 提供商状态
    let response = client
        .get(format!("{}/api/providers", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total_configured"], 1);
    assert_eq!(body["primary_provider"], "google");
    assert_eq!(body["configured_providers"][0]["name"], "Google Gemini");
    assert_eq!(body["available_providers"].as_array().unwrap().len(), 6);

    // 指标
    let response = client
        .get(format!("{}/metrics", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let text = response.text().await.unwrap();
    assert!(text.contains("compassgate_requests_total"));

    // 未知路径
    let response = client
        .get(format!("{}/does-not-exist", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_cors_preflight() {
    let registry = ProviderRegistry::new(vec![disabled(ProviderName::Google)]);
    let base = spawn_server(18186, registry).await;

    let client = reqwest::Client::new();
    let response = client
        .request(reqwest::Method::OPTIONS, format!("{}/api/chat", base))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-methods")
            .unwrap(),
        "GET, POST, OPTIONS"
    );
}
