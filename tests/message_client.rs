//! Tests for `HttpMessageClient` against a fake backend served by axum.

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use mental_coach::client::{ClientError, HttpMessageClient, MessageClient, UNREACHABLE_MESSAGE};
use mental_coach::config::ClientConfig;
use mental_coach::transcript::{ERROR_PREFIX, ExchangeState, Role, TranscriptView};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

async fn spawn_backend(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    Url::parse(&format!("http://{addr}")).expect("url")
}

fn client_for(base: &Url) -> HttpMessageClient {
    let config = ClientConfig::new().with_api_url(base.as_str());
    HttpMessageClient::new(&config).expect("client")
}

fn replying(status: StatusCode, body: &'static str) -> Router {
    Router::new().route(
        "/api/chat",
        post(move || async move { (status, [(header::CONTENT_TYPE, "application/json")], body) }),
    )
}

#[tokio::test]
async fn success_reply_is_returned() {
    let base = spawn_backend(replying(StatusCode::OK, r#"{"reply":"Great to hear!"}"#)).await;
    let client = client_for(&base);

    let reply = client.send("I slept well").await.expect("reply");
    assert_eq!(reply.reply, "Great to hear!");
}

#[tokio::test]
async fn request_carries_message_and_no_cache_headers() {
    let router = Router::new().route(
        "/api/chat",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            let get = |name: header::HeaderName| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            };
            let reply = format!(
                "{}|{}|{}|{}|{}",
                body["message"].as_str().unwrap_or_default(),
                get(header::CONTENT_TYPE),
                get(header::CACHE_CONTROL),
                get(header::PRAGMA),
                get(header::EXPIRES),
            );
            Json(json!({ "reply": reply }))
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let reply = client.send("hello").await.expect("reply");
    assert_eq!(
        reply.reply,
        "hello|application/json|no-cache, no-store, must-revalidate|no-cache|0"
    );
}

#[tokio::test]
async fn explicit_base_with_trailing_slash() {
    let base = spawn_backend(replying(StatusCode::OK, r#"{"reply":"ok"}"#)).await;
    let config = ClientConfig::new().with_api_url(format!("{}/", base.as_str().trim_end_matches('/')));
    let client = HttpMessageClient::new(&config).expect("client");

    assert_eq!(client.endpoint().path(), "/api/chat");
    assert_eq!(client.send("hi").await.expect("reply").reply, "ok");
}

#[tokio::test]
async fn server_error_detail_is_extracted() {
    let base = spawn_backend(replying(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"detail":"model unavailable"}"#,
    ))
    .await;
    let client = client_for(&base);

    let err = client.send("hello").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "model unavailable");
}

#[tokio::test]
async fn message_field_is_secondary() {
    let base = spawn_backend(replying(StatusCode::BAD_REQUEST, r#"{"message":"too long"}"#)).await;
    let client = client_for(&base);

    let err = client.send("hello").await.unwrap_err();
    assert_eq!(err.to_string(), "too long");
}

#[tokio::test]
async fn non_json_error_uses_status_line() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream down") }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let err = client.send("hello").await.unwrap_err();
    assert_eq!(err.to_string(), "Service Unavailable");
}

#[tokio::test]
async fn truncated_error_body_falls_back_to_status_line() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async {
            let chunks: Vec<Result<&'static str, std::io::Error>> = vec![
                Ok("{\"detail\":"),
                Err(std::io::Error::other("connection reset")),
            ];
            let body = futures::stream::iter(chunks).then(|chunk| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                chunk
            });
            (StatusCode::BAD_GATEWAY, Body::from_stream(body))
        }),
    );
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let err = client.send("hello").await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), "Bad Gateway");
}

#[tokio::test]
async fn malformed_success_body_is_reported() {
    let router = Router::new().route("/api/chat", post(|| async { "definitely not json" }));
    let base = spawn_backend(router).await;
    let client = client_for(&base);

    let err = client.send("hello").await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedReply(_)), "got: {err:?}");
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("local addr").port()
    };
    let base = Url::parse(&format!("http://127.0.0.1:{port}")).expect("url");
    let client = client_for(&base);

    let err = client.send("hello").await.unwrap_err();
    assert!(err.is_unreachable());
    assert_eq!(err.to_string(), UNREACHABLE_MESSAGE);
}

#[tokio::test]
async fn view_turns_follow_backend_outcomes() {
    let ok = spawn_backend(replying(StatusCode::OK, r#"{"reply":"Great to hear!"}"#)).await;
    let failing = spawn_backend(replying(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"detail":"model unavailable"}"#,
    ))
    .await;

    let mut view = TranscriptView::new();
    view.mount();

    let state = view.submit("Feeling better", &client_for(&ok)).await;
    assert_eq!(state, Some(ExchangeState::Succeeded));
    assert_eq!(view.turns().len(), 3);
    assert_eq!(view.turns()[2].content(), "Great to hear!");

    let state = view.submit("And now?", &client_for(&failing)).await;
    assert_eq!(state, Some(ExchangeState::Failed));
    assert_eq!(view.turns().len(), 5);
    let last = &view.turns()[4];
    assert_eq!(last.role(), Role::Assistant);
    assert_eq!(last.content(), format!("{ERROR_PREFIX}model unavailable"));
}
