use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::signal;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, categories, contents};

pub fn build_app(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout();

    let admin = Router::new()
        .merge(auth::me_router())
        .merge(categories::router())
        .merge(contents::router());

    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .route("/health", get(|| async { "ok" }))
                .nest("/admin", admin),
        )
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        store.seed_user("Admin", "admin@mail.com", "admin123");
        (build_app(AppState::fake_with(store.clone())), store)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        req.body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn login(app: &Router) -> String {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/login",
                None,
                json!({"email": "admin@mail.com", "password": "admin123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let v: Value = serde_json::from_slice(&body).unwrap();
        v["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _) = app();
        let (status, body) = send(&app, bare_request("GET", "/api/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn admin_routes_reject_missing_or_bad_tokens_before_the_store() {
        let (app, store) = app();
        let before = store.touches();

        let (status, body) = send(&app, bare_request("GET", "/api/admin/categories", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert!(v["error"].is_string());

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/categories",
                Some("not.a.jwt"),
                json!({"title": "Tech"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(store.touches(), before);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (app, _) = app();
        let wrong_password = send(
            &app,
            json_request(
                "POST",
                "/api/login",
                None,
                json!({"email": "admin@mail.com", "password": "wrong-pass"}),
            ),
        )
        .await;
        let unknown_email = send(
            &app,
            json_request(
                "POST",
                "/api/login",
                None,
                json!({"email": "ghost@mail.com", "password": "admin123"}),
            ),
        )
        .await;
        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password, unknown_email);
    }

    #[tokio::test]
    async fn category_lifecycle_through_http() {
        let (app, _) = app();
        let token = login(&app).await;

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/categories",
                Some(&token),
                json!({"title": "Tech News"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(created["slug"], "tech-news");
        assert_eq!(created["created_by_name"], "Admin");
        let id = created["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/contents",
                Some(&token),
                json!({"title": "Hello", "category_id": id, "tags": [" a ", ""]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let content: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(content["status"], "draft");
        assert_eq!(content["tags"], json!(["a"]));
        assert_eq!(content["category_title"], "Tech News");

        let (status, body) = send(
            &app,
            bare_request("DELETE", &format!("/api/admin/categories/{id}"), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert!(v["error"].as_str().unwrap().contains("referenced"));

        let (status, body) = send(
            &app,
            bare_request("GET", "/api/admin/categories", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let list: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.as_array().unwrap().len(), 1);

        let content_id = content["id"].as_i64().unwrap();
        let (status, _) = send(
            &app,
            bare_request("DELETE", &format!("/api/admin/contents/{content_id}"), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &app,
            bare_request("DELETE", &format!("/api/admin/categories/{id}"), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &app,
            bare_request("GET", &format!("/api/admin/categories/{id}"), Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn me_returns_the_caller() {
        let (app, _) = app();
        let token = login(&app).await;
        let (status, body) = send(&app, bare_request("GET", "/api/admin/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["email"], "admin@mail.com");
        assert!(v.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn image_upload_returns_public_url() {
        let (app, _) = app();
        let token = login(&app).await;

        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             PNGDATA\r\n\
             --{boundary}--\r\n"
        );
        let req = Request::builder()
            .method("POST")
            .uri("/api/admin/contents/upload-image")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        let v: Value = serde_json::from_slice(&body).unwrap();
        let url = v["url"].as_str().unwrap();
        assert!(url.starts_with("https://cdn.fake.local/contents/"));
        assert!(url.ends_with(".png"));
    }
}
