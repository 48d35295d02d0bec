//! End-to-end dispatch through the router, without a socket.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use plant::app::AppError;
use plant::http::SERVER_NAME;
use plant::{Application, BoxError, Context, HttpServer, Instance, Job, Middleware, Next, Routes};

mod common;

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn user_routes() -> Routes {
    Routes::new()
        .get("/users/:id", |ctx, _app| {
            Box::pin(async move {
                let id = ctx.param("id").unwrap_or_default().to_string();
                let x = ctx.query_param("x").unwrap_or_default();
                ctx.set_body(format!("user {id} x={x}"));
                Ok(())
            })
        })
        .get("/status", |ctx, _app| {
            Box::pin(async move {
                ctx.set_body(json!({ "ok": true }));
                Ok(())
            })
        })
        .get("/broken", |_ctx, _app| {
            Box::pin(async move { Err(BoxError::from("database password=hunter2 rejected")) })
        })
        .get("/partial", |ctx, _app| {
            Box::pin(async move {
                ctx.set_status(StatusCode::CREATED);
                ctx.set_body("partial");
                Err(BoxError::from("failed halfway"))
            })
        })
        .post("/echo", |ctx, _app| {
            Box::pin(async move {
                let body = ctx.body_bytes().await?.unwrap_or_default();
                ctx.set_body(body);
                Ok(())
            })
        })
}

fn server(app: Application) -> HttpServer {
    HttpServer::new(app)
}

#[tokio::test]
async fn test_dynamic_route_with_query() {
    let app = Application::builder(common::test_config())
        .routes(user_routes())
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::GET, "/users/42?x=1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::SERVER], SERVER_NAME);
    assert_eq!(common::body_string(response).await, "user 42 x=1");
}

#[tokio::test]
async fn test_unmatched_route_is_404() {
    let app = Application::builder(common::test_config())
        .routes(user_routes())
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::DELETE, "/missing"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[header::SERVER], SERVER_NAME);
    assert_eq!(common::body_string(response).await, "Not Found");
}

#[tokio::test]
async fn test_method_must_match() {
    let app = Application::builder(common::test_config())
        .routes(user_routes())
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::POST, "/users/42"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_json_body() {
    let app = Application::builder(common::test_config())
        .routes(user_routes())
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::GET, "/status"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body: serde_json::Value =
        serde_json::from_str(&common::body_string(response).await).unwrap();
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_handler_error_is_opaque_500() {
    let app = Application::builder(common::test_config())
        .routes(user_routes())
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::GET, "/broken"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::body_string(response).await;
    assert_eq!(body, "Internal Server Error");
    assert!(!body.contains("hunter2"));
}

#[tokio::test]
async fn test_handler_error_logged_in_full() {
    let logs = common::LogCapture::new();
    let _guard = tracing::subscriber::set_default(logs.subscriber());

    let app = Application::builder(common::test_config())
        .routes(user_routes())
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::GET, "/broken"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!common::body_string(response).await.contains("hunter2"));

    let output = logs.contents();
    assert!(output.contains("Handler failed"), "logs: {output}");
    assert!(output.contains("database password=hunter2 rejected"), "logs: {output}");
    assert!(output.contains("/broken"), "logs: {output}");
}

#[tokio::test]
async fn test_handler_error_discards_partial_response() {
    let app = Application::builder(common::test_config())
        .routes(user_routes())
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::GET, "/partial"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(common::body_string(response).await, "Internal Server Error");
}

#[tokio::test]
async fn test_post_body_echo() {
    let app = Application::builder(common::test_config())
        .routes(user_routes())
        .build()
        .unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .body(Body::from("ping"))
        .unwrap();
    let response = server(app).router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
    assert_eq!(common::body_string(response).await, "ping");
}

#[tokio::test]
async fn test_request_id_propagated() {
    let app = Application::builder(common::test_config())
        .routes(user_routes())
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::GET, "/status"))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

/// Rejects every request without calling `next`.
struct Deny;

#[async_trait]
impl Middleware for Deny {
    async fn handle(&self, ctx: &mut Context, _next: Next<'_>) -> Result<(), BoxError> {
        ctx.set_status(StatusCode::UNAUTHORIZED);
        ctx.set_body("denied");
        Ok(())
    }
}

#[tokio::test]
async fn test_short_circuit_skips_dispatch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handler_calls = calls.clone();

    let app = Application::builder(common::test_config())
        .middleware(Deny)
        .routes(Routes::new().get("/secret", move |ctx, _app| {
            handler_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                ctx.set_body("secret");
                Ok(())
            })
        }))
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::GET, "/secret"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::body_string(response).await, "denied");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Sets a header on the way in and the status on the way out.
struct Tag;

#[async_trait]
impl Middleware for Tag {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), BoxError> {
        ctx.response_headers_mut()
            .insert("x-tag", "outer".parse().unwrap());
        next.run(ctx).await?;
        ctx.set_status(StatusCode::ACCEPTED);
        Ok(())
    }
}

#[tokio::test]
async fn test_completed_chain_then_dispatch() {
    let app = Application::builder(common::test_config())
        .middleware(Tag)
        .routes(user_routes())
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::GET, "/users/7"))
        .await
        .unwrap();

    // The handler runs after the chain has returned.
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()["x-tag"], "outer");
    assert_eq!(common::body_string(response).await, "user 7 x=");
}

struct Twice;

#[async_trait]
impl Middleware for Twice {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), BoxError> {
        next.run(ctx).await?;
        // Swallow the violation; it must still fail the request.
        let _ = next.run(ctx).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_double_next_is_500() {
    let app = Application::builder(common::test_config())
        .middleware(Twice)
        .routes(user_routes())
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::GET, "/users/1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

struct Database {
    url: String,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Instance for Database {
    async fn close(&self) -> Result<(), BoxError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct Mailer;

impl Mailer {
    fn sender(&self) -> &'static str {
        "noreply@example.com"
    }
}

#[tokio::test]
async fn test_handlers_reach_instances_and_services() {
    let app = Application::builder(common::test_config())
        .instance(
            "db",
            Database {
                url: "mem://".to_string(),
                closed: Arc::new(AtomicBool::new(false)),
            },
        )
        .service("mailer", Mailer)
        .routes(Routes::new().get("/info", |ctx, app| {
            Box::pin(async move {
                let db = app.instance::<Database>("db")?;
                let mailer = app.service::<Mailer>("mailer")?;
                ctx.set_body(format!("{} {}", db.url, mailer.sender()));
                Ok(())
            })
        }))
        .build()
        .unwrap();

    let response = server(app)
        .router()
        .oneshot(request(Method::GET, "/info"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::body_string(response).await,
        "mem:// noreply@example.com"
    );
}

struct Count {
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl Job for Count {
    async fn run(&self, app: &Application) -> Result<(), BoxError> {
        app.instance::<Database>("db")?;
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_run_job_closes_instances() {
    let closed = Arc::new(AtomicBool::new(false));
    let runs = Arc::new(AtomicUsize::new(0));

    let app = Application::builder(common::test_config())
        .instance(
            "db",
            Database {
                url: "mem://".to_string(),
                closed: closed.clone(),
            },
        )
        .job("count", Count { runs: runs.clone() })
        .build()
        .unwrap();

    assert_eq!(app.job_names().collect::<Vec<_>>(), ["count"]);
    app.run_job("count").await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_unknown_job() {
    let app = Application::builder(common::test_config())
        .build()
        .unwrap();

    assert!(matches!(
        app.run_job("nope").await,
        Err(AppError::JobNotFound(name)) if name == "nope"
    ));
}

#[tokio::test]
async fn test_duplicate_job_rejected() {
    let runs = Arc::new(AtomicUsize::new(0));
    let result = Application::builder(common::test_config())
        .job("count", Count { runs: runs.clone() })
        .job("count", Count { runs })
        .build();

    assert!(matches!(result, Err(AppError::DuplicateJob(_))));
}

#[tokio::test]
async fn test_duplicate_static_route_rejected() {
    let routes = Routes::new()
        .get("/a", |_ctx, _app| Box::pin(async move { Ok(()) }))
        .get("/a", |_ctx, _app| Box::pin(async move { Ok(()) }));

    let result = Application::builder(common::test_config())
        .routes(routes)
        .build();

    assert!(matches!(result, Err(AppError::Route(_))));
}
