//! Demo application served by the `plant` binary.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use serde_json::json;

use plant::app::{AppError, Application, Instance, Job};
use plant::config::PlantConfig;
use plant::http::{Context, ResponseBody};
use plant::middleware::{Middleware, Next};
use plant::routing::Routes;
use plant::BoxError;

/// Process start time, closed with a log line on shutdown.
struct Clock {
    started: Instant,
}

#[async_trait]
impl Instance for Clock {
    async fn close(&self) -> Result<(), BoxError> {
        tracing::info!(uptime = ?self.started.elapsed(), "Clock closed");
        Ok(())
    }
}

struct Greeter {
    greeting: String,
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {}!", self.greeting, name)
    }
}

/// Logs one line per request with its latency.
struct AccessLog;

#[async_trait]
impl Middleware for AccessLog {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), BoxError> {
        let start = Instant::now();
        let result = next.run(ctx).await;
        tracing::info!(
            method = %ctx.method(),
            url = %ctx.url(),
            elapsed = ?start.elapsed(),
            "Request"
        );
        result
    }
}

struct GreetJob;

#[async_trait]
impl Job for GreetJob {
    async fn run(&self, app: &Application) -> Result<(), BoxError> {
        let greeter = app.service::<Greeter>("greeter")?;
        tracing::info!(message = %greeter.greet("job"), "Greeting");
        Ok(())
    }
}

fn routes() -> Routes {
    Routes::new()
        .get("/", |ctx, _app| {
            Box::pin(async move {
                ctx.set_body("plant is running");
                Ok(())
            })
        })
        .get("/health", |ctx, app| {
            Box::pin(async move {
                let clock = app.instance::<Clock>("clock")?;
                ctx.set_body(json!({
                    "ok": true,
                    "env": app.config().env,
                    "uptime_secs": clock.started.elapsed().as_secs(),
                }));
                Ok(())
            })
        })
        .get("/hello/:name", |ctx, app| {
            Box::pin(async move {
                let greeter = app.service::<Greeter>("greeter")?;
                let name = ctx.param_decoded("name").unwrap_or_default().into_owned();
                ctx.set_body(greeter.greet(&name));
                Ok(())
            })
        })
        .post("/echo", |ctx, _app| {
            Box::pin(async move {
                let body = ctx.body_bytes().await?.unwrap_or_default();
                if let Some(content_type) = ctx.headers().get("content-type") {
                    let content_type = content_type.to_str()?.to_string();
                    ctx.set_content_type(content_type);
                }
                ctx.set_body(body);
                Ok(())
            })
        })
        .get("/countdown", |ctx, _app| {
            Box::pin(async move {
                let ticks = stream::iter((1..=3).rev()).then(|n| async move {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok::<_, std::io::Error>(Bytes::from(format!("{n}\n")))
                });
                ctx.set_content_type("text/plain; charset=utf-8");
                ctx.set_body(ResponseBody::stream(ticks));
                Ok(())
            })
        })
}

/// Build the demo application.
pub fn application(config: PlantConfig) -> Result<Application, AppError> {
    let greeting = config
        .setting::<String>("greeting")?
        .unwrap_or_else(|| "Hello".to_string());

    Application::builder(config)
        .middleware(AccessLog)
        .instance(
            "clock",
            Clock {
                started: Instant::now(),
            },
        )
        .service("greeter", Greeter { greeting })
        .job("greet", GreetJob)
        .routes(routes())
        .build()
}
