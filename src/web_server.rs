use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Request, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    serve, Json, Router,
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde_json::{json, Value};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    actions::{ActionReply, Actions},
    config::Config,
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    actions: Actions,
    model: String,
}

// Minijinja Environment setup
fn create_minijinja_env(template_dir: String) -> AutoReloader {
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(template_dir.clone()));
        // Watch the templates directory for changes
        notifier.watch_path(&template_dir, true);
        Ok(env)
    })
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    // Acquire env, get template, and render within the same block
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                tmpl.render(minijinja::context! {
                    title => "Carmate AI Assistant",
                    model => &state.model,
                })
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })
}

// Action endpoints read the raw body so that even a non-JSON request gets an
// ActionReply; the flows' schemas decide what is acceptable, and every outcome
// is a 200.
async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Json<ActionReply> {
    Json(state.actions.chat_body(&body).await)
}

async fn feedback_handler(State(state): State<AppState>, body: Bytes) -> Json<ActionReply> {
    Json(state.actions.feedback_body(&body).await)
}

async fn car_description_handler(State(state): State<AppState>, body: Bytes) -> Json<ActionReply> {
    Json(state.actions.car_description_body(&body).await)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the router. Split from [`start_web_server`] so tests can drive it
/// without binding a port.
pub fn router(actions: Actions, config: &Config) -> Router {
    let state = AppState {
        templates: Arc::new(create_minijinja_env(config.template_dir.clone())),
        actions,
        model: config.model.clone(),
    };

    // Serve static files from the configured directory
    let static_files_service = ServeDir::new(&config.static_dir).not_found_service(tower::service_fn(|_req: Request| async {
        Ok::<_, Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
    }));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/feedback", post(feedback_handler))
        .route("/api/car-description", post(car_description_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(host: &str, port: u16, actions: Actions, config: &Config) -> Result<()> {
    let app = router(actions, config);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context(format!("Invalid listen address {}:{}", host, port))?;
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
