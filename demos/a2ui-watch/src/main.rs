//! Watch a dashboard from the terminal.
//!
//! Run with: cargo run -p a2ui-watch -- feed
//!       or: cargo run -p a2ui-watch -- session
//!
//! Reads `A2UI_ORIGIN` (default `http://localhost:8000`), and for sessions
//! `A2UI_AGENT_ID` and the optional `A2UI_TOKEN`.

use std::sync::Arc;

use a2ui_core::{
    DataBag, FeedConfig, FeedEvent, Origin, SessionConfig, SessionStatus, traits::LogNavigator,
};
use a2ui_session::{RenderRegistry, SessionController, UiState};
use a2ui_transport::{EventFeedClient, WsConnector};
use anyhow::Context;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ORIGIN: &str = "http://localhost:8000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let origin = std::env::var("A2UI_ORIGIN").unwrap_or_else(|_| DEFAULT_ORIGIN.to_string());
    let origin = Origin::parse(&origin).context("A2UI_ORIGIN is not a valid origin")?;

    match std::env::args().nth(1).as_deref() {
        Some("session") => watch_session(origin).await,
        Some("feed") | None => watch_feed(origin).await,
        Some(other) => anyhow::bail!("Unknown mode {other}, expected feed or session"),
    }
}

async fn watch_feed(origin: Origin) -> anyhow::Result<()> {
    let client = EventFeedClient::new(WsConnector::new(), &FeedConfig::new(origin))?;
    let _subscription = client.subscribe(Arc::new(|event: &FeedEvent| {
        let body = Value::Object(event.fields().clone());
        tracing::info!(kind = event.kind().unwrap_or("?"), "{body}");
    }));

    client.connect();
    tokio::signal::ctrl_c().await?;
    client.disconnect();

    tracing::info!(retained = client.recent().len(), "Feed closed");
    Ok(())
}

async fn watch_session(origin: Origin) -> anyhow::Result<()> {
    let agent_id = std::env::var("A2UI_AGENT_ID").context("A2UI_AGENT_ID is required")?;
    let mut config = SessionConfig::new(origin, agent_id);
    if let Ok(token) = std::env::var("A2UI_TOKEN") {
        config = config.with_token(token);
    }

    let controller = SessionController::websocket(config, Arc::new(LogNavigator))?;
    let renderers = text_renderers();

    let status = controller.connect().await;
    if status != SessionStatus::Connected {
        anyhow::bail!("Session did not connect: {status:?}");
    }

    let mut revision = controller.watch_revision();
    loop {
        tokio::select! {
            changed = revision.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = controller.snapshot();
                log_state(&state, &renderers);
                if !state.status.is_active() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                controller.disconnect();
                break;
            }
        }
    }

    Ok(())
}

fn text_renderers() -> RenderRegistry<String> {
    let field = |data: &DataBag, key: &str| {
        data.get(key)
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .unwrap_or_default()
    };

    RenderRegistry::new()
        .with("card", move |data: &DataBag, _: Option<&DataBag>| {
            format!("[card] {}", field(data, "title"))
        })
        .with("text", move |data: &DataBag, _: Option<&DataBag>| {
            format!("[text] {}", field(data, "content"))
        })
        .with("table", |data: &DataBag, _: Option<&DataBag>| {
            let rows = data.get("rows").and_then(Value::as_array).map_or(0, Vec::len);
            format!("[table] {rows} rows")
        })
}

fn log_state(state: &UiState, renderers: &RenderRegistry<String>) {
    tracing::info!(
        status = ?state.status,
        components = state.components.len(),
        notifications = state.notifications.len(),
        "Session updated"
    );
    for line in renderers.render_snapshot(state) {
        tracing::info!("  {line}");
    }
    if let Some(input) = &state.pending_input {
        tracing::info!(request_id = %input.request_id, "Input requested: {}", input.prompt);
    }
    if let Some(confirm) = &state.pending_confirm {
        tracing::info!(request_id = %confirm.request_id, severity = ?confirm.severity, "Confirmation requested: {}", confirm.title);
    }
    for entry in state.progress.values() {
        match a2ui_core::reconcile::progress_percent(entry) {
            Some(percent) => tracing::info!(task_id = %entry.task_id, "{percent:.0}%"),
            None => tracing::info!(task_id = %entry.task_id, progress_type = ?entry.progress_type, "Working"),
        }
    }
}
