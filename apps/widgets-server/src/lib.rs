//! Demo HTTP service exposing an in-memory widget collection through the
//! `resty-query` list-query pipeline.

pub mod widgets;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use runtime::AppConfig;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use widgets::{Widget, WidgetsState};

/// Builds the widgets view from `views.widgets`, falling back to the built-in
/// view settings when the section is absent.
pub fn build_state(config: &AppConfig) -> Result<WidgetsState> {
    let view = if config.views.contains_key(widgets::VIEW_NAME) {
        config.view_config(widgets::VIEW_NAME)?
    } else {
        widgets::default_view_config()
    };
    WidgetsState::new(&view, widgets::seed())
        .with_context(|| format!("Invalid '{}' view configuration", widgets::VIEW_NAME))
}

pub fn build_router(config: &AppConfig) -> Result<Router> {
    let state = Arc::new(build_state(config)?);
    let mut router = widgets::router(state).layer(TraceLayer::new_for_http());
    if config.server.timeout_sec > 0 {
        router = router.layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout_sec)));
    }
    Ok(router)
}
