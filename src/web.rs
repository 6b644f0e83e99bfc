//! HTTP surface: routes, shared state, and error responses.
//!
//! | Route | Action |
//! | --- | --- |
//! | `GET /` | [`EventsController::index`] |
//! | `GET /healthz` | liveness probe, never touches the token endpoint |
//! | `GET /{event_id}` | [`EventsController::listing`] |

pub mod controller;
pub mod view;

pub use controller::*;
pub use view::*;

// crates.io
use axum::{
	Router,
	extract::{Path, State},
	http::StatusCode,
	response::{Html, IntoResponse, Response},
	routing::get,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
// self
use crate::{
	_prelude::*,
	config::AppConfig,
	provider::{AccessTokenProvider, CachedTokenProvider, ReqwestClientCredentialsProvider},
};

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
	/// Controller behind the event routes.
	pub controller: EventsController,
	/// Renderer for successful views.
	pub renderer: Arc<dyn ViewRenderer>,
}
impl AppState {
	/// Bundles a controller with a renderer.
	pub fn new(controller: EventsController, renderer: Arc<dyn ViewRenderer>) -> Self {
		Self { controller, renderer }
	}

	/// Wires the reqwest-backed token provider, cached unless disabled, into a controller.
	pub fn from_config(config: &AppConfig) -> Result<Self> {
		let exchange = ReqwestClientCredentialsProvider::from_config(&config.client)?;
		let provider: Arc<dyn AccessTokenProvider> = if config.cache.enabled {
			Arc::new(CachedTokenProvider::<ReqwestClientCredentialsProvider>::from_config(
				exchange,
				&config.cache,
			))
		} else {
			Arc::new(exchange)
		};
		let controller = EventsController::new(provider).with_defaults(config.index);

		Ok(Self::new(controller, Arc::new(HtmlRenderer::default())))
	}
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(index))
		.route("/healthz", get(healthz))
		.route("/:event_id", get(listing))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Serves `state` on `listener` until Ctrl-C is received.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
	if let Ok(addr) = listener.local_addr() {
		tracing::info!(%addr, "Listening.");
	}

	axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await
}

async fn index(State(state): State<AppState>) -> Result<Html<String>> {
	let view = state.controller.index().await?;

	Ok(Html(state.renderer.render(&view)?))
}

async fn listing(
	State(state): State<AppState>,
	Path(event_id): Path<i64>,
) -> Result<Html<String>> {
	let view = state.controller.listing(event_id)?;

	Ok(Html(state.renderer.render(&view)?))
}

async fn healthz() -> &'static str {
	"ok"
}

async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => tracing::info!("Shutdown signal received."),
		Err(err) => {
			tracing::error!(error = %err, "Failed to listen for the shutdown signal.");

			std::future::pending::<()>().await;
		},
	}
}

impl Error {
	/// HTTP status this error is reported with.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
			Self::Authentication(_) | Self::Config(_) | Self::Render { .. } =>
				StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}
impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status_code();

		tracing::error!(status = status.as_u16(), error = %self, "Request failed.");

		// Upstream detail stays in the log.
		let body = match status {
			StatusCode::NOT_IMPLEMENTED => "This page is not available yet.",
			_ => "Something went wrong. Please try again later.",
		};

		(status, Html(format!("<!DOCTYPE html>\n<html lang=\"en\">\n<body>\n<p>{body}</p>\n</body>\n</html>\n")))
			.into_response()
	}
}
