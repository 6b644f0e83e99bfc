// crates.io
use tracing::{Span, instrument::Instrumented};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::{_prelude::*, auth::ClientId, config::LogConfig, obs::TokenStage};

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "event_viewer=info,tower_http=info";

/// Span wrapper used around token acquisition.
#[derive(Clone, Debug)]
pub struct TokenSpan {
	span: Span,
}
impl TokenSpan {
	/// Creates a new span tagged with the provided stage + client identity.
	pub fn new(stage: TokenStage, client_id: &ClientId) -> Self {
		let span = tracing::info_span!(
			"event_viewer.token",
			stage = stage.as_str(),
			client_id = %client_id
		);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over [`DEFAULT_LOG_FILTER`]. Must be called at most once.
pub fn init_subscriber(config: &LogConfig) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
	let registry = tracing_subscriber::registry().with(filter);

	if config.json {
		registry.with(fmt::layer().with_target(false).json()).init();
	} else {
		registry.with(fmt::layer().with_target(false).compact()).init();
	}
}
