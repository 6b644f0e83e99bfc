//! Observability helpers for token acquisition.
//!
//! Every exchange and cache lookup runs inside an `event_viewer.token` span carrying the `stage`
//! and `client_id` fields. With the `metrics` feature enabled, each outcome also increments the
//! `event_viewer_token_total` counter labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Where a token request was served from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenStage {
	/// Network round trip to the token endpoint.
	Exchange,
	/// Lookup in the process-wide token cache.
	Cache,
}
impl TokenStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenStage::Exchange => "exchange",
			TokenStage::Cache => "cache",
		}
	}
}
impl Display for TokenStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenOutcome {
	/// Entry to a stage.
	Attempt,
	/// Cached token reused without a network call.
	Hit,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl TokenOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenOutcome::Attempt => "attempt",
			TokenOutcome::Hit => "hit",
			TokenOutcome::Success => "success",
			TokenOutcome::Failure => "failure",
		}
	}
}
impl Display for TokenOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
