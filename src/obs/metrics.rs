// self
use crate::obs::{TokenOutcome, TokenStage};

/// Records a token outcome via the global metrics recorder (when enabled).
pub fn record_token_outcome(stage: TokenStage, outcome: TokenOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"event_viewer_token_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_token_outcome_without_recorder() {
		record_token_outcome(TokenStage::Cache, TokenOutcome::Hit);
		record_token_outcome(TokenStage::Exchange, TokenOutcome::Failure);
	}
}
