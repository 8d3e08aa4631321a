// self
use crate::{
	_prelude::*,
	obs::{OperationKind, Outcome},
};

/// Counter incremented once per attempt and once per terminal outcome.
pub const OPERATION_COUNTER: &str = "finbridge_operation_total";

/// Increments [`OPERATION_COUNTER`] for `kind` and `outcome` when the `metrics` feature is on.
pub fn record_operation_outcome(kind: OperationKind, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(OPERATION_COUNTER, "op" => kind.as_str(), "outcome" => outcome.as_str())
		.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records the terminal outcome of `result` and hands the result back unchanged.
pub fn record_result<T>(kind: OperationKind, result: Result<T>) -> Result<T> {
	record_operation_outcome(kind, Outcome::of(&result));

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::TransportError;

	#[test]
	fn outcomes_follow_the_error_kind() {
		let cases = [
			(Ok(()), "success"),
			(Err(Error::TokenRequired), "login_required"),
			(
				Err(Error::AuthenticationRequired { status: Some(401), reason: "expired".into() }),
				"login_required",
			),
			(Err(Error::http(503, "busy")), "rejected"),
			(Err(Error::ApiRequestFailed { reason: "locked".into() }), "rejected"),
			(
				Err(Error::Transport(TransportError::network(
					"ledger.example.com",
					std::io::Error::other("reset"),
				))),
				"transport",
			),
			(Err(Error::Timeout { attempts: 3 }), "failure"),
		];

		for (result, label) in cases {
			assert_eq!(Outcome::of(&result).as_str(), label);
		}
	}

	#[test]
	fn record_result_returns_the_result() {
		let ok = record_result(OperationKind::PageFetch, Ok(7));

		assert_eq!(ok.expect("Success should pass through."), 7);

		let err = record_result::<()>(OperationKind::Login, Err(Error::TokenRequired))
			.expect_err("Failure should pass through.");

		assert!(err.requires_login());
	}
}
