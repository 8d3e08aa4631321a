// crates.io
use tracing::{Instrument, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::OperationKind};

/// Span wrapper used around every outbound operation.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("finbridge.op", op = kind.as_str(), stage) }
	}

	/// Runs `fut` inside the span.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		Instrument::instrument(fut, self.span.clone())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OperationSpan::new(OperationKind::PageFetch, "instrument_wraps_future");
		// Method syntax would pick the by-value `Instrument` blanket impl glob-imported above.
		let value = OperationSpan::instrument(&span, async { 42 }).await;

		assert_eq!(value, 42);
	}
}
