//! Deadline-bounded polling.

// crates.io
use tokio::time::{self, Instant};
// self
use crate::_prelude::*;

/// Interval and deadline of [`poll_until`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollOptions {
	/// Delay between two queries.
	pub interval: std::time::Duration,
	/// Time after which polling gives up.
	pub timeout: std::time::Duration,
}
impl PollOptions {
	/// Options with the given interval and timeout.
	pub const fn new(interval: std::time::Duration, timeout: std::time::Duration) -> Self {
		Self { interval, timeout }
	}
}
impl Default for PollOptions {
	fn default() -> Self {
		Self::new(std::time::Duration::from_secs(1), std::time::Duration::from_secs(30))
	}
}

/// Re-issues `query` every interval until `predicate` accepts its result.
///
/// Query errors propagate immediately. Fails with [`Error::Timeout`] once the deadline has
/// passed after a rejected result.
pub async fn poll_until<T, Q, Fut, P>(mut query: Q, predicate: P, options: PollOptions) -> Result<T>
where
	Q: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
	P: Fn(&T) -> bool,
{
	let deadline = Instant::now() + options.timeout;
	let mut attempts = 0_u32;

	loop {
		let value = query().await?;

		attempts += 1;

		if predicate(&value) {
			return Ok(value);
		}

		let now = Instant::now();

		if now >= deadline {
			return Err(Error::Timeout { attempts });
		}

		tracing::debug!(
			attempts,
			remaining_ms = deadline.saturating_duration_since(now).as_millis() as u64,
			"Predicate not satisfied; retrying."
		);

		time::sleep(options.interval).await;
	}
}
