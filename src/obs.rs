//! Observability helpers shared by sessions, sources, and the aggregator.
//!
//! - Every outbound operation runs inside an info span named `finbridge.op` carrying the `op`
//!   (operation kind) and `stage` (call site) fields.
//! - Enable the `metrics` feature to increment the `finbridge_operation_total` counter for every
//!   attempt and terminal [`Outcome`], labeled by `op` + `outcome`.

mod counter;
mod span;

pub use counter::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Plain or authenticated REST call.
	Request,
	/// Credential exchange against a backend.
	Login,
	/// Fetch of one page of a paginated listing.
	PageFetch,
	/// Fan-out across every registered backend.
	Aggregate,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Request => "request",
			OperationKind::Login => "login",
			OperationKind::PageFetch => "page_fetch",
			OperationKind::Aggregate => "aggregate",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// No usable session: the token was missing or the backend rejected it.
	LoginRequired,
	/// The backend answered with an HTTP, credential, or application-level refusal.
	Rejected,
	/// The backend could not be reached.
	Transport,
	/// A merge source failed and was dropped from the merge.
	SourceDropped,
	/// Any other failure (configuration, decoding, storage, timeout).
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::LoginRequired => "login_required",
			Outcome::Rejected => "rejected",
			Outcome::Transport => "transport",
			Outcome::SourceDropped => "source_dropped",
			Outcome::Failure => "failure",
		}
	}

	/// Maps a result onto its terminal outcome.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Outcome::Success,
			Err(e) if e.requires_login() => Outcome::LoginRequired,
			Err(Error::Transport(_)) => Outcome::Transport,
			Err(Error::Http { .. })
			| Err(Error::InvalidCredentials { .. })
			| Err(Error::ApiRequestFailed { .. }) => Outcome::Rejected,
			Err(_) => Outcome::Failure,
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
