//! Backend-specific response classification.
//!
//! Backends disagree on how they report an expired session: most answer HTTP 401, some answer
//! 500 with an HTML error page naming an access-denied exception. A [`SessionStrategy`] maps raw
//! responses onto the crate's taxonomy so the session client stays backend-agnostic.

// self
use crate::{_prelude::*, http::Method};

/// Strategy hook classifying authenticated responses.
pub trait SessionStrategy
where
	Self: Send + Sync,
{
	/// Classifies the response of an authenticated call.
	fn classify(&self, ctx: &ResponseContext<'_>) -> ResponseKind;
}

/// Primitive view of a response handed to a [`SessionStrategy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResponseContext<'a> {
	/// Verb of the request.
	pub method: Method,
	/// Full request path.
	pub path: &'a str,
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: &'a str,
}

/// Classification produced by a [`SessionStrategy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseKind {
	/// Body should be decoded and returned.
	Success,
	/// The backend rejected the session token.
	SessionExpired {
		/// Human-readable reason.
		reason: String,
	},
	/// Any other failure; surfaced as an HTTP error.
	Failure,
}

/// Treats 2xx as success and 401 as an expired session.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSessionStrategy;
impl SessionStrategy for DefaultSessionStrategy {
	fn classify(&self, ctx: &ResponseContext<'_>) -> ResponseKind {
		match ctx.status {
			200..=299 => ResponseKind::Success,
			401 => ResponseKind::SessionExpired { reason: "Session token rejected".into() },
			_ => ResponseKind::Failure,
		}
	}
}

/// Extracts the text of the first `<title>` element of an HTML document.
pub fn html_title(document: &str) -> Option<&str> {
	let lower = document.to_ascii_lowercase();
	let open = lower.find("<title")?;
	let start = open + lower[open..].find('>')? + 1;
	let end = start + lower[start..].find("</title>")?;

	Some(document[start..end].trim())
}
