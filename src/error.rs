//! Crate-level error types shared across sessions, streams, stores, and backends.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Number of characters of an offending response body kept for diagnostics.
pub const BODY_PREVIEW_LIMIT: usize = 200;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) reported by the injected HTTP capability.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Response body is not valid JSON.
	#[error("Data is not parseable JSON: {preview}")]
	InvalidJson {
		/// Offending body truncated to [`BODY_PREVIEW_LIMIT`] characters.
		preview: String,
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// JSON payload does not match the expected record shape.
	#[error("Unexpected {record} payload.")]
	Decode {
		/// Record kind being decoded.
		record: &'static str,
		/// Structured decoding failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Backend answered with a non-success HTTP status.
	#[error("Backend answered with HTTP {status}: {body}")]
	Http {
		/// HTTP status code.
		status: u16,
		/// Response body truncated to [`BODY_PREVIEW_LIMIT`] characters.
		body: String,
	},
	/// Login or password rejected at authentication time.
	#[error("Invalid credentials: {reason}.")]
	InvalidCredentials {
		/// Backend-supplied reason string.
		reason: String,
	},
	/// Backend processed the call but reported an application-level failure.
	#[error("API request failed: {reason}.")]
	ApiRequestFailed {
		/// Backend-supplied reason string.
		reason: String,
	},
	/// Authenticated call attempted without any stored or in-memory token.
	#[error("A session token is required; log in first.")]
	TokenRequired,
	/// Backend rejected a previously valid session token.
	#[error("Authentication required: {reason}.")]
	AuthenticationRequired {
		/// HTTP status code of the rejected call, when available.
		status: Option<u16>,
		/// Backend- or strategy-supplied reason string.
		reason: String,
	},
	/// Administrative backend referenced a backend kind without a registered driver.
	#[error("No driver registered for backend kind `{kind}`.")]
	UnknownBackend {
		/// Unregistered discriminator.
		kind: String,
	},
	/// Polling deadline elapsed before the predicate held.
	#[error("Timeout reached after {attempts} attempts.")]
	Timeout {
		/// Number of queries issued before giving up.
		attempts: u32,
	},
}
impl Error {
	/// Builds an [`Error::InvalidJson`] keeping a bounded preview of `body`.
	pub fn invalid_json(body: &str, source: serde_json::Error) -> Self {
		Self::InvalidJson { preview: preview(body), source }
	}

	/// Builds an [`Error::Http`] keeping a bounded preview of `body`.
	pub fn http(status: u16, body: &str) -> Self {
		Self::Http { status, body: preview(body) }
	}

	/// Returns `true` for errors that only a fresh login can resolve.
	pub fn requires_login(&self) -> bool {
		matches!(self, Self::TokenRequired | Self::AuthenticationRequired { .. })
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Host or URL is not usable to reach a backend.
	#[error("Invalid value for host: {host}.")]
	InvalidConnectionDetails {
		/// Offending host or URL.
		host: String,
	},
	/// Request path or query could not be assembled into a URL.
	#[error("Request URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Identifier validation failed.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::id::IdentifierError),
	/// Sort key names a field the record does not expose.
	#[error("Unknown sort field `{field}`.")]
	UnknownSortField {
		/// Requested field name.
		field: String,
	},
	/// Password checker received an unknown check identifier.
	#[error("Invalid check identifier `{check}`.")]
	InvalidPasswordCheck {
		/// Offending check specifier.
		check: String,
	},
	/// Backend credential payload lacks a required attribute.
	#[error("Backend credentials are missing `{field}`.")]
	MissingCredentialField {
		/// Missing attribute name.
		field: &'static str,
	},
}

/// Failures reaching a backend.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {host}.")]
	Network {
		/// Host that was being contacted.
		host: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		host: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { host: host.into(), source: Box::new(src) }
	}
}

pub(crate) fn preview(body: &str) -> String {
	match body.char_indices().nth(BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}..", &body[..cut]),
		None => body.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn preview_truncates_long_bodies() {
		let body = "x".repeat(BODY_PREVIEW_LIMIT + 50);
		let shown = preview(&body);

		assert_eq!(shown.len(), BODY_PREVIEW_LIMIT + 2);
		assert!(shown.ends_with(".."));
		assert_eq!(preview("short"), "short");
	}

	#[test]
	fn preview_respects_char_boundaries() {
		let body = "é".repeat(BODY_PREVIEW_LIMIT + 1);

		assert_eq!(preview(&body).chars().count(), BODY_PREVIEW_LIMIT + 2);
	}

	#[test]
	fn invalid_json_keeps_source_and_preview() {
		let body = "<html>oops</html>";
		let source =
			serde_json::from_str::<JsonValue>(body).expect_err("HTML should not parse as JSON.");
		let err = Error::invalid_json(body, source);

		assert!(err.to_string().contains("<html>oops</html>"));
		assert!(StdError::source(&err).is_some());
	}

	#[test]
	fn login_related_errors_are_flagged() {
		assert!(Error::TokenRequired.requires_login());
		assert!(
			Error::AuthenticationRequired { status: Some(401), reason: "expired".into() }
				.requires_login()
		);
		assert!(!Error::http(500, "boom").requires_login());
	}
}
