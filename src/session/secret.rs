//! Session tokens issued by backends.

// self
use crate::_prelude::*;

/// Token authenticating one backend session.
///
/// An empty string is never a token: submitting or storing one means "no session". Formatting
/// never reveals the value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(Arc<str>);
impl SessionToken {
	/// Wraps `value`, or returns `None` when it is empty.
	pub fn new(value: &str) -> Option<Self> {
		(!value.is_empty()).then(|| Self(Arc::from(value)))
	}

	/// Wraps a value read from a credential store, treating `None` and `""` alike.
	pub fn from_stored(value: Option<String>) -> Option<Self> {
		value.as_deref().and_then(Self::new)
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for SessionToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "SessionToken(<{} bytes>)", self.0.len())
	}
}
impl Display for SessionToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_values_are_not_tokens() {
		assert_eq!(SessionToken::new(""), None);
		assert_eq!(SessionToken::from_stored(Some(String::new())), None);
		assert_eq!(SessionToken::from_stored(None), None);

		let stored = SessionToken::from_stored(Some("api-key".into()));

		assert_eq!(stored.as_ref().map(SessionToken::expose), Some("api-key"));
	}

	#[test]
	fn formatting_hides_the_value() {
		let token = SessionToken::new("super-secret").expect("Non-empty value should be a token.");

		assert_eq!(format!("{token:?}"), "SessionToken(<12 bytes>)");
		assert_eq!(format!("{token}"), "<redacted>");
	}
}
