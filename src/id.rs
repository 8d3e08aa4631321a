//! Strongly typed identifiers for backends and the accounts logged into them.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 256;
const KIND_MAX_LEN: usize = 64;

macro_rules! def_id {
	($name:ident, $label:literal, $validate:path, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates and wraps `value`.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				let value = value.into();

				$validate($label, &value)?;

				Ok(Self(value))
			}

			/// Borrowed view of the identifier.
			pub fn as_str(&self) -> &str {
				&self.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				self.as_str()
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				self.as_str()
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				self.as_str()
			}
		}
		impl From<$name> for String {
			fn from(id: $name) -> Self {
				id.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", stringify!($name), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{label} cannot be empty.")]
	Empty {
		/// Identifier label (backend kind, backend, login).
		label: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{label} contains whitespace.")]
	ContainsWhitespace {
		/// Identifier label (backend kind, backend, login).
		label: &'static str,
	},
	/// A discriminator used something other than lower-case ASCII, digits, `-`, or `_`.
	#[error("{label} contains the disallowed character {character:?}.")]
	InvalidCharacter {
		/// Identifier label.
		label: &'static str,
		/// First offending character.
		character: char,
	},
	/// The identifier exceeded the allowed byte length.
	#[error("{label} exceeds {max} bytes.")]
	TooLong {
		/// Identifier label (backend kind, backend, login).
		label: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

def_id! {
	BackendKind,
	"backend kind",
	validate_kind,
	"Discriminator naming a backend driver (for example `cyclos`)."
}
def_id! {
	BackendId,
	"backend id",
	validate_opaque,
	"Stable logical identifier of one backend instance."
}
def_id! {
	Login,
	"login",
	validate_opaque,
	"Login of the account a session is authenticated as."
}

fn validate_opaque(label: &'static str, value: &str) -> Result<(), IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { label });
	}
	if value.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { label });
	}
	if value.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { label, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

fn validate_kind(label: &'static str, value: &str) -> Result<(), IdentifierError> {
	validate_opaque(label, value)?;

	if let Some(character) = value
		.chars()
		.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_')))
	{
		return Err(IdentifierError::InvalidCharacter { label, character });
	}
	if value.len() > KIND_MAX_LEN {
		return Err(IdentifierError::TooLong { label, max: KIND_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn kinds_are_lower_case_slugs() {
		BackendKind::new("cyclos").expect("Plain kind should be valid.");
		BackendKind::new("comchain_v2").expect("Underscores and digits should be valid.");

		assert_eq!(
			BackendKind::new("Cyclos"),
			Err(IdentifierError::InvalidCharacter { label: "backend kind", character: 'C' })
		);
		assert_eq!(
			BackendKind::new(" cyclos"),
			Err(IdentifierError::ContainsWhitespace { label: "backend kind" })
		);
		assert!(BackendKind::new("k".repeat(KIND_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn opaque_ids_accept_urls_and_emails() {
		let id =
			BackendId::new("cyclos:ledger.example.com:8443/api").expect("Id should be valid.");
		let login = Login::new("john@example.com").expect("Login should be valid.");

		assert_eq!(id.as_str(), "cyclos:ledger.example.com:8443/api");
		assert_eq!(&*login, "john@example.com");
		assert_eq!(format!("{login:?}"), "Login(john@example.com)");
		assert_eq!(BackendId::new(""), Err(IdentifierError::Empty { label: "backend id" }));
		assert!(Login::new("john doe").is_err());
		assert!(BackendId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn deserialization_validates() {
		let login: Login =
			serde_json::from_str("\"alice@example.org\"").expect("Login should deserialize.");

		assert_eq!(
			serde_json::to_string(&login).expect("Login should serialize."),
			"\"alice@example.org\""
		);
		assert!(serde_json::from_str::<BackendKind>("\"Odoo\"").is_err());
	}

	#[test]
	fn registry_lookups_borrow_as_str() {
		let kind = BackendKind::new("odoo").expect("Kind should be valid.");
		let map = BTreeMap::from([(kind, 7_u8)]);

		assert_eq!(map.get("odoo"), Some(&7));
	}
}
