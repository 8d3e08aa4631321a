//! Contact and recipient records.

// self
use crate::{_prelude::*, id::BackendId};

/// Partner profile as exposed by the administrative and ledger backends.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
	/// Partner identifier.
	pub id: JsonValue,
	/// Display name.
	pub name: String,
	/// Whether the partner is an organisation.
	pub is_company: bool,
	/// Whether the logged-in user marked the partner as favorite.
	pub is_favorite: bool,
	/// E-mail address.
	pub email: Option<String>,
	/// Mobile phone number.
	pub mobile: Option<String>,
	/// Landline phone number.
	pub phone: Option<String>,
	/// Street, first line.
	pub street: Option<String>,
	/// Street, second line.
	pub street2: Option<String>,
	/// Postal code.
	pub zip: Option<String>,
	/// City.
	pub city: Option<String>,
}
impl Contact {
	/// Partner identifier rendered as text.
	pub fn id_text(&self) -> String {
		match &self.id {
			JsonValue::String(id) => id.clone(),
			other => other.to_string(),
		}
	}
}

/// Payment target on a ledger backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
	/// Backend the recipient can be paid on.
	pub backend: BackendId,
	/// Owner identifier of the recipient's wallet on that backend.
	pub owner_id: String,
	/// Profile data.
	pub contact: Contact,
}
impl Recipient {
	/// Globally unique identifier `backend/owner`.
	pub fn internal_id(&self) -> String {
		format!("{}/{}", self.backend, self.owner_id)
	}
}
