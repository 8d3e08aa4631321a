//! Payment records returned when a transfer is performed.

// self
use crate::{
	_prelude::*,
	id::BackendId,
	stream::{FieldValue, Sortable},
};

/// Outgoing or incoming payment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
	/// Backend that produced the record.
	pub backend: BackendId,
	/// Backend-side identifier.
	pub id: String,
	/// Amount moved.
	pub amount: Decimal,
	/// Execution time.
	#[serde(with = "time::serde::rfc3339")]
	pub date: OffsetDateTime,
	/// Free-text description.
	pub description: String,
	/// Paying party.
	pub from: JsonValue,
	/// Receiving party.
	pub to: JsonValue,
}
impl Sortable for Payment {
	const FIELDS: &'static [&'static str] = &["amount", "date", "description", "id"];

	fn field(&self, name: &str) -> Option<FieldValue> {
		Some(match name {
			"amount" => FieldValue::Decimal(self.amount),
			"date" => FieldValue::Time(self.date),
			"description" => FieldValue::Text(self.description.clone()),
			"id" => FieldValue::Text(self.id.clone()),
			_ => return None,
		})
	}
}
