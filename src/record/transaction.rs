//! Transaction records.

// self
use crate::{
	_prelude::*,
	id::BackendId,
	stream::{FieldValue, Sortable},
};

/// One settled movement on a ledger account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	/// Backend that produced the record.
	pub backend: BackendId,
	/// Backend-side identifier.
	pub id: String,
	/// Signed amount.
	pub amount: Decimal,
	/// Currency symbol or code.
	pub currency: String,
	/// Settlement time.
	#[serde(with = "time::serde::rfc3339")]
	pub date: OffsetDateTime,
	/// Free-text description.
	pub description: String,
	/// Backend-specific transaction kind.
	pub kind: Option<String>,
	/// Display name of the counterpart.
	pub related: Option<String>,
	/// Kind of the counterpart (user, system account).
	pub related_kind: Option<String>,
	/// Raw counterpart user payload, when provided.
	pub related_user: Option<JsonValue>,
}
impl Sortable for Transaction {
	const FIELDS: &'static [&'static str] =
		&["amount", "backend", "currency", "date", "description", "id", "kind", "related"];

	fn field(&self, name: &str) -> Option<FieldValue> {
		Some(match name {
			"amount" => FieldValue::Decimal(self.amount),
			"backend" => FieldValue::Text(self.backend.to_string()),
			"currency" => FieldValue::Text(self.currency.clone()),
			"date" => FieldValue::Time(self.date),
			"description" => FieldValue::Text(self.description.clone()),
			"id" => FieldValue::Text(self.id.clone()),
			"kind" => FieldValue::Text(self.kind.clone()?),
			"related" => FieldValue::Text(self.related.clone()?),
			_ => return None,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::stream::SortOrder;

	fn transaction(id: &str, day: u8, amount: i64) -> Transaction {
		Transaction {
			backend: BackendId::new("cyclos:ledger.example.com:42")
				.expect("Backend id fixture should be valid."),
			id: id.into(),
			amount: Decimal::from(amount),
			currency: "LOK".into(),
			date: datetime!(2024-03-01 12:00 UTC) + Duration::days(day.into()),
			description: String::new(),
			kind: None,
			related: None,
			related_kind: None,
			related_user: None,
		}
	}

	#[test]
	fn newest_first_then_id() {
		let order =
			SortOrder::<Transaction>::parse(["-date", "id"]).expect("Sort keys should parse.");
		let mut items =
			vec![transaction("b", 1, 5), transaction("a", 1, 7), transaction("c", 3, 1)];

		items.sort_by(|a, b| order.compare(a, b));

		assert_eq!(items.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(), ["c", "a", "b"]);
	}

	#[test]
	fn optional_fields_are_absent() {
		let item = transaction("a", 0, 1);

		assert_eq!(item.field("kind"), None);
		assert_eq!(item.field("amount"), Some(FieldValue::Decimal(Decimal::ONE)));
	}
}
