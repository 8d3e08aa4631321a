//! Pending top-up (credit) requests tracked by the administrative backend.

// self
use crate::{_prelude::*, id::BackendId};

/// Top-up request awaiting payment or validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditRequest {
	/// Ledger backend the top-up targets.
	pub backend: BackendId,
	/// Sale order identifier, used to cancel the request.
	pub order_id: JsonValue,
	/// Requested amount.
	pub amount: Decimal,
	/// Creation time.
	#[serde(with = "time::serde::timestamp")]
	pub date: OffsetDateTime,
	/// Order reference shown to the user.
	pub related: String,
	/// Whether the order was paid.
	pub paid: bool,
}
