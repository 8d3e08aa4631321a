//! Ledger account records.

// self
use crate::{_prelude::*, id::BackendId};

/// Balance-holding account on a ledger backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
	/// Backend that owns the account.
	pub backend: BackendId,
	/// Owner of the account on the backend.
	pub owner_id: String,
	/// Backend-side account identifier.
	pub id: String,
	/// Current balance.
	pub balance: Decimal,
	/// Currency symbol.
	pub symbol: String,
}
impl Account {
	/// Globally unique identifier `backend/owner/account`.
	pub fn internal_id(&self) -> String {
		format!("{}/{}/{}", self.backend, self.owner_id, self.id)
	}
}
