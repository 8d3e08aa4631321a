//! Durable key/value contract for session tokens and the built-in store implementations.
//!
//! Exactly one entry exists per authenticated backend session. The key is the URL-safe
//! [`StoreKey`] derived from the session's logical identity and the value is the opaque bearer
//! token; absence of the key means the session is not authenticated.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for session tokens.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>>;

	/// Persists or replaces the value stored under `key`.
	fn set<'a>(&'a self, key: &'a StoreKey, value: &'a str) -> StoreFuture<'a, ()>;

	/// Removes `key`, resolving to `true` when an entry existed.
	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool>;

	/// Fetches the value stored under `key`, falling back to `default`.
	fn get_or<'a>(&'a self, key: &'a StoreKey, default: &'a str) -> StoreFuture<'a, String> {
		Box::pin(async move { Ok(self.get(key).await?.unwrap_or_else(|| default.to_owned())) })
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// URL-safe key identifying one stored session token.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreKey(String);
impl StoreKey {
	/// Wraps an already derived key.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw key string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for StoreKey {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
