//! Thread-safe in-memory [`CredentialStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{CredentialStore, StoreFuture, StoreKey},
};

/// Keeps session tokens in-process; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<StoreKey, String>>>);
impl MemoryStore {
	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no entry is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl CredentialStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>> {
		let value = self.0.read().get(key).cloned();

		Box::pin(async move { Ok(value) })
	}

	fn set<'a>(&'a self, key: &'a StoreKey, value: &'a str) -> StoreFuture<'a, ()> {
		self.0.write().insert(key.clone(), value.to_owned());

		Box::pin(async { Ok(()) })
	}

	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool> {
		let existed = self.0.write().remove(key).is_some();

		Box::pin(async move { Ok(existed) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn clones_share_entries() {
		let store = MemoryStore::default();
		let mirror = store.clone();
		let key = StoreKey::new("b2RvbzpleGFtcGxlOmFsaWNl");

		store.set(&key, "api-key").await.expect("Write should succeed.");

		assert_eq!(mirror.get(&key).await.expect("Read should succeed."), Some("api-key".into()));
		assert_eq!(mirror.len(), 1);
		assert!(mirror.delete(&key).await.expect("Delete should succeed."));
		assert!(store.is_empty());
	}
}
