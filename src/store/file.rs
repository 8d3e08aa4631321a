//! File-backed [`CredentialStore`] that survives process restarts.

// std
use std::{
	fs::{self, File},
	io::{self, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{CredentialStore, StoreError, StoreFuture, StoreKey},
};

/// Persists session tokens to a JSON object file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	tokens: Arc<RwLock<BTreeMap<StoreKey, String>>>,
}
impl FileStore {
	/// Opens the token file at `path`, creating its directory when needed.
	///
	/// A missing or empty file yields an empty store; anything else must be a JSON object of
	/// string values.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
			fs::create_dir_all(dir).map_err(|e| io_failure("create directory", dir, e))?;
		}

		let tokens = match fs::read(&path) {
			Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
			Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("{} is not a token map: {e}", path.display()),
			})?,
			Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
			Err(e) => return Err(io_failure("read", &path, e)),
		};

		Ok(Self { path, tokens: Arc::new(RwLock::new(tokens)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	// Writes a sibling temp file, then renames it over the store.
	fn flush(&self, tokens: &BTreeMap<StoreKey, String>) -> Result<(), StoreError> {
		let bytes = serde_json::to_vec_pretty(tokens)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;
		let staging = self.path.with_extension("tmp");
		let mut file = File::create(&staging).map_err(|e| io_failure("create", &staging, e))?;

		file.write_all(&bytes)
			.and_then(|_| file.sync_all())
			.map_err(|e| io_failure("write", &staging, e))?;
		drop(file);

		fs::rename(&staging, &self.path).map_err(|e| io_failure("replace", &self.path, e))
	}
}
impl CredentialStore for FileStore {
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.tokens.read().get(key).cloned()) })
	}

	fn set<'a>(&'a self, key: &'a StoreKey, value: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.tokens.write();
			let previous = guard.insert(key.to_owned(), value.to_owned());

			if let Err(e) = self.flush(&guard) {
				match previous {
					Some(old) => guard.insert(key.to_owned(), old),
					None => guard.remove(key),
				};

				return Err(e);
			}

			Ok(())
		})
	}

	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			let mut guard = self.tokens.write();
			let Some(previous) = guard.remove(key) else {
				return Ok(false);
			};

			if let Err(e) = self.flush(&guard) {
				guard.insert(key.to_owned(), previous);

				return Err(e);
			}

			Ok(true)
		})
	}
}

fn io_failure(action: &str, path: &Path, e: io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {e}", path.display()) }
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path(tag: &str) -> PathBuf {
		env::temp_dir().join(format!(
			"finbridge_{tag}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		))
	}

	#[tokio::test]
	async fn tokens_survive_reopening() {
		let path = temp_path("reopen");
		let key = StoreKey::new("Y3ljbG9zOmxlZGdlcg");
		let store = FileStore::open(&path).expect("Store should open.");

		store.set(&key, "session-token").await.expect("Token should persist.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Store should reopen.");

		assert_eq!(
			reopened.get(&key).await.expect("Read should succeed.").as_deref(),
			Some("session-token")
		);
		assert!(reopened.delete(&key).await.expect("Delete should succeed."));
		assert!(!reopened.delete(&key).await.expect("Second delete should succeed."));
		assert_eq!(reopened.get_or(&key, "none").await.expect("Read should succeed."), "none");
		assert_eq!(fs::read_to_string(&path).expect("Store file should exist.").trim(), "{}");

		fs::remove_file(&path).expect("Temporary store should be removable.");
	}

	#[test]
	fn malformed_files_are_rejected() {
		let path = temp_path("malformed");

		fs::write(&path, "[1, 2]").expect("Fixture should be written.");

		let err = FileStore::open(&path).expect_err("Array payload should be rejected.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		fs::write(&path, "").expect("Fixture should be written.");

		assert!(FileStore::open(&path).is_ok(), "Empty file should open as an empty store.");

		fs::remove_file(&path).expect("Temporary store should be removable.");
	}
}
