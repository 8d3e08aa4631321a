//! Fan-out across every configured ledger backend.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use futures_util::future;
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	backend::{Backend, BackendRegistry},
	capability::Capabilities,
	obs::{self, OperationKind, OperationSpan},
	record::{Account, Recipient, Transaction},
	stream::{Mux, SortOrder},
};

/// Default ordering of merged transactions: newest first, then by id.
pub const DEFAULT_TRANSACTION_ORDER: [&str; 2] = ["-date", "id"];

type BuildSlot = Arc<AsyncMutex<Option<Arc<dyn Backend>>>>;

/// Holds the ledger drivers of one user and merges their data.
///
/// Drivers are built from credential payloads through the [`BackendRegistry`]. Built drivers are
/// cached by the SHA-256 fingerprint of the canonical payload, and concurrent builds of the
/// same payload converge on one instance.
pub struct Aggregator {
	registry: BackendRegistry,
	capabilities: Capabilities,
	builds: Mutex<HashMap<String, BuildSlot>>,
	backends: RwLock<Vec<Arc<dyn Backend>>>,
}
impl Aggregator {
	/// Creates an aggregator without any backend.
	pub fn new(registry: BackendRegistry, capabilities: Capabilities) -> Self {
		Self {
			registry,
			capabilities,
			builds: Default::default(),
			backends: Default::default(),
		}
	}

	/// Registry used to construct drivers.
	pub fn registry(&self) -> &BackendRegistry {
		&self.registry
	}

	/// Drivers currently aggregated.
	pub fn backends(&self) -> Vec<Arc<dyn Backend>> {
		self.backends.read().clone()
	}

	/// Adds an already constructed driver, replacing any driver with the same id.
	pub fn add_backend(&self, backend: Arc<dyn Backend>) {
		let mut backends = self.backends.write();

		backends.retain(|existing| existing.id() != backend.id());
		backends.push(backend);
	}

	/// Drops every aggregated driver and the build cache.
	pub fn clear(&self) {
		self.backends.write().clear();
		self.builds.lock().clear();
	}

	/// Builds (or reuses) the driver for one credential payload of backend `kind`.
	///
	/// Fails with [`Error::UnknownBackend`] when no factory is registered for `kind`.
	pub async fn backend_for(
		&self,
		kind: &str,
		credentials: &JsonValue,
	) -> Result<Arc<dyn Backend>> {
		let factory =
			self.registry.get(kind).ok_or_else(|| Error::UnknownBackend { kind: kind.to_owned() })?;
		let slot = self.build_slot(fingerprint(kind, credentials));
		let mut built = slot.lock().await;

		if let Some(backend) = built.as_ref() {
			return Ok(backend.clone());
		}

		let backend = factory.build(credentials, &self.capabilities).await?;

		*built = Some(backend.clone());

		Ok(backend)
	}

	/// Builds the drivers for every payload of `credentials` and makes them the aggregated set.
	///
	/// `credentials` maps a backend kind to one payload or a list of payloads. Kinds without a
	/// registered driver are logged and skipped; any other build failure aborts the load.
	pub async fn load(&self, credentials: &JsonValue) -> Result<Vec<Arc<dyn Backend>>> {
		let span = OperationSpan::new(OperationKind::Aggregate, "load");
		let backends = obs::record_result(
			OperationKind::Aggregate,
			span.instrument(self.load_all(credentials)).await,
		)?;

		*self.backends.write() = backends.clone();

		Ok(backends)
	}

	/// Lists the accounts of every backend, in backend order.
	pub async fn accounts(&self) -> Result<Vec<Account>> {
		let backends = self.backends();
		let span = OperationSpan::new(OperationKind::Aggregate, "accounts");
		let lists = span
			.instrument(future::join_all(backends.iter().map(|backend| backend.accounts())))
			.await;
		let mut accounts = Vec::new();

		for list in lists {
			accounts.extend(list?);
		}

		Ok(accounts)
	}

	/// Merged transaction stream of every backend, ordered by `order` (see [`SortOrder::parse`]).
	///
	/// Nothing is fetched until the stream is first pulled.
	pub fn transactions<I, S>(&self, order: I) -> Result<Mux<Transaction>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let order = SortOrder::<Transaction>::parse(order)?;
		let sources = self.backends().iter().map(|backend| backend.transactions()).collect();

		Ok(Mux::new(sources, order.into_comparator()))
	}

	/// Merged transaction stream in [`DEFAULT_TRANSACTION_ORDER`].
	pub fn recent_transactions(&self) -> Result<Mux<Transaction>> {
		self.transactions(DEFAULT_TRANSACTION_ORDER)
	}

	/// Maps raw partner records onto recipients across every backend.
	pub fn make_recipients(&self, partners: &[JsonValue]) -> Result<Vec<Recipient>> {
		let backends = self.backends();
		let mut recipients = Vec::new();

		for partner in partners {
			for backend in &backends {
				recipients.extend(backend.make_recipients(partner)?);
			}
		}

		Ok(recipients)
	}

	async fn load_all(&self, credentials: &JsonValue) -> Result<Vec<Arc<dyn Backend>>> {
		let Some(by_kind) = credentials.as_object() else {
			return Ok(Vec::new());
		};
		let mut pending = Vec::new();

		for (kind, payloads) in by_kind {
			if !self.registry.contains(kind) {
				tracing::warn!(kind = %kind, "Skipping backend without a registered driver.");

				continue;
			}

			match payloads {
				JsonValue::Array(items) => pending.extend(items.iter().map(|item| (kind, item))),
				single => pending.push((kind, single)),
			}
		}

		future::join_all(pending.into_iter().map(|(kind, item)| self.backend_for(kind, item)))
			.await
			.into_iter()
			.collect()
	}

	fn build_slot(&self, key: String) -> BuildSlot {
		let mut builds = self.builds.lock();

		builds.entry(key).or_insert_with(|| Arc::new(AsyncMutex::new(None))).clone()
	}
}
impl Debug for Aggregator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let ids = self.backends.read().iter().map(|b| b.id().to_string()).collect::<Vec<_>>();

		f.debug_struct("Aggregator")
			.field("registry", &self.registry)
			.field("backends", &ids)
			.finish()
	}
}

/// Unpadded Base64 SHA-256 of `kind` and the key-sorted serialization of `credentials`.
pub fn fingerprint(kind: &str, credentials: &JsonValue) -> String {
	// `serde_json::Map` keeps keys sorted unless `preserve_order` is enabled.
	let canonical = credentials.to_string();
	let digest = Sha256::new()
		.chain_update(kind.as_bytes())
		.chain_update([0_u8])
		.chain_update(canonical.as_bytes())
		.finalize();

	STANDARD_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn fingerprint_ignores_key_order() {
		let a = serde_json::json!({ "cyclos_id": "42", "nested": { "b": 1, "a": [true, null] } });
		let b = serde_json::json!({ "nested": { "a": [true, null], "b": 1 }, "cyclos_id": "42" });

		assert_eq!(fingerprint("cyclos", &a), fingerprint("cyclos", &b));
		assert_ne!(fingerprint("cyclos", &a), fingerprint("other", &a));
		assert_eq!(fingerprint("cyclos", &a).len(), 43);
	}

	#[test]
	fn fingerprint_hashes_the_compact_sorted_form() {
		let payload = serde_json::json!({ "z": "x\"y", "a": [1, 2.5] });

		assert_eq!(payload.to_string(), r#"{"a":[1,2.5],"z":"x\"y"}"#);
		assert_eq!(fingerprint("cyclos", &payload), "VCfWxvAYXHOUBtNeJbudDqDf3EeFS2KePDRpeue9I+I");
	}
}
