//! Backend drivers and the registry that constructs them.
//!
//! A driver binds one [`SessionClient`](crate::session::SessionClient) and one paginated
//! transaction source to a concrete ledger backend. Drivers are built from the credential
//! payloads published by the administrative backend through factories registered by the host
//! application under a string discriminator.

pub mod cyclos;
pub mod odoo;

pub use cyclos::{CyclosBackend, CyclosCredentials};
pub use odoo::{LoginInfo, OdooAdmin, OdooConfig, OdooSessionStrategy};

// self
use crate::{
	_prelude::*,
	capability::Capabilities,
	error::ConfigError,
	id::{BackendId, BackendKind},
	record::{Account, Payment, Recipient, Transaction},
	stream::BoxSource,
};

/// Boxed future returned by backend drivers and factories.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Ledger backend driver.
pub trait Backend
where
	Self: Send + Sync,
{
	/// Stable logical identifier of the backend instance.
	fn id(&self) -> &BackendId;

	/// Discriminator of the driver.
	fn kind(&self) -> &BackendKind;

	/// Fetches every account of the current session.
	fn accounts(&self) -> BackendFuture<'_, Vec<Account>>;

	/// Fresh lazy transaction source, newest first, starting at the first page.
	fn transactions(&self) -> BoxSource<Transaction>;

	/// Maps a raw partner record onto the recipients payable on this backend.
	fn make_recipients(&self, raw: &JsonValue) -> Result<Vec<Recipient>>;

	/// Transfers `amount` to `recipient`.
	fn transfer<'a>(
		&'a self,
		recipient: &'a Recipient,
		amount: Decimal,
		description: &'a str,
	) -> BackendFuture<'a, Payment>;
}

/// Constructs drivers from credential payloads.
pub trait BackendFactory
where
	Self: Send + Sync,
{
	/// Builds a driver for `credentials`.
	fn build<'a>(
		&'a self,
		credentials: &'a JsonValue,
		capabilities: &'a Capabilities,
	) -> BackendFuture<'a, Arc<dyn Backend>>;
}

/// Explicit mapping from discriminator to driver factory.
#[derive(Clone, Default)]
pub struct BackendRegistry {
	factories: BTreeMap<BackendKind, Arc<dyn BackendFactory>>,
}
impl BackendRegistry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry holding the built-in ledger drivers.
	pub fn with_defaults() -> Result<Self> {
		let mut registry = Self::new();

		registry.register(
			BackendKind::new(cyclos::KIND).map_err(ConfigError::from)?,
			Arc::new(cyclos::CyclosFactory),
		);

		Ok(registry)
	}

	/// Registers (or replaces) the factory for `kind`, returning the previous one.
	pub fn register(
		&mut self,
		kind: BackendKind,
		factory: Arc<dyn BackendFactory>,
	) -> Option<Arc<dyn BackendFactory>> {
		self.factories.insert(kind, factory)
	}

	/// Builder-style [`register`](Self::register).
	pub fn with_factory(mut self, kind: BackendKind, factory: Arc<dyn BackendFactory>) -> Self {
		self.register(kind, factory);

		self
	}

	/// Factory registered for `kind`.
	pub fn get(&self, kind: &str) -> Option<Arc<dyn BackendFactory>> {
		self.factories.get(kind).cloned()
	}

	/// Returns `true` when a factory is registered for `kind`.
	pub fn contains(&self, kind: &str) -> bool {
		self.factories.contains_key(kind)
	}

	/// Registered discriminators in lexical order.
	pub fn kinds(&self) -> impl Iterator<Item = &BackendKind> {
		self.factories.keys()
	}
}
impl Debug for BackendRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BackendRegistry")
			.field("kinds", &self.factories.keys().collect::<Vec<_>>())
			.finish()
	}
}
