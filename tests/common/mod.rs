//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicBool, AtomicUsize, Ordering},
};
// crates.io
use parking_lot::Mutex;
// self
use finbridge::{
	capability::{Capabilities, LoginRequestSink},
	error::TransportError,
	http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportFuture},
	store::{CredentialStore, MemoryStore, StoreError, StoreFuture, StoreKey},
};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Transport answering from a closure and recording every request it receives.
pub struct ScriptedTransport {
	handler: Box<Handler>,
	requests: Mutex<Vec<HttpRequest>>,
}
impl ScriptedTransport {
	pub fn new<F>(handler: F) -> Arc<Self>
	where
		F: 'static + Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
	{
		Arc::new(Self { handler: Box::new(handler), requests: Mutex::new(Vec::new()) })
	}

	pub fn requests(&self) -> Vec<HttpRequest> {
		self.requests.lock().clone()
	}

	pub fn calls(&self) -> usize {
		self.requests.lock().len()
	}
}
impl HttpTransport for ScriptedTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		let response = (self.handler)(&request);

		self.requests.lock().push(request);

		Box::pin(async move { response })
	}
}

/// Store wrapper counting writes and optionally failing them.
#[derive(Default)]
pub struct RecordingStore {
	inner: MemoryStore,
	sets: AtomicUsize,
	deletes: AtomicUsize,
	fail_writes: AtomicBool,
}
impl RecordingStore {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn sets(&self) -> usize {
		self.sets.load(Ordering::SeqCst)
	}

	pub fn deletes(&self) -> usize {
		self.deletes.load(Ordering::SeqCst)
	}

	pub fn fail_writes(&self, fail: bool) {
		self.fail_writes.store(fail, Ordering::SeqCst);
	}

	pub fn inner(&self) -> &MemoryStore {
		&self.inner
	}

	fn write_guard(&self) -> Result<(), StoreError> {
		if self.fail_writes.load(Ordering::SeqCst) {
			Err(StoreError::Backend { message: "disk full".into() })
		} else {
			Ok(())
		}
	}
}
impl CredentialStore for RecordingStore {
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>> {
		self.inner.get(key)
	}

	fn set<'a>(&'a self, key: &'a StoreKey, value: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.write_guard()?;
			self.sets.fetch_add(1, Ordering::SeqCst);

			self.inner.set(key, value).await
		})
	}

	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			self.write_guard()?;
			self.deletes.fetch_add(1, Ordering::SeqCst);

			self.inner.delete(key).await
		})
	}
}

/// Login sink counting notifications.
#[derive(Default)]
pub struct CountingSink(AtomicUsize);
impl CountingSink {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn calls(&self) -> usize {
		self.0.load(Ordering::SeqCst)
	}
}
impl LoginRequestSink for CountingSink {
	fn request_login(&self) {
		self.0.fetch_add(1, Ordering::SeqCst);
	}
}

/// Capabilities over `transport` with a recording store and counting sink.
pub fn capabilities(
	transport: Arc<dyn HttpTransport>,
) -> (Capabilities, Arc<RecordingStore>, Arc<CountingSink>) {
	let store = RecordingStore::new();
	let sink = CountingSink::new();
	let capabilities =
		Capabilities::new(transport, store.clone()).with_login_sink(sink.clone());

	(capabilities, store, sink)
}

/// Capabilities backed by the reqwest transport.
pub fn reqwest_capabilities() -> (Capabilities, Arc<RecordingStore>, Arc<CountingSink>) {
	capabilities(Arc::new(ReqwestTransport::default()))
}

/// `http://127.0.0.1:<port>` base URL of a mock server.
pub fn base_url(port: u16) -> String {
	format!("http://127.0.0.1:{port}")
}

/// JSON response with the given status.
pub fn json(status: u16, body: serde_json::Value) -> HttpResponse {
	HttpResponse::new(status, body.to_string()).with_header("content-type", "application/json")
}
