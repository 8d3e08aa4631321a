//! Capabilities injected into every session client and backend driver.
//!
//! The engine never reaches for an HTTP stack, an encoder, or persistent storage on its own.
//! Hosts hand a [`Capabilities`] bundle to the registry, which passes it down to each driver it
//! constructs.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, http::HttpTransport, store::CredentialStore};

/// Encodes strings as base64 (used for Basic credentials and session keys).
pub trait Base64Encoder
where
	Self: Send + Sync,
{
	/// Returns the padded, standard-alphabet base64 encoding of `input`.
	fn encode(&self, input: &str) -> String;
}

/// Default encoder backed by the `base64` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardBase64;
impl Base64Encoder for StandardBase64 {
	fn encode(&self, input: &str) -> String {
		STANDARD.encode(input)
	}
}

/// Notification sink invoked when a session's credentials were invalidated.
///
/// The call is fire-and-forget: implementations typically flag the UI so the user is prompted
/// to log in again. They must not block.
pub trait LoginRequestSink
where
	Self: Send + Sync,
{
	/// Signals that the hosting application should prompt for re-authentication.
	fn request_login(&self);
}
impl<F> LoginRequestSink for F
where
	F: Fn() + Send + Sync,
{
	fn request_login(&self) {
		self()
	}
}

/// Sink that ignores login requests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLoginSink;
impl LoginRequestSink for NoopLoginSink {
	fn request_login(&self) {}
}

/// Capability bundle handed to session clients and drivers.
#[derive(Clone)]
pub struct Capabilities {
	/// HTTP transport used for every outbound call.
	pub transport: Arc<dyn HttpTransport>,
	/// Base64 encoder.
	pub encoder: Arc<dyn Base64Encoder>,
	/// Durable token store.
	pub store: Arc<dyn CredentialStore>,
	/// Re-login notification sink.
	pub login_sink: Arc<dyn LoginRequestSink>,
}
impl Capabilities {
	/// Bundles a transport and store with the default encoder and a no-op login sink.
	pub fn new(transport: Arc<dyn HttpTransport>, store: Arc<dyn CredentialStore>) -> Self {
		Self {
			transport,
			encoder: Arc::new(StandardBase64),
			store,
			login_sink: Arc::new(NoopLoginSink),
		}
	}

	/// Replaces the base64 encoder.
	pub fn with_encoder(mut self, encoder: Arc<dyn Base64Encoder>) -> Self {
		self.encoder = encoder;

		self
	}

	/// Replaces the login-request sink.
	pub fn with_login_sink(mut self, sink: Arc<dyn LoginRequestSink>) -> Self {
		self.login_sink = sink;

		self
	}
}
#[cfg(feature = "reqwest")]
impl Capabilities {
	/// Bundles the default reqwest transport with the provided store.
	pub fn with_reqwest(store: Arc<dyn CredentialStore>) -> Self {
		Self::new(Arc::new(crate::http::ReqwestTransport::default()), store)
	}
}
impl Debug for Capabilities {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Capabilities(..)")
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
	// self
	use super::*;

	#[test]
	fn standard_encoder_pads() {
		assert_eq!(StandardBase64.encode("john:secret"), "am9objpzZWNyZXQ=");
	}

	#[test]
	fn closures_act_as_login_sinks() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let sink: Arc<dyn LoginRequestSink> = Arc::new(move || {
			counter.fetch_add(1, AtomicOrdering::SeqCst);
		});

		sink.request_login();
		sink.request_login();

		assert_eq!(calls.load(AtomicOrdering::SeqCst), 2);
	}
}
