//! Logical session identity and the durable-store key derived from it.

// self
use crate::{
	_prelude::*,
	capability::Base64Encoder,
	id::{BackendKind, Login},
	session::Endpoint,
	store::StoreKey,
};

/// Who a session is authenticated as, and against which backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionIdentity {
	/// Driver discriminator.
	pub kind: BackendKind,
	/// Host, port, and path prefix of the backend.
	pub location: String,
	/// Login of the authenticated account.
	pub login: Login,
}
impl SessionIdentity {
	/// Builds the identity for `login` on `endpoint`.
	pub fn new(kind: BackendKind, endpoint: &Endpoint, login: Login) -> Self {
		Self { kind, location: endpoint.authority_and_path(), login }
	}

	/// Composite identifier `kind:location:login`.
	pub fn composite(&self) -> String {
		format!("{}:{}:{}", self.kind, self.location, self.login)
	}

	/// Derives the URL-safe, unpadded base64 store key for this identity.
	pub fn store_key(&self, encoder: &dyn Base64Encoder) -> StoreKey {
		let encoded = encoder
			.encode(&self.composite())
			.chars()
			.filter(|c| *c != '=')
			.map(|c| match c {
				'+' => '-',
				'/' => '_',
				other => other,
			})
			.collect::<String>();

		StoreKey::new(encoded)
	}
}
impl Display for SessionIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.composite())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::capability::StandardBase64;

	fn identity(host: &str, login: &str) -> SessionIdentity {
		let endpoint = Endpoint::parse(host).expect("Endpoint fixture should parse.");

		SessionIdentity::new(
			BackendKind::new("cyclos").expect("Backend kind fixture should be valid."),
			&endpoint,
			Login::new(login).expect("Login fixture should be valid."),
		)
	}

	#[test]
	fn store_key_is_unpadded_base64_of_composite() {
		let identity = identity("ledger.example.com", "john");

		assert_eq!(identity.composite(), "cyclos:ledger.example.com:john");
		assert_eq!(
			identity.store_key(&StandardBase64).as_str(),
			"Y3ljbG9zOmxlZGdlci5leGFtcGxlLmNvbTpqb2hu"
		);
	}

	#[test]
	fn store_key_is_url_safe_and_distinct_per_identity() {
		let a = identity("ledger.example.com", "a?>").store_key(&StandardBase64);
		let b = identity("ledger.example.com", "b?>").store_key(&StandardBase64);

		assert_ne!(a, b);

		for key in [a, b] {
			assert!(!key.as_str().contains(['+', '/', '=']), "{key} must be URL-safe.");
		}
	}
}
