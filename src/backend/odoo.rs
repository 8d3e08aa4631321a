//! Odoo administrative backend: identity, partner directory, and ledger credentials.
//!
//! The administrative backend is not a ledger. It authenticates the user, publishes the
//! credential payloads of every ledger wallet the user owns, and manages partner-level data
//! (contacts, favorites, transfer permissions, pending top-ups).

// self
use crate::{
	_prelude::*,
	capability::Capabilities,
	error::ConfigError,
	http::Method,
	id::{BackendId, BackendKind, Login},
	obs::{self, OperationKind, OperationSpan, Outcome},
	record::{self, Contact, CreditRequest},
	session::{
		AuthScheme, Endpoint, ResponseContext, ResponseKind, SessionClient, SessionConfig,
		SessionStrategy, html_title,
	},
};

/// Discriminator of the administrative backend.
pub const KIND: &str = "odoo";
/// Header carrying the Odoo API key.
pub const API_KEY_HEADER: &str = "API-KEY";
/// API version announced at login.
pub const API_VERSION: u32 = 9;

const PUBLIC_PREFIX: &str = "/lokavaluto_api/public";
const PRIVATE_PREFIX: &str = "/lokavaluto_api/private";
const ACCESS_DENIED_TITLE: &str = "odoo.exceptions.AccessDenied";

fn default_api_version() -> u32 {
	API_VERSION
}

/// Connection settings of the administrative backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdooConfig {
	/// Host or base URL.
	pub host: String,
	/// Database name sent at login.
	pub db_name: String,
	/// API version announced at login.
	#[serde(default = "default_api_version")]
	pub api_version: u32,
}
impl OdooConfig {
	/// Settings for `host` and `db_name` with the current API version.
	pub fn new(host: impl Into<String>, db_name: impl Into<String>) -> Self {
		Self { host: host.into(), db_name: db_name.into(), api_version: API_VERSION }
	}
}

/// Detects expired sessions: HTTP 401, or HTTP 500 with an `AccessDenied` error page.
#[derive(Clone, Copy, Debug, Default)]
pub struct OdooSessionStrategy;
impl SessionStrategy for OdooSessionStrategy {
	fn classify(&self, ctx: &ResponseContext<'_>) -> ResponseKind {
		match ctx.status {
			200..=299 => ResponseKind::Success,
			401 => ResponseKind::SessionExpired { reason: "Authentication Failed".into() },
			500 if html_title(ctx.body).is_some_and(|t| t.starts_with(ACCESS_DENIED_TITLE)) =>
				ResponseKind::SessionExpired { reason: "Authentication Failed".into() },
			_ => ResponseKind::Failure,
		}
	}
}

/// Outcome of a successful login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInfo {
	/// Login the session was opened for.
	pub login: Login,
	/// Odoo user id.
	pub uid: Option<i64>,
	/// Odoo partner id of the user.
	pub partner_id: Option<i64>,
	/// API version reported by the server.
	pub server_api_version: Option<u32>,
	/// Ledger credential payloads keyed by backend kind.
	pub backends: JsonValue,
	/// Prefetched partner profile.
	pub profile: JsonValue,
}

#[derive(Deserialize)]
struct AuthReply {
	#[serde(default)]
	status: Option<String>,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	error: JsonValue,
	#[serde(default)]
	api_token: Option<String>,
	#[serde(default)]
	api_version: Option<u32>,
	#[serde(default)]
	uid: Option<i64>,
	#[serde(default)]
	partner_id: Option<i64>,
	#[serde(default)]
	monujo_accounts: JsonValue,
	#[serde(default)]
	prefetch: JsonValue,
}

#[derive(Deserialize)]
struct CreditRequestWire {
	order_id: JsonValue,
	amount: Decimal,
	#[serde(with = "time::serde::timestamp")]
	date: OffsetDateTime,
	#[serde(default)]
	name: String,
	#[serde(default)]
	paid: bool,
}

/// Client of the administrative backend for one login.
#[derive(Debug)]
pub struct OdooAdmin {
	config: OdooConfig,
	session: Arc<SessionClient>,
	info: RwLock<Option<LoginInfo>>,
}
impl OdooAdmin {
	/// Creates an anonymous client; a previously stored API key is reused on first call.
	pub fn new(config: OdooConfig, login: Login, capabilities: Capabilities) -> Result<Self> {
		let endpoint = Endpoint::parse(&config.host)?;
		let kind = BackendKind::new(KIND).map_err(ConfigError::from)?;
		let session_config = SessionConfig::new(kind, login, endpoint)
			.with_auth_scheme(AuthScheme::header(API_KEY_HEADER))
			.with_strategy(Arc::new(OdooSessionStrategy));

		Ok(Self {
			config,
			session: Arc::new(SessionClient::new(session_config, capabilities)),
			info: RwLock::new(None),
		})
	}

	/// Underlying session.
	pub fn session(&self) -> &Arc<SessionClient> {
		&self.session
	}

	/// Information returned by the last successful login.
	pub fn login_info(&self) -> Option<LoginInfo> {
		self.info.read().clone()
	}

	/// Ledger credential payloads published at the last login.
	pub fn backend_credentials(&self) -> Option<JsonValue> {
		self.info.read().as_ref().map(|info| info.backends.clone())
	}

	/// Reuses a stored API key; returns whether one was found.
	pub async fn restore(&self) -> Result<bool> {
		self.session.restore().await
	}

	/// Authenticates with `password` using HTTP Basic credentials.
	///
	/// Rejected credentials fail with [`Error::InvalidCredentials`] and leave any stored API key
	/// untouched.
	pub async fn login(&self, password: &str) -> Result<LoginInfo> {
		let span = OperationSpan::new(OperationKind::Login, "odoo_login");

		obs::record_operation_outcome(OperationKind::Login, Outcome::Attempt);

		let result = obs::record_result(
			OperationKind::Login,
			span.instrument(self.authenticate(password)).await,
		);

		if let Err(e) = &result {
			tracing::warn!(error = %e, "Administrative backend login failed.");
		}

		result
	}

	/// Forgets the API key, locally and in the durable store.
	pub async fn logout(&self) -> Result<()> {
		*self.info.write() = None;

		self.session.logout().await
	}

	/// Profile of the logged-in user.
	pub async fn my_contact(&self) -> Result<Contact> {
		let raw = self.session.auth_get(&private("/partner/0"), None).await?;

		record::decode("contact", raw)
	}

	/// Marks `contact` as favorite of the logged-in user.
	pub async fn set_favorite(&self, contact: &mut Contact) -> Result<()> {
		let path = private(&format!("/partner/{}/favorite/set", contact.id_text()));

		self.session.auth_put(&path, None).await?;

		contact.is_favorite = true;

		Ok(())
	}

	/// Removes `contact` from the favorites of the logged-in user.
	pub async fn unset_favorite(&self, contact: &mut Contact) -> Result<()> {
		let path = private(&format!("/partner/{}/favorite/unset", contact.id_text()));

		self.session.auth_put(&path, None).await?;

		contact.is_favorite = false;

		Ok(())
	}

	/// Flips the favorite flag of `contact`.
	pub async fn toggle_favorite(&self, contact: &mut Contact) -> Result<()> {
		if contact.is_favorite {
			self.unset_favorite(contact).await
		} else {
			self.set_favorite(contact).await
		}
	}

	/// Asks whether a transfer between two wallets is permitted.
	pub async fn is_transfer_allowed(
		&self,
		sender_wallet: &str,
		recipient_wallet: &str,
	) -> Result<bool> {
		let query = serde_json::json!({
			"sender_wallet_ident": sender_wallet,
			"recipient_wallet_ident": recipient_wallet,
		});
		let raw =
			self.session.auth_get(&private("/partner/is_transaction_allowed"), Some(query)).await?;

		record::decode("transfer permission", raw)
	}

	/// Searches partners by name or e-mail; results feed
	/// [`Backend::make_recipients`](crate::backend::Backend::make_recipients).
	pub async fn search_partners(&self, value: &str) -> Result<Vec<JsonValue>> {
		let query = serde_json::json!({ "value": value });
		let raw = self.session.auth_get(&private("/partner/"), Some(query)).await?;

		record::decode_list("partner", raw)
	}

	/// Pending top-up requests targeting `backend`.
	pub async fn pending_topups(&self, backend: &BackendId) -> Result<Vec<CreditRequest>> {
		let query = serde_json::json!({ "backend_keys": [backend.as_str()] });
		let raw = self.session.auth_get(&private("/partner/pending-topup"), Some(query)).await?;

		Ok(record::decode_list::<CreditRequestWire>("credit request", raw)?
			.into_iter()
			.map(|wire| CreditRequest {
				backend: backend.clone(),
				order_id: wire.order_id,
				amount: wire.amount,
				date: wire.date,
				related: wire.name,
				paid: wire.paid,
			})
			.collect())
	}

	/// Cancels a pending top-up request.
	pub async fn cancel_topup(&self, request: &CreditRequest) -> Result<()> {
		let body = serde_json::json!({ "order_id": request.order_id });
		let reply =
			self.session.auth_post(&private("/partner/remove-pending-topup"), Some(body)).await?;

		match reply {
			JsonValue::Null | JsonValue::Bool(false) => Err(Error::ApiRequestFailed {
				reason: "Admin backend refused the removal of top-up request".into(),
			}),
			_ => Ok(()),
		}
	}

	async fn authenticate(&self, password: &str) -> Result<LoginInfo> {
		let login = self.session.identity().login.clone();
		let basic = self.session.capabilities().encoder.encode(&format!("{login}:{password}"));
		let authorization = format!("Basic {basic}");
		let body = serde_json::json!({
			"api_version": self.config.api_version,
			"db": self.config.db_name,
			"params": ["lcc_app"],
		});
		let raw = self
			.session
			.request(
				Method::Post,
				&public("/auth/authenticate"),
				Some(body),
				&[("Authorization", &authorization)],
			)
			.await?;
		let reply = record::decode::<AuthReply>("authentication reply", raw)?;

		if reply.status.as_deref() == Some("Error") {
			if reply.message.as_deref() == Some("access denied") {
				return Err(Error::InvalidCredentials { reason: "Access denied".into() });
			}

			let detail = match &reply.error {
				JsonValue::String(text) => text.clone(),
				other => other.to_string(),
			};

			return Err(Error::ApiRequestFailed {
				reason: format!("Could not obtain token: {detail}"),
			});
		}

		let Some(token) = reply.api_token.filter(|token| !token.is_empty()) else {
			return Err(Error::ApiRequestFailed {
				reason: "Could not obtain token: none returned".into(),
			});
		};

		if reply.api_version != Some(self.config.api_version) {
			tracing::warn!(
				client = self.config.api_version,
				server = ?reply.api_version,
				"API version mismatch between client and server."
			);
		}

		self.session.set_token(Some(&token)).await?;

		let info = LoginInfo {
			login,
			uid: reply.uid,
			partner_id: reply.partner_id,
			server_api_version: reply.api_version,
			backends: reply.monujo_accounts,
			profile: reply.prefetch.get("partner").cloned().unwrap_or_default(),
		};

		*self.info.write() = Some(info.clone());

		Ok(info)
	}
}

fn public(path: &str) -> String {
	format!("{PUBLIC_PREFIX}{path}")
}

fn private(path: &str) -> String {
	format!("{PRIVATE_PREFIX}{path}")
}
