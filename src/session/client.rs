//! Authenticated JSON REST client with token persistence and session-expiry handling.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	capability::Capabilities,
	http::{HttpRequest, HttpResponse, Method},
	id::{BackendKind, Login},
	obs::{self, OperationKind, OperationSpan, Outcome},
	session::{
		DefaultSessionStrategy, Endpoint, ResponseContext, ResponseKind, SessionIdentity,
		SessionStrategy, SessionToken,
	},
	store::StoreKey,
};

/// Headers attached to every request.
pub const COMMON_HEADERS: [(&str, &str); 2] =
	[("Content-Type", "application/json"), ("Accept", "application/json")];

/// How a token is rendered into the auth header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenFormat {
	/// Header value is the token itself.
	#[default]
	Raw,
	/// Header value is `Bearer <token>`.
	Bearer,
}

/// Name and format of the header carrying the session token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthScheme {
	/// Header name.
	pub header: String,
	/// Value format.
	pub format: TokenFormat,
}
impl AuthScheme {
	/// `Authorization: Bearer <token>`.
	pub fn bearer() -> Self {
		Self { header: "Authorization".into(), format: TokenFormat::Bearer }
	}

	/// `<name>: <token>`.
	pub fn header(name: impl Into<String>) -> Self {
		Self { header: name.into(), format: TokenFormat::Raw }
	}

	fn render(&self, token: &SessionToken) -> (String, String) {
		let value = match self.format {
			TokenFormat::Raw => token.expose().to_owned(),
			TokenFormat::Bearer => format!("Bearer {}", token.expose()),
		};

		(self.header.clone(), value)
	}
}
impl Default for AuthScheme {
	fn default() -> Self {
		Self::bearer()
	}
}

/// Static configuration of one backend session.
#[derive(Clone)]
pub struct SessionConfig {
	/// Backend endpoint.
	pub endpoint: Endpoint,
	/// Driver discriminator.
	pub kind: BackendKind,
	/// Login of the account the session belongs to.
	pub login: Login,
	/// Auth header scheme.
	pub scheme: AuthScheme,
	/// Response classification strategy.
	pub strategy: Arc<dyn SessionStrategy>,
}
impl SessionConfig {
	/// Creates a configuration with the bearer scheme and the default strategy.
	pub fn new(kind: BackendKind, login: Login, endpoint: Endpoint) -> Self {
		Self {
			endpoint,
			kind,
			login,
			scheme: AuthScheme::default(),
			strategy: Arc::new(DefaultSessionStrategy),
		}
	}

	/// Overrides the auth header scheme.
	pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
		self.scheme = scheme;

		self
	}

	/// Overrides the response classification strategy.
	pub fn with_strategy(mut self, strategy: Arc<dyn SessionStrategy>) -> Self {
		self.strategy = strategy;

		self
	}
}
impl Debug for SessionConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionConfig")
			.field("endpoint", &self.endpoint)
			.field("kind", &self.kind)
			.field("login", &self.login)
			.field("scheme", &self.scheme)
			.finish()
	}
}

/// Decoded JSON body plus the response metadata drivers sometimes need.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by lower-cased name.
	pub headers: BTreeMap<String, String>,
	/// Decoded body; an empty body decodes to `null`.
	pub body: JsonValue,
}
impl JsonResponse {
	/// Looks a header up case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}
}

#[derive(Clone, Debug, Default)]
enum SessionState {
	#[default]
	Anonymous,
	Authenticated {
		token: SessionToken,
		header: (String, String),
	},
}

/// REST client bound to one backend session.
///
/// The session is either fully authenticated (token and rendered auth header held in memory,
/// token persisted under [`store_key`](Self::store_key)) or fully anonymous. All mutations go
/// through [`set_token`](Self::set_token), which writes the durable store before touching memory
/// so a failed store write can never leave the two out of sync. The one exception is a rejected
/// token whose deletion failed: it leaves memory anyway and is refused when read back.
pub struct SessionClient {
	endpoint: Endpoint,
	identity: SessionIdentity,
	key: StoreKey,
	scheme: AuthScheme,
	strategy: Arc<dyn SessionStrategy>,
	capabilities: Capabilities,
	state: RwLock<SessionState>,
	// Rejected token the store failed to delete; never reloaded from the store.
	rejected: Mutex<Option<SessionToken>>,
	writer: AsyncMutex<()>,
}
impl SessionClient {
	/// Creates an anonymous client; stored tokens are picked up lazily.
	pub fn new(config: SessionConfig, capabilities: Capabilities) -> Self {
		let identity = SessionIdentity::new(config.kind, &config.endpoint, config.login);
		let key = identity.store_key(capabilities.encoder.as_ref());

		Self {
			endpoint: config.endpoint,
			identity,
			key,
			scheme: config.scheme,
			strategy: config.strategy,
			capabilities,
			state: RwLock::new(SessionState::Anonymous),
			rejected: Mutex::new(None),
			writer: AsyncMutex::new(()),
		}
	}

	/// Backend endpoint.
	pub fn endpoint(&self) -> &Endpoint {
		&self.endpoint
	}

	/// Logical identity of the session.
	pub fn identity(&self) -> &SessionIdentity {
		&self.identity
	}

	/// Durable-store key holding the session token.
	pub fn store_key(&self) -> &StoreKey {
		&self.key
	}

	/// Capabilities the client was built with.
	pub fn capabilities(&self) -> &Capabilities {
		&self.capabilities
	}

	/// Returns `true` when a token is held in memory.
	pub fn is_authenticated(&self) -> bool {
		matches!(*self.state.read(), SessionState::Authenticated { .. })
	}

	/// Token currently held in memory.
	pub fn token(&self) -> Option<SessionToken> {
		match &*self.state.read() {
			SessionState::Authenticated { token, .. } => Some(token.clone()),
			SessionState::Anonymous => None,
		}
	}

	/// Auth header currently installed, as `(name, value)`.
	pub fn auth_header(&self) -> Option<(String, String)> {
		match &*self.state.read() {
			SessionState::Authenticated { header, .. } => Some(header.clone()),
			SessionState::Anonymous => None,
		}
	}

	/// Installs (`Some`) or clears (`None` or empty) the session token.
	///
	/// Installing persists the token, then renders the auth header. Clearing deletes the store
	/// entry, then drops token and header. Store failures abort before memory is touched.
	pub async fn set_token(&self, token: Option<&str>) -> Result<()> {
		let _writer = self.writer.lock().await;

		self.set_token_locked(token).await
	}

	/// Forgets the session, locally and in the durable store.
	pub async fn logout(&self) -> Result<()> {
		self.set_token(None).await
	}

	/// Loads the stored token into memory when none is held; returns whether one is now held.
	pub async fn restore(&self) -> Result<bool> {
		Ok(self.ensure_auth_header().await?.is_some())
	}

	/// Plain request returning the decoded JSON body.
	pub async fn request(
		&self,
		method: Method,
		path: &str,
		data: Option<JsonValue>,
		headers: &[(&str, &str)],
	) -> Result<JsonValue> {
		Ok(self.request_with_meta(method, path, data, headers).await?.body)
	}

	/// Plain request returning body, status, and headers.
	pub async fn request_with_meta(
		&self,
		method: Method,
		path: &str,
		data: Option<JsonValue>,
		headers: &[(&str, &str)],
	) -> Result<JsonResponse> {
		let span = OperationSpan::new(OperationKind::Request, "request");

		obs::record_operation_outcome(OperationKind::Request, Outcome::Attempt);

		let result = span
			.instrument(async move {
				let response = self.send(method, path, data, headers, None).await?;

				if !response.is_success() {
					return Err(Error::http(response.status, &response.body));
				}

				decode(response)
			})
			.await;

		obs::record_result(OperationKind::Request, result)
	}

	/// Authenticated request returning the decoded JSON body.
	pub async fn authenticated_request(
		&self,
		method: Method,
		path: &str,
		data: Option<JsonValue>,
		headers: &[(&str, &str)],
	) -> Result<JsonValue> {
		Ok(self.authenticated_request_with_meta(method, path, data, headers).await?.body)
	}

	/// Authenticated request returning body, status, and headers.
	///
	/// Fails with [`Error::TokenRequired`] when neither memory nor the store hold a token. When
	/// the strategy classifies the response as an expired session and the rejected token is still
	/// installed, it is dropped from memory and store and the login-request sink is notified
	/// once; [`Error::AuthenticationRequired`] is returned either way. If the store entry cannot
	/// be deleted the token is still dropped from memory and is not reloaded. The request is never
	/// retried.
	pub async fn authenticated_request_with_meta(
		&self,
		method: Method,
		path: &str,
		data: Option<JsonValue>,
		headers: &[(&str, &str)],
	) -> Result<JsonResponse> {
		let span = OperationSpan::new(OperationKind::Request, "authenticated_request");

		obs::record_operation_outcome(OperationKind::Request, Outcome::Attempt);

		let result = span
			.instrument(async move {
				let (token, header) =
					self.ensure_auth_header().await?.ok_or(Error::TokenRequired)?;
				let response = self.send(method, path, data, headers, Some(header)).await?;
				let full_path = self.endpoint.request_path(path);
				let ctx = ResponseContext {
					method,
					path: &full_path,
					status: response.status,
					body: &response.body,
				};

				match self.strategy.classify(&ctx) {
					ResponseKind::Success => decode(response),
					ResponseKind::SessionExpired { reason } => {
						self.invalidate(&token).await;

						Err(Error::AuthenticationRequired { status: Some(response.status), reason })
					},
					ResponseKind::Failure => Err(Error::http(response.status, &response.body)),
				}
			})
			.await;

		obs::record_result(OperationKind::Request, result)
	}

	/// `GET` without authentication.
	pub async fn get(&self, path: &str, data: Option<JsonValue>) -> Result<JsonValue> {
		self.request(Method::Get, path, data, &[]).await
	}

	/// `POST` without authentication.
	pub async fn post(&self, path: &str, data: Option<JsonValue>) -> Result<JsonValue> {
		self.request(Method::Post, path, data, &[]).await
	}

	/// `PUT` without authentication.
	pub async fn put(&self, path: &str, data: Option<JsonValue>) -> Result<JsonValue> {
		self.request(Method::Put, path, data, &[]).await
	}

	/// `DELETE` without authentication.
	pub async fn delete(&self, path: &str, data: Option<JsonValue>) -> Result<JsonValue> {
		self.request(Method::Delete, path, data, &[]).await
	}

	/// Authenticated `GET`.
	pub async fn auth_get(&self, path: &str, data: Option<JsonValue>) -> Result<JsonValue> {
		self.authenticated_request(Method::Get, path, data, &[]).await
	}

	/// Authenticated `POST`.
	pub async fn auth_post(&self, path: &str, data: Option<JsonValue>) -> Result<JsonValue> {
		self.authenticated_request(Method::Post, path, data, &[]).await
	}

	/// Authenticated `PUT`.
	pub async fn auth_put(&self, path: &str, data: Option<JsonValue>) -> Result<JsonValue> {
		self.authenticated_request(Method::Put, path, data, &[]).await
	}

	/// Authenticated `DELETE`.
	pub async fn auth_delete(&self, path: &str, data: Option<JsonValue>) -> Result<JsonValue> {
		self.authenticated_request(Method::Delete, path, data, &[]).await
	}

	async fn set_token_locked(&self, token: Option<&str>) -> Result<()> {
		let store = self.capabilities.store.as_ref();

		match token.and_then(SessionToken::new) {
			Some(token) => {
				store.set(&self.key, token.expose()).await?;

				let header = self.scheme.render(&token);

				*self.state.write() = SessionState::Authenticated { token, header };
			},
			None => {
				store.delete(&self.key).await?;

				*self.state.write() = SessionState::Anonymous;
			},
		}

		// Store and memory agree again.
		*self.rejected.lock() = None;

		Ok(())
	}

	async fn ensure_auth_header(&self) -> Result<Option<(SessionToken, (String, String))>> {
		if let Some(current) = self.authenticated_snapshot() {
			return Ok(Some(current));
		}

		let _writer = self.writer.lock().await;

		if let Some(current) = self.authenticated_snapshot() {
			return Ok(Some(current));
		}

		let Some(token) = SessionToken::from_stored(self.capabilities.store.get(&self.key).await?)
		else {
			return Ok(None);
		};

		if self.rejected.lock().as_ref() == Some(&token) {
			return Ok(None);
		}

		let header = self.scheme.render(&token);

		*self.state.write() =
			SessionState::Authenticated { token: token.clone(), header: header.clone() };

		Ok(Some((token, header)))
	}

	fn authenticated_snapshot(&self) -> Option<(SessionToken, (String, String))> {
		match &*self.state.read() {
			SessionState::Authenticated { token, header } => Some((token.clone(), header.clone())),
			SessionState::Anonymous => None,
		}
	}

	/// Drops `rejected` and asks for a new login, unless it was already replaced.
	async fn invalidate(&self, rejected: &SessionToken) {
		let writer = self.writer.lock().await;

		// A concurrent login or invalidation already replaced the rejected token.
		if self.token().as_ref() != Some(rejected) {
			return;
		}
		if let Err(e) = self.set_token_locked(None).await {
			tracing::warn!(
				session = %self.identity,
				error = %e,
				"Failed to delete rejected session token; dropping it from memory only."
			);

			*self.rejected.lock() = Some(rejected.clone());
			*self.state.write() = SessionState::Anonymous;
		}

		drop(writer);
		tracing::info!(session = %self.identity, "Session rejected by backend; login requested.");
		self.capabilities.login_sink.request_login();
	}

	async fn send(
		&self,
		method: Method,
		path: &str,
		data: Option<JsonValue>,
		headers: &[(&str, &str)],
		auth: Option<(String, String)>,
	) -> Result<HttpResponse> {
		self.endpoint.validate_host().inspect_err(|_| {
			tracing::warn!(host = %self.endpoint.host, "Refusing request to invalid host.");
		})?;

		let mut all_headers = COMMON_HEADERS
			.iter()
			.map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
			.collect::<BTreeMap<_, _>>();

		if let Some((name, value)) = auth {
			all_headers.insert(name, value);
		}
		for (name, value) in headers {
			all_headers.insert((*name).to_owned(), (*value).to_owned());
		}

		let mut full_path = self.endpoint.request_path(path);
		let body = if method.data_in_query() {
			if let Some(data) = &data {
				append_query(&mut full_path, data);
			}

			None
		} else {
			data
		};
		let request = HttpRequest {
			protocol: self.endpoint.protocol.clone(),
			host: self.endpoint.host.clone(),
			port: self.endpoint.port,
			path: full_path,
			method,
			headers: all_headers,
			body,
		};

		self.capabilities.transport.send(request).await.map_err(|e| {
			tracing::warn!(%method, path, host = %self.endpoint.host, "Request failed.");

			Error::from(e)
		})
	}
}
impl Debug for SessionClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("endpoint", &self.endpoint)
			.field("identity", &self.identity)
			.field("authenticated", &self.is_authenticated())
			.finish()
	}
}

fn decode(response: HttpResponse) -> Result<JsonResponse> {
	let body = if response.body.trim().is_empty() {
		JsonValue::Null
	} else {
		serde_json::from_str(&response.body)
			.map_err(|e| Error::invalid_json(&response.body, e))?
	};

	Ok(JsonResponse { status: response.status, headers: response.headers, body })
}

fn append_query(path: &mut String, data: &JsonValue) {
	let JsonValue::Object(fields) = data else {
		return;
	};

	if fields.is_empty() {
		return;
	}

	let mut serializer = form_urlencoded::Serializer::new(String::new());

	for (name, value) in fields {
		match value {
			JsonValue::Null => continue,
			JsonValue::String(text) => serializer.append_pair(name, text),
			other => serializer.append_pair(name, &other.to_string()),
		};
	}

	let query = serializer.finish();

	if query.is_empty() {
		return;
	}

	path.push(if path.contains('?') { '&' } else { '?' });
	path.push_str(&query);
}
