//! Cyclos ledger driver.

// self
use crate::{
	_prelude::*,
	backend::{Backend, BackendFactory, BackendFuture},
	capability::Capabilities,
	error::ConfigError,
	http::Method,
	id::{BackendId, BackendKind, Login},
	record::{self, Account, Contact, Payment, Recipient, Transaction},
	session::{AuthScheme, Endpoint, SessionClient, SessionConfig},
	stream::{BoxSource, Page, PageFetcher, PageFuture, PagedSource},
};

/// Discriminator of the Cyclos driver.
pub const KIND: &str = "cyclos";
/// Host used when the credential payload names none.
pub const DEFAULT_HOST: &str = "cyclos.dev.lokavaluto.fr";
/// Header carrying the Cyclos session token.
pub const SESSION_HEADER: &str = "Session-token";
/// Header carrying the continuation flag of paged listings.
pub const HAS_NEXT_PAGE_HEADER: &str = "X-Has-Next-Page";

const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_PAYMENT_TYPE: &str = "user.toUser";

/// Credential payload published by the administrative backend for one Cyclos wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclosCredentials {
	/// Host or base URL; defaults to [`DEFAULT_HOST`].
	#[serde(default)]
	pub host: Option<String>,
	/// Owner identifier of the wallet.
	#[serde(alias = "owner_id")]
	pub cyclos_id: String,
	/// Session token issued for the owner.
	#[serde(default, alias = "token")]
	pub cyclos_token: Option<String>,
	/// Page size requested for transaction listings.
	#[serde(default)]
	pub page_size: Option<u32>,
	/// Transfer type used for payments.
	#[serde(default)]
	pub payment_type: Option<String>,
}

/// Driver bound to one Cyclos owner.
#[derive(Debug)]
pub struct CyclosBackend {
	id: BackendId,
	kind: BackendKind,
	owner_id: String,
	page_size: u32,
	payment_type: String,
	session: Arc<SessionClient>,
}
impl CyclosBackend {
	/// Builds the driver and installs the payload's session token, if any.
	pub async fn connect(
		credentials: CyclosCredentials,
		capabilities: Capabilities,
	) -> Result<Self> {
		if credentials.cyclos_id.is_empty() {
			return Err(ConfigError::MissingCredentialField { field: "cyclos_id" }.into());
		}

		let endpoint = Endpoint::parse(credentials.host.as_deref().unwrap_or(DEFAULT_HOST))?;
		let kind = BackendKind::new(KIND).map_err(ConfigError::from)?;
		let login = Login::new(&credentials.cyclos_id).map_err(ConfigError::from)?;
		let id = BackendId::new(format!("{KIND}:{}", endpoint.authority_and_path()))
			.map_err(ConfigError::from)?;
		let config = SessionConfig::new(kind.clone(), login, endpoint)
			.with_auth_scheme(AuthScheme::header(SESSION_HEADER));
		let session = Arc::new(SessionClient::new(config, capabilities));

		if let Some(token) = credentials.cyclos_token.as_deref() {
			session.set_token(Some(token)).await?;
		}

		Ok(Self {
			id,
			kind,
			owner_id: credentials.cyclos_id,
			page_size: credentials.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
			payment_type: credentials.payment_type.unwrap_or_else(|| DEFAULT_PAYMENT_TYPE.into()),
			session,
		})
	}

	/// Owner identifier of the wallet.
	pub fn owner_id(&self) -> &str {
		&self.owner_id
	}

	/// Underlying session.
	pub fn session(&self) -> &Arc<SessionClient> {
		&self.session
	}
}
impl Backend for CyclosBackend {
	fn id(&self) -> &BackendId {
		&self.id
	}

	fn kind(&self) -> &BackendKind {
		&self.kind
	}

	fn accounts(&self) -> BackendFuture<'_, Vec<Account>> {
		Box::pin(async move {
			let raw = self.session.auth_get(&format!("/{}/accounts", self.owner_id), None).await?;
			let accounts = record::decode_list::<AccountWire>("cyclos account", raw)?;

			Ok(accounts
				.into_iter()
				.map(|wire| Account {
					backend: self.id.clone(),
					owner_id: self.owner_id.clone(),
					id: wire.id,
					balance: wire.status.balance,
					symbol: display(&wire.currency).unwrap_or_default(),
				})
				.collect())
		})
	}

	fn transactions(&self) -> BoxSource<Transaction> {
		let fetcher = TransactionPages {
			backend: self.id.clone(),
			owner_id: self.owner_id.clone(),
			page_size: self.page_size,
			session: self.session.clone(),
		};

		Box::new(PagedSource::new(Arc::new(fetcher)))
	}

	fn make_recipients(&self, raw: &JsonValue) -> Result<Vec<Recipient>> {
		let Some(owners) = raw
			.get("monujo_backends")
			.and_then(|backends| backends.get(self.id.as_str()))
			.and_then(JsonValue::as_array)
		else {
			return Ok(Vec::new());
		};
		let contact = record::decode::<Contact>("contact", raw.clone())?;

		Ok(owners
			.iter()
			.filter_map(|owner| display(owner))
			.map(|owner_id| Recipient {
				backend: self.id.clone(),
				owner_id,
				contact: contact.clone(),
			})
			.collect())
	}

	fn transfer<'a>(
		&'a self,
		recipient: &'a Recipient,
		amount: Decimal,
		description: &'a str,
	) -> BackendFuture<'a, Payment> {
		Box::pin(async move {
			let body = serde_json::json!({
				"amount": amount.to_string(),
				"description": description,
				"subject": recipient.owner_id,
				"type": self.payment_type,
			});
			let raw =
				self.session.auth_post(&format!("/{}/payments", self.owner_id), Some(body)).await?;
			let wire = record::decode::<PaymentWire>("cyclos payment", raw)?;

			Ok(Payment {
				backend: self.id.clone(),
				id: wire.id,
				amount: wire.amount,
				date: wire.date,
				description: wire.description.unwrap_or_default(),
				from: wire.from,
				to: wire.to,
			})
		})
	}
}

/// Factory registered under [`KIND`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CyclosFactory;
impl BackendFactory for CyclosFactory {
	fn build<'a>(
		&'a self,
		credentials: &'a JsonValue,
		capabilities: &'a Capabilities,
	) -> BackendFuture<'a, Arc<dyn Backend>> {
		Box::pin(async move {
			let credentials =
				record::decode::<CyclosCredentials>("cyclos credentials", credentials.clone())?;
			let backend = CyclosBackend::connect(credentials, capabilities.clone()).await?;

			Ok(Arc::new(backend) as Arc<dyn Backend>)
		})
	}
}

struct TransactionPages {
	backend: BackendId,
	owner_id: String,
	page_size: u32,
	session: Arc<SessionClient>,
}
impl PageFetcher<Transaction> for TransactionPages {
	fn fetch_page(&self, page: u32) -> PageFuture<'_, Transaction> {
		Box::pin(async move {
			let query = serde_json::json!({ "page": page, "pageSize": self.page_size });
			let response = self
				.session
				.authenticated_request_with_meta(
					Method::Get,
					&format!("/{}/transactions", self.owner_id),
					Some(query),
					&[],
				)
				.await?;
			let has_more = response
				.header(HAS_NEXT_PAGE_HEADER)
				.is_some_and(|flag| flag.trim().eq_ignore_ascii_case("true"));
			let items = record::decode_list::<TransactionWire>("cyclos transaction", response.body)?
				.into_iter()
				.map(|wire| wire.into_record(&self.backend))
				.collect();

			Ok(Page { items, has_more })
		})
	}
}

#[derive(Deserialize)]
struct AccountWire {
	id: String,
	status: AccountStatusWire,
	#[serde(default)]
	currency: JsonValue,
}

#[derive(Deserialize)]
struct AccountStatusWire {
	balance: Decimal,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionWire {
	id: String,
	amount: Decimal,
	#[serde(default)]
	currency: JsonValue,
	#[serde(with = "time::serde::rfc3339")]
	date: OffsetDateTime,
	#[serde(default)]
	description: Option<String>,
	#[serde(default)]
	kind: Option<String>,
	#[serde(default)]
	related: JsonValue,
	#[serde(default)]
	related_kind: Option<String>,
	#[serde(default)]
	related_user: Option<JsonValue>,
}
impl TransactionWire {
	fn into_record(self, backend: &BackendId) -> Transaction {
		Transaction {
			backend: backend.clone(),
			id: self.id,
			amount: self.amount,
			currency: display(&self.currency).unwrap_or_default(),
			date: self.date,
			description: self.description.unwrap_or_default(),
			kind: self.kind,
			related: display(&self.related),
			related_kind: self.related_kind,
			related_user: self.related_user,
		}
	}
}

#[derive(Deserialize)]
struct PaymentWire {
	id: String,
	amount: Decimal,
	#[serde(with = "time::serde::rfc3339")]
	date: OffsetDateTime,
	#[serde(default)]
	description: Option<String>,
	#[serde(default)]
	from: JsonValue,
	#[serde(default)]
	to: JsonValue,
}

/// Human-readable rendering of a Cyclos reference (plain string or `{display|symbol|name}`).
fn display(value: &JsonValue) -> Option<String> {
	match value {
		JsonValue::String(text) => Some(text.clone()),
		JsonValue::Number(number) => Some(number.to_string()),
		JsonValue::Object(fields) => ["display", "symbol", "name", "id"]
			.iter()
			.find_map(|key| fields.get(*key).and_then(JsonValue::as_str))
			.map(str::to_owned),
		_ => None,
	}
}
