//! Transport capability used by every session client.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. Callers inject an
//! implementation (typically behind `Arc<dyn HttpTransport>`) and the session client hands it
//! fully described [`HttpRequest`]s. Transports report network failures as [`TransportError`]
//! and must not interpret status codes or bodies; classification happens in the session layer.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Executes raw HTTP exchanges on behalf of a session client.
pub trait HttpTransport
where
	Self: Send + Sync,
{
	/// Sends `request` and resolves with the raw response, whatever its status.
	fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// HTTP verbs used by backend drivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}

	/// Returns `true` when request data travels in the query string rather than the body.
	pub const fn data_in_query(self) -> bool {
		matches!(self, Method::Get | Method::Delete)
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully resolved request handed to a transport.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
	/// URL scheme (`https`, `http`).
	pub protocol: String,
	/// Host name or IP literal.
	pub host: String,
	/// Explicit port, when not the scheme default.
	pub port: Option<u16>,
	/// Absolute path including any query string.
	pub path: String,
	/// HTTP verb.
	pub method: Method,
	/// Request headers.
	pub headers: BTreeMap<String, String>,
	/// JSON body, if any.
	pub body: Option<JsonValue>,
}
impl HttpRequest {
	/// Assembles the absolute URL targeted by the request.
	pub fn url(&self) -> Result<Url, ConfigError> {
		let authority = match self.port {
			Some(port) => format!("{}:{port}", self.host),
			None => self.host.clone(),
		};

		Url::parse(&format!("{}://{authority}{}", self.protocol, self.path))
			.map_err(|source| ConfigError::InvalidUrl { source })
	}
}

/// Raw response returned by a transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by lower-cased name.
	pub headers: BTreeMap<String, String>,
	/// Response body decoded as text.
	pub body: String,
}
impl HttpResponse {
	/// Builds a response with the provided status and body and no headers.
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Adds a header, normalizing its name to lower case.
	pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.insert(name.to_ascii_lowercase(), value.into());

		self
	}

	/// Looks a header up case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] implementing [`HttpTransport`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
		let url = request.url().map_err(|e| TransportError::network(&request.host, e))?;
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Delete => reqwest::Method::DELETE,
		};
		let mut builder = self.0.request(method, url);

		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(body) = &request.body {
			let bytes =
				serde_json::to_vec(body).map_err(|e| TransportError::network(&request.host, e))?;

			builder = builder.body(bytes);
		}

		let response =
			builder.send().await.map_err(|e| TransportError::network(&request.host, e))?;
		let status = response.status().as_u16();
		let headers = response
			.headers()
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|v| (name.as_str().to_ascii_lowercase(), v.to_owned()))
			})
			.collect();
		let body = response.text().await.map_err(|e| TransportError::network(&request.host, e))?;

		Ok(HttpResponse { status, headers, body })
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(self.execute(request))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn request(port: Option<u16>, path: &str) -> HttpRequest {
		HttpRequest {
			protocol: "https".into(),
			host: "ledger.example.com".into(),
			port,
			path: path.into(),
			method: Method::Get,
			headers: BTreeMap::new(),
			body: None,
		}
	}

	#[test]
	fn url_includes_port_and_query() {
		let url = request(Some(8443), "/api/accounts?page=2")
			.url()
			.expect("Request URL should assemble.");

		assert_eq!(url.as_str(), "https://ledger.example.com:8443/api/accounts?page=2");
		assert_eq!(
			request(None, "/x").url().expect("Request URL should assemble.").as_str(),
			"https://ledger.example.com/x"
		);
	}

	#[test]
	fn response_headers_are_case_insensitive() {
		let response = HttpResponse::new(200, "[]").with_header("X-Has-Next-Page", "true");

		assert_eq!(response.header("x-has-next-page"), Some("true"));
		assert_eq!(response.header("X-HAS-NEXT-PAGE"), Some("true"));
		assert!(response.is_success());
		assert!(!HttpResponse::new(401, "").is_success());
	}

	#[test]
	fn ipv6_hosts_keep_their_brackets() {
		let request = HttpRequest {
			protocol: "http".into(),
			host: "[::1]".into(),
			..request(Some(8080), "/api/accounts")
		};

		assert_eq!(
			request.url().expect("IPv6 URL should assemble.").as_str(),
			"http://[::1]:8080/api/accounts"
		);
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn unreachable_hosts_are_network_errors() {
		let request = HttpRequest {
			protocol: "http".into(),
			host: "127.0.0.1".into(),
			..request(Some(1), "/")
		};
		let err = ReqwestTransport::default()
			.send(request)
			.await
			.expect_err("Nothing should listen on port 1.");

		assert!(matches!(&err, TransportError::Network { host, .. } if host == "127.0.0.1"));
	}
}
