//! Backend endpoint parsing and host validation.

// crates.io
use url::Host;
// self
use crate::{_prelude::*, error::ConfigError};

const DEFAULT_PROTOCOL: &str = "https";
const MAX_LABEL_LEN: usize = 63;

/// Protocol, host, port, and path prefix shared by every call of one session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
	/// URL scheme, `http` or `https`; defaults to `https` when the input carries none.
	pub protocol: String,
	/// Host name or IP literal; IPv6 literals keep their brackets.
	pub host: String,
	/// Explicit non-default port, if any.
	pub port: Option<u16>,
	/// Path prefix prepended to every request path; empty or starting with `/`.
	pub path: String,
}
impl Endpoint {
	/// Parses `host`, `host/prefix`, or `protocol://host[:port]/prefix`.
	///
	/// Trailing slashes are dropped. Credentials, queries, and fragments are rejected. The host
	/// name rules are only applied by [`validate_host`](Self::validate_host), which runs before
	/// each call.
	pub fn parse(host_or_url: &str) -> Result<Self, ConfigError> {
		let invalid = || ConfigError::InvalidConnectionDetails { host: host_or_url.to_owned() };
		let trimmed = host_or_url.trim();
		let url = if trimmed.contains("://") {
			Url::parse(trimmed)
		} else {
			Url::parse(&format!("{DEFAULT_PROTOCOL}://{trimmed}"))
		}
		.map_err(|_| invalid())?;

		if !matches!(url.scheme(), "http" | "https")
			|| !url.username().is_empty()
			|| url.password().is_some()
			|| url.query().is_some()
			|| url.fragment().is_some()
		{
			return Err(invalid());
		}

		let host = url.host_str().filter(|host| !host.is_empty()).ok_or_else(invalid)?;

		Ok(Self {
			protocol: url.scheme().to_owned(),
			host: host.to_owned(),
			port: url.port(),
			path: url.path().trim_end_matches('/').to_owned(),
		})
	}

	/// Checks that the host is a syntactically valid DNS name or an IP literal.
	pub fn validate_host(&self) -> Result<(), ConfigError> {
		let valid = match Host::parse(&self.host) {
			Ok(Host::Ipv4(_) | Host::Ipv6(_)) => true,
			Ok(Host::Domain(domain)) => is_valid_domain(&domain),
			Err(_) => false,
		};

		if valid {
			Ok(())
		} else {
			Err(ConfigError::InvalidConnectionDetails { host: self.host.clone() })
		}
	}

	/// Joins the path prefix with a request path.
	pub fn request_path(&self, path: &str) -> String {
		format!("{}/{}", self.path, path.trim_start_matches('/'))
	}

	/// Host, port, and prefix without the protocol; used in session identities.
	pub fn authority_and_path(&self) -> String {
		match self.port {
			Some(port) => format!("{}:{port}{}", self.host, self.path),
			None => format!("{}{}", self.host, self.path),
		}
	}
}
impl FromStr for Endpoint {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}://{}", self.protocol, self.authority_and_path())
	}
}

fn is_valid_domain(domain: &str) -> bool {
	let labels = domain.split('.').collect::<Vec<_>>();
	let Some((tld, _)) = labels.split_last() else {
		return false;
	};

	labels.len() >= 2
		&& labels.iter().all(|label| is_valid_label(label))
		&& tld.len() >= 2
		&& tld.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_valid_label(label: &str) -> bool {
	!label.is_empty()
		&& label.len() <= MAX_LABEL_LEN
		&& !label.starts_with('-')
		&& !label.ends_with('-')
		&& label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
