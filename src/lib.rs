//! Aggregate accounts and transactions from several authenticated financial backends into one
//! lazily merged, ordered stream.
//!
//! The crate is organised around two pieces of machinery:
//!
//! - [`session::SessionClient`], an authenticated JSON REST client that owns the bearer-token
//!   lifecycle of one backend session (durable persistence, header injection, invalidation and
//!   re-login notification when the backend rejects the session).
//! - [`stream::Mux`], a pull-based k-way merge over lazily paginated [`stream::RecordSource`]s
//!   that only advances a source once its previous head has been handed to the caller.
//!
//! Backend drivers ([`backend`]) bind both to concrete endpoints and record shapes, and the
//! [`aggregate::Aggregator`] fans requests out across every registered backend.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod aggregate;
pub mod backend;
pub mod capability;
pub mod error;
pub mod http;
pub mod id;
pub mod obs;
pub mod password;
pub mod poll;
pub mod record;
pub mod session;
pub mod store;
pub mod stream;

mod _prelude {
	pub use std::{
		cmp::Ordering,
		collections::{BTreeMap, HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::Client as ReqwestClient;
	pub use rust_decimal::Decimal;
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use rust_decimal;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
