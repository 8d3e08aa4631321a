//! Backend-agnostic records produced by drivers.
//!
//! Records are immutable snapshots mapped out of backend JSON. Money is always a
//! [`Decimal`]; timestamps are UTC [`OffsetDateTime`]s.

pub mod account;
pub mod contact;
pub mod credit;
pub mod payment;
pub mod transaction;

pub use account::*;
pub use contact::*;
pub use credit::*;
pub use payment::*;
pub use transaction::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// Decodes `value` into `T`, reporting the JSON path of the first mismatch.
pub fn decode<T>(record: &'static str, value: JsonValue) -> Result<T>
where
	T: DeserializeOwned,
{
	serde_path_to_error::deserialize(value).map_err(|source| Error::Decode { record, source })
}

/// Decodes a JSON array into records of `T`.
pub fn decode_list<T>(record: &'static str, value: JsonValue) -> Result<Vec<T>>
where
	T: DeserializeOwned,
{
	match value {
		JsonValue::Null => Ok(Vec::new()),
		other => decode(record, other),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Sample {
		#[allow(dead_code)]
		amount: Decimal,
	}

	#[test]
	fn decode_errors_carry_the_json_path() {
		let err = decode::<Vec<Sample>>("sample", serde_json::json!([{ "amount": "1.5" }, {}]))
			.expect_err("Missing field should fail.");
		let Error::Decode { record, source } = err else {
			panic!("Expected a decode error.");
		};

		assert_eq!(record, "sample");
		assert_eq!(source.path().to_string(), "[1]");
	}

	#[test]
	fn null_lists_decode_empty() {
		let items = decode_list::<Sample>("sample", JsonValue::Null).expect("Null should decode.");

		assert!(items.is_empty());
	}
}
