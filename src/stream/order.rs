//! Composite multi-key ordering built from textual sort specifiers.

// self
use crate::{_prelude::*, error::ConfigError, stream::Comparator};

/// Comparable value of one record field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
	/// Boolean flag.
	Bool(bool),
	/// Integer value.
	Integer(i64),
	/// Decimal amount.
	Decimal(Decimal),
	/// Point in time.
	Time(OffsetDateTime),
	/// Free text, compared bytewise.
	Text(String),
}
impl FieldValue {
	fn rank(&self) -> u8 {
		match self {
			Self::Bool(_) => 0,
			Self::Integer(_) => 1,
			Self::Decimal(_) => 2,
			Self::Time(_) => 3,
			Self::Text(_) => 4,
		}
	}
}
impl Ord for FieldValue {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self, other) {
			(Self::Bool(a), Self::Bool(b)) => a.cmp(b),
			(Self::Integer(a), Self::Integer(b)) => a.cmp(b),
			(Self::Decimal(a), Self::Decimal(b)) => a.cmp(b),
			(Self::Time(a), Self::Time(b)) => a.cmp(b),
			(Self::Text(a), Self::Text(b)) => a.cmp(b),
			_ => self.rank().cmp(&other.rank()),
		}
	}
}
impl PartialOrd for FieldValue {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Records exposing named fields to [`SortOrder`].
pub trait Sortable {
	/// Field names accepted by [`field`](Self::field).
	const FIELDS: &'static [&'static str];

	/// Value of field `name`; `None` when unset on this record.
	fn field(&self, name: &str) -> Option<FieldValue>;
}

/// Per-field comparison override.
pub type FieldComparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// One parsed sort key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
	/// Field name.
	pub field: String,
	/// Whether the key sorts in descending order.
	pub descending: bool,
}
impl FromStr for SortKey {
	type Err = ConfigError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let raw = raw.trim();
		let (field, descending) = match raw.strip_prefix('-') {
			Some(field) => (field, true),
			None => (raw.strip_prefix('+').unwrap_or(raw), false),
		};

		if field.is_empty() {
			return Err(ConfigError::UnknownSortField { field: raw.to_owned() });
		}

		Ok(Self { field: field.to_owned(), descending })
	}
}

/// Multi-key ordering over [`Sortable`] records.
///
/// Keys are evaluated left to right and the first non-equal comparison wins. Records missing a
/// field sort before records that have it.
pub struct SortOrder<T> {
	keys: Vec<SortKey>,
	overrides: HashMap<String, FieldComparator<T>>,
}
impl<T> SortOrder<T>
where
	T: 'static + Sortable,
{
	/// Parses specifiers such as `["-date", "id"]`; `-` sorts descending, `+` or none ascending.
	pub fn parse<I, S>(fields: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let keys = fields
			.into_iter()
			.map(|raw| {
				let key = raw.as_ref().parse::<SortKey>()?;

				if !T::FIELDS.contains(&key.field.as_str()) {
					return Err(ConfigError::UnknownSortField { field: key.field });
				}

				Ok(key)
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self { keys, overrides: HashMap::new() })
	}

	/// Parsed keys in evaluation order.
	pub fn keys(&self) -> &[SortKey] {
		&self.keys
	}

	/// Replaces the comparison used for `field`; direction still applies on top of it.
	pub fn with_comparator<F>(mut self, field: impl Into<String>, compare: F) -> Self
	where
		F: 'static + Fn(&T, &T) -> Ordering + Send + Sync,
	{
		self.overrides.insert(field.into(), Arc::new(compare));

		self
	}

	/// Compares two records.
	pub fn compare(&self, a: &T, b: &T) -> Ordering {
		for key in &self.keys {
			let ordering = match self.overrides.get(&key.field) {
				Some(compare) => compare(a, b),
				None => a.field(&key.field).cmp(&b.field(&key.field)),
			};
			let ordering = if key.descending { ordering.reverse() } else { ordering };

			if ordering != Ordering::Equal {
				return ordering;
			}
		}

		Ordering::Equal
	}

	/// Shareable comparator suitable for [`Mux`](crate::stream::Mux).
	pub fn into_comparator(self) -> Comparator<T> {
		Arc::new(move |a: &T, b: &T| self.compare(a, b))
	}
}
impl<T> Debug for SortOrder<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SortOrder")
			.field("keys", &self.keys)
			.field("overrides", &self.overrides.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, PartialEq)]
	struct Row {
		id: i64,
		name: Option<&'static str>,
	}
	impl Sortable for Row {
		const FIELDS: &'static [&'static str] = &["id", "name"];

		fn field(&self, name: &str) -> Option<FieldValue> {
			match name {
				"id" => Some(FieldValue::Integer(self.id)),
				"name" => self.name.map(|n| FieldValue::Text(n.to_owned())),
				_ => None,
			}
		}
	}

	fn sorted(order: &SortOrder<Row>, mut rows: Vec<Row>) -> Vec<i64> {
		rows.sort_by(|a, b| order.compare(a, b));

		rows.into_iter().map(|row| row.id).collect()
	}

	#[test]
	fn keys_apply_left_to_right() {
		let order = SortOrder::<Row>::parse(["name", "-id"]).expect("Sort keys should parse.");
		let rows = vec![
			Row { id: 1, name: Some("b") },
			Row { id: 2, name: Some("a") },
			Row { id: 3, name: Some("b") },
			Row { id: 4, name: None },
		];

		assert_eq!(sorted(&order, rows), vec![4, 2, 3, 1]);
		assert_eq!(order.keys()[1], SortKey { field: "id".into(), descending: true });
	}

	#[test]
	fn unknown_fields_fail_at_construction() {
		let err = SortOrder::<Row>::parse(["-amount"]).expect_err("Unknown field should fail.");

		assert!(matches!(err, ConfigError::UnknownSortField { field } if field == "amount"));
		assert!(SortOrder::<Row>::parse(["-"]).is_err());
	}

	#[test]
	fn override_replaces_field_comparison_only() {
		let order = SortOrder::<Row>::parse(["-name", "+id"])
			.expect("Sort keys should parse.")
			.with_comparator("name", |a: &Row, b: &Row| {
				a.name.map(str::len).cmp(&b.name.map(str::len))
			});
		let rows = vec![
			Row { id: 3, name: Some("zz") },
			Row { id: 1, name: Some("aaa") },
			Row { id: 2, name: Some("yy") },
		];

		assert_eq!(sorted(&order, rows), vec![1, 2, 3]);
	}

	#[test]
	fn values_of_different_kinds_compare_by_kind() {
		assert_eq!(FieldValue::Bool(true).cmp(&FieldValue::Integer(-1)), Ordering::Less);
		assert_eq!(
			FieldValue::Decimal(Decimal::new(15, 1)).cmp(&FieldValue::Decimal(Decimal::TWO)),
			Ordering::Less
		);
	}
}
