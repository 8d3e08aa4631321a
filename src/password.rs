//! Password-strength checks configured from textual check identifiers.

// self
use crate::{_prelude::*, error::ConfigError};

/// One password rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PasswordCheck {
	/// At least `min` characters (`tooShort:<min>`).
	TooShort {
		/// Minimum character count.
		min: usize,
	},
	/// At least one ASCII upper-case letter (`noUpperCase`).
	NoUpperCase,
	/// At least one ASCII lower-case letter (`noLowerCase`).
	NoLowerCase,
	/// At least one ASCII digit (`noDigit`).
	NoDigit,
	/// At least one character that is not an ASCII letter or digit (`noSymbol`).
	NoSymbol,
}
impl PasswordCheck {
	/// Returns `true` when `password` satisfies the rule.
	pub fn passes(&self, password: &str) -> bool {
		match self {
			Self::TooShort { min } => password.chars().count() >= *min,
			Self::NoUpperCase => password.chars().any(|c| c.is_ascii_uppercase()),
			Self::NoLowerCase => password.chars().any(|c| c.is_ascii_lowercase()),
			Self::NoDigit => password.chars().any(|c| c.is_ascii_digit()),
			Self::NoSymbol => password.chars().any(|c| !c.is_ascii_alphanumeric()),
		}
	}
}
impl FromStr for PasswordCheck {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || ConfigError::InvalidPasswordCheck { check: s.to_owned() };
		let (id, args) = match s.split_once(':') {
			Some((id, args)) => (id, Some(args)),
			None => (s, None),
		};

		match (id, args) {
			("tooShort", Some(min)) =>
				Ok(Self::TooShort { min: min.trim().parse().map_err(|_| invalid())? }),
			("noUpperCase", None) => Ok(Self::NoUpperCase),
			("noLowerCase", None) => Ok(Self::NoLowerCase),
			("noDigit", None) => Ok(Self::NoDigit),
			("noSymbol", None) => Ok(Self::NoSymbol),
			_ => Err(invalid()),
		}
	}
}
impl Display for PasswordCheck {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::TooShort { min } => write!(f, "tooShort:{min}"),
			Self::NoUpperCase => f.write_str("noUpperCase"),
			Self::NoLowerCase => f.write_str("noLowerCase"),
			Self::NoDigit => f.write_str("noDigit"),
			Self::NoSymbol => f.write_str("noSymbol"),
		}
	}
}

/// Ordered set of password rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PasswordChecker {
	checks: Vec<PasswordCheck>,
}
impl PasswordChecker {
	/// Parses identifiers such as `["tooShort:8", "noDigit"]`; unknown identifiers fail.
	pub fn parse<I, S>(checks: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let checks = checks
			.into_iter()
			.map(|check| check.as_ref().parse())
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self { checks })
	}

	/// Configured rules in evaluation order.
	pub fn checks(&self) -> &[PasswordCheck] {
		&self.checks
	}

	/// Rules violated by `password`, in configuration order.
	pub fn issues(&self, password: &str) -> Vec<PasswordCheck> {
		self.checks.iter().filter(|check| !check.passes(password)).copied().collect()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn reports_violated_rules_in_order() {
		let checker = PasswordChecker::parse([
			"tooShort:8",
			"noUpperCase",
			"noLowerCase",
			"noDigit",
			"noSymbol",
		])
		.expect("Checks should parse.");
		let issues = checker.issues("abc");

		assert_eq!(
			issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
			["tooShort:8", "noUpperCase", "noDigit", "noSymbol"]
		);
		assert!(checker.issues("Abcdef1!").is_empty());
	}

	#[test]
	fn length_counts_characters() {
		let checker = PasswordChecker::parse(["tooShort:3"]).expect("Checks should parse.");

		assert!(checker.issues("éàü").is_empty());
	}

	#[test]
	fn unknown_identifiers_are_rejected() {
		for bad in ["noEmoji", "tooShort", "tooShort:x", "noDigit:1"] {
			let err = PasswordChecker::parse([bad]).expect_err("Identifier should be rejected.");

			assert!(matches!(err, ConfigError::InvalidPasswordCheck { check } if check == bad));
		}
	}
}
