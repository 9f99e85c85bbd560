//! Scope modeling helpers shared by the token cache and its stores.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const SCOPE_MAX_LEN: usize = 512;

/// Errors emitted when validating a scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeError {
	/// Empty scopes are not allowed.
	#[error("Scope cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
	/// Scopes cannot exceed the allowed character count.
	#[error("Scope exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Single permission string sent on the token exchange and used as the cache key.
///
/// Each exchange requests exactly one scope, and cached credentials are stored
/// per scope, so equality, ordering, and hashing all operate on the raw string.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope(String);
impl Scope {
	/// Creates a scope after validation.
	pub fn new(value: impl Into<String>) -> Result<Self, ScopeError> {
		let owned: String = value.into();

		if owned.is_empty() {
			return Err(ScopeError::Empty);
		}
		if owned.chars().any(char::is_whitespace) {
			return Err(ScopeError::ContainsWhitespace { scope: owned });
		}
		if owned.len() > SCOPE_MAX_LEN {
			return Err(ScopeError::TooLong { max: SCOPE_MAX_LEN });
		}

		Ok(Self(owned))
	}
}
impl Deref for Scope {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for Scope {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for Scope {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<Scope> for String {
	fn from(value: Scope) -> Self {
		value.0
	}
}
impl TryFrom<String> for Scope {
	type Error = ScopeError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for Scope {
	type Err = ScopeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Scope").field(&self.0).finish()
	}
}
impl Display for Scope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
