//! Cached credential model and the secret wrapper that keeps it out of logs.

// self
use crate::{_prelude::*, auth::scope::Scope};

/// Safety margin deducted from the reported token lifetime.
///
/// The deduction happens once, when the credential is constructed; validity
/// checks compare against the stored expiry instant and never re-apply it.
pub const EXPIRY_SAFETY_MARGIN: Duration = Duration::seconds(60);

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Immutable cached credential for one scope.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Scope the credential was issued for; doubles as the cache key.
	pub scope: Scope,
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Expiry instant with [`EXPIRY_SAFETY_MARGIN`] already deducted.
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Builds a credential from an exchange response.
	///
	/// `reported_ttl` is the lifetime the token endpoint claimed. The stored
	/// expiry is `issued_at + max(reported_ttl - margin, 0)`, so a lifetime at
	/// or below the margin produces a credential that is already stale.
	pub fn issued(
		scope: Scope,
		access_token: TokenSecret,
		issued_at: OffsetDateTime,
		reported_ttl: Duration,
	) -> Self {
		let effective_ttl = (reported_ttl - EXPIRY_SAFETY_MARGIN).max(Duration::ZERO);

		Self { scope, access_token, issued_at, expires_at: issued_at + effective_ttl }
	}

	/// Returns `true` while `instant` is strictly before the stored expiry.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}

	/// Convenience helper that checks validity against the current UTC instant.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("scope", &self.scope)
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn scope() -> Scope {
		Scope::new("inventory.read").expect("Scope fixture should be valid.")
	}

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn margin_is_deducted_at_construction() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let credential = Credential::issued(
			scope(),
			TokenSecret::new("token"),
			issued,
			Duration::seconds(1_800),
		);

		assert_eq!(credential.expires_at, issued + Duration::seconds(1_740));
		assert!(credential.is_valid_at(issued));
		assert!(credential.is_valid_at(issued + Duration::seconds(1_739)));
		assert!(!credential.is_valid_at(issued + Duration::seconds(1_740)));
	}

	#[test]
	fn short_lifetimes_are_stale_immediately() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);

		for ttl in [Duration::seconds(30), Duration::seconds(60), Duration::ZERO] {
			let credential =
				Credential::issued(scope(), TokenSecret::new("token"), issued, ttl);

			assert_eq!(credential.expires_at, issued);
			assert!(!credential.is_valid_at(issued));
		}
	}

	#[test]
	fn negative_lifetimes_clamp_to_issued_instant() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let credential =
			Credential::issued(scope(), TokenSecret::new("token"), issued, Duration::seconds(-5));

		assert_eq!(credential.expires_at, issued);
	}

	#[test]
	fn validity_check_is_strict() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let credential = Credential::issued(
			scope(),
			TokenSecret::new("token"),
			issued,
			Duration::seconds(120),
		);

		// Exactly at the expiry instant counts as stale.
		assert!(!credential.is_valid_at(credential.expires_at));
		assert!(credential.is_valid_at(credential.expires_at - Duration::nanoseconds(1)));
	}

	#[test]
	fn debug_redacts_access_token() {
		let credential = Credential::issued(
			scope(),
			TokenSecret::new("super-secret"),
			macros::datetime!(2025-01-01 00:00 UTC),
			Duration::seconds(600),
		);
		let rendered = format!("{credential:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("super-secret"));
	}
}
