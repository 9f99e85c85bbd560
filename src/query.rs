//! Query compilation: keyword expressions, ordered filters, and transport-safe encoding.
//!
//! Compilation is deterministic and infallible. Callers assemble a
//! [`SearchRequest`], the scheme modules lower it into a [`CompiledQuery`]
//! (an ordered name/value list), and [`CompiledQuery::encode_for_transport`]
//! renders the wire form. Malformed optional inputs are dropped, never
//! reported; validating caller input is a concern that lives outside the
//! compiler.

pub mod filter;
pub mod keyword;
pub mod legacy;
pub mod structured;

pub use filter::*;
pub use keyword::*;

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::_prelude::*;

/// Page size applied when a request does not set one.
pub const DEFAULT_ENTRIES_PER_PAGE: u32 = 20;

/// Bytes percent-encoded in parameter values: everything outside the RFC 3986
/// unreserved set. Spaces become `%20`, never `+`.
const VALUE_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');
/// Parameter names additionally keep `(` and `)` literal; the legacy endpoint
/// does not recognize indexed filter families when the parentheses arrive
/// percent-encoded.
const NAME_ENCODE_SET: &AsciiSet = &VALUE_ENCODE_SET.remove(b'(').remove(b')');

/// Ordered wire parameters produced by the query compiler.
///
/// Order is load-bearing: indexed parameter families must appear in index
/// order, and compiling the same input twice yields an identical sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledQuery(Vec<(String, String)>);
impl CompiledQuery {
	/// Creates an empty query.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a parameter, preserving insertion order.
	pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.push((name.into(), value.into()));
	}

	/// Appends every parameter from `other`, preserving both orders.
	pub fn extend(&mut self, other: CompiledQuery) {
		self.0.extend(other.0);
	}

	/// Returns the first value recorded under `name`, if any.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.iter().find(|(candidate, _)| candidate == name).map(|(_, value)| value.as_str())
	}

	/// Iterates parameters in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no parameters have been compiled.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Renders the query string with scheme-aware percent-encoding.
	///
	/// Values are fully encoded. Names keep `(` and `)` literal so indexed
	/// families survive the trip; transports must send the result
	/// byte-for-byte.
	pub fn encode_for_transport(&self) -> String {
		let mut wire = String::new();

		for (index, (name, value)) in self.0.iter().enumerate() {
			if index > 0 {
				wire.push('&');
			}

			wire.extend(utf8_percent_encode(name, NAME_ENCODE_SET));
			wire.push('=');
			wire.extend(utf8_percent_encode(value, VALUE_ENCODE_SET));
		}

		wire
	}
}
impl FromIterator<(String, String)> for CompiledQuery {
	fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// Caller-facing description of one search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
	/// Main keyword, always first in the compiled expression.
	pub primary_term: String,
	/// Extra keywords appended after the primary term.
	pub auxiliary_terms: Vec<String>,
	/// Keywords compiled with a `-` prefix to exclude matches.
	pub excluded_terms: Vec<String>,
	/// Brand constraint; compiled as an aspect filter under the legacy scheme.
	pub brand: Option<String>,
	/// Listing constraints lowered by the scheme modules.
	pub filters: ListingFilters,
	/// Requested page size.
	pub entries_per_page: u32,
}
impl SearchRequest {
	/// Creates a request for the primary keyword with default paging.
	pub fn new(primary_term: impl Into<String>) -> Self {
		Self {
			primary_term: primary_term.into(),
			auxiliary_terms: Vec::new(),
			excluded_terms: Vec::new(),
			brand: None,
			filters: ListingFilters::default(),
			entries_per_page: DEFAULT_ENTRIES_PER_PAGE,
		}
	}

	/// Replaces the auxiliary keyword list.
	pub fn with_auxiliary_terms<I, S>(mut self, terms: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.auxiliary_terms = terms.into_iter().map(Into::into).collect();

		self
	}

	/// Replaces the excluded keyword list.
	pub fn with_excluded_terms<I, S>(mut self, terms: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.excluded_terms = terms.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the brand constraint.
	pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
		self.brand = Some(brand.into());

		self
	}

	/// Replaces the listing constraints.
	pub fn with_filters(mut self, filters: ListingFilters) -> Self {
		self.filters = filters;

		self
	}

	/// Overrides the page size.
	pub fn with_entries_per_page(mut self, entries: u32) -> Self {
		self.entries_per_page = entries;

		self
	}

	/// Keyword expression compiled from the request's terms.
	pub fn keyword_expression(&self) -> String {
		keyword::keyword_expression(
			&self.primary_term,
			&self.auxiliary_terms,
			&self.excluded_terms,
		)
	}
}
