//! Structured query scheme: a single `filter=` expression with named clauses.
//!
//! The structured search endpoint authenticates with a bearer token and takes
//! its constraints as one comma-joined clause list instead of indexed
//! parameter families. The two schemes never mix; a descriptor selects one.

// self
use crate::query::{CompiledQuery, ListingFilters, SearchRequest};

/// Currency clause attached whenever a price clause is present.
const PRICE_CURRENCY_CLAUSE: &str = "priceCurrency:USD";

/// Compiles the listing constraints into a `filter=` expression.
///
/// Clause order is fixed (price range, currency, condition, buying option) so
/// equal inputs always render the same expression. The currency clause is
/// emitted at most once and only alongside a price clause. Returns `None`
/// when every constraint is absent or unrecognized.
pub fn filter_expression(filters: &ListingFilters) -> Option<String> {
	let mut clauses = Vec::new();
	let min = filters.min_price.as_deref().map(str::trim).filter(|p| !p.is_empty());
	let max = filters.max_price.as_deref().map(str::trim).filter(|p| !p.is_empty());

	match (min, max) {
		(Some(min), Some(max)) => clauses.push(format!("price:[{min}..{max}]")),
		(Some(min), None) => clauses.push(format!("price:[{min}..]")),
		(None, Some(max)) => clauses.push(format!("price:[..{max}]")),
		(None, None) => (),
	}
	if !clauses.is_empty() {
		clauses.push(PRICE_CURRENCY_CLAUSE.into());
	}
	if let Some(condition) = filters.condition.as_deref().and_then(condition_clause) {
		clauses.push(condition.into());
	}
	if let Some(option) = filters.listing_type.as_deref().and_then(buying_option_clause) {
		clauses.push(option.into());
	}

	if clauses.is_empty() { None } else { Some(clauses.join(",")) }
}

/// Assembles the full structured request: keyword expression, paging, and the
/// optional `filter=` expression.
pub fn compile_request(request: &SearchRequest) -> CompiledQuery {
	let mut compiled = CompiledQuery::new();

	compiled.push("q", request.keyword_expression());
	compiled.push("limit", request.entries_per_page.to_string());

	if let Some(expression) = filter_expression(&request.filters) {
		compiled.push("filter", expression);
	}

	compiled
}

fn condition_clause(label: &str) -> Option<&'static str> {
	match label {
		"New" => Some("conditions:{NEW}"),
		"Used" => Some("conditions:{USED}"),
		_ => None,
	}
}

/// `BIN` is Buy It Now.
fn buying_option_clause(label: &str) -> Option<&'static str> {
	match label {
		"Auction" => Some("buyingOptions:{AUCTION}"),
		"BIN" => Some("buyingOptions:{FIXED_PRICE}"),
		_ => None,
	}
}
