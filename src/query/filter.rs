//! Ordered filter modeling with drop and currency-injection rules.

// self
use crate::_prelude::*;

/// Sentinel value meaning "no constraint"; fields carrying it are dropped.
const VALUE_ANY: &str = "Any";
/// Auxiliary parameter name attached to price-bearing fields.
const CURRENCY_PARAM: &str = "Currency";
/// Currency attached when a price-bearing field names none.
const DEFAULT_CURRENCY: &str = "USD";

/// Legacy condition code for brand new items.
const CONDITION_NEW: &str = "1000";
/// Legacy condition code for used items.
const CONDITION_USED: &str = "3000";

/// Named filter constraint with an optional auxiliary name/value pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterField {
	/// Filter name, e.g. `MinPrice` or `Condition`.
	pub name: String,
	/// Filter value as it should appear on the wire.
	pub value: String,
	/// Auxiliary parameter attached to the field, e.g. a currency.
	pub aux: Option<(String, String)>,
}
impl FilterField {
	/// Creates a field without an auxiliary pair.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: value.into(), aux: None }
	}

	/// Creates a field with an explicit auxiliary pair.
	pub fn with_aux(
		name: impl Into<String>,
		value: impl Into<String>,
		aux_name: impl Into<String>,
		aux_value: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			aux: Some((aux_name.into(), aux_value.into())),
		}
	}

	/// Returns `true` for fields that carry a price bound.
	pub fn is_price_field(&self) -> bool {
		self.name == "MinPrice" || self.name == "MaxPrice"
	}
}

/// Ordered collection of filter fields.
///
/// Rules are applied as fields are pushed, so a set always holds exactly what
/// will be compiled: blank and `Any` values never enter, order is the
/// construction order, and each price-bearing field carries one currency
/// auxiliary (the default is injected when the caller supplies none).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSet {
	fields: Vec<FilterField>,
}
impl FilterSet {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `field` unless its value is blank or the `Any` sentinel.
	pub fn push(&mut self, field: FilterField) {
		let mut field = field;
		let value = field.value.trim();

		if value.is_empty() || value == VALUE_ANY {
			return;
		}

		// A blank auxiliary pair counts as absent.
		if field
			.aux
			.as_ref()
			.is_some_and(|(name, value)| name.trim().is_empty() || value.trim().is_empty())
		{
			field.aux = None;
		}
		if field.aux.is_none() && field.is_price_field() {
			field.aux = Some((CURRENCY_PARAM.into(), DEFAULT_CURRENCY.into()));
		}

		self.fields.push(field);
	}

	/// Iterates fields in construction order.
	pub fn iter(&self) -> impl Iterator<Item = &FilterField> {
		self.fields.iter()
	}

	/// Number of retained fields.
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	/// Returns `true` when every pushed field was dropped or none were pushed.
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}
impl FromIterator<FilterField> for FilterSet {
	fn from_iter<I: IntoIterator<Item = FilterField>>(iter: I) -> Self {
		let mut set = Self::new();

		for field in iter {
			set.push(field);
		}

		set
	}
}

/// Listing constraints collected from callers, in raw label form.
///
/// Labels are matched exactly: `New`/`Used` for conditions, `Auction`/`BIN`
/// for listing types. Anything else is dropped during lowering rather than
/// reported, keeping compilation infallible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListingFilters {
	/// Lowest acceptable price, as entered by the caller.
	pub min_price: Option<String>,
	/// Highest acceptable price, as entered by the caller.
	pub max_price: Option<String>,
	/// Condition label.
	pub condition: Option<String>,
	/// Listing type label.
	pub listing_type: Option<String>,
	/// Upper bound on remaining listing time, in whole hours.
	pub max_time_left_hours: Option<u32>,
}
impl ListingFilters {
	/// Creates an empty constraint set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the minimum price.
	pub fn with_min_price(mut self, price: impl Into<String>) -> Self {
		self.min_price = Some(price.into());

		self
	}

	/// Sets the maximum price.
	pub fn with_max_price(mut self, price: impl Into<String>) -> Self {
		self.max_price = Some(price.into());

		self
	}

	/// Sets the condition label.
	pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
		self.condition = Some(condition.into());

		self
	}

	/// Sets the listing type label.
	pub fn with_listing_type(mut self, listing_type: impl Into<String>) -> Self {
		self.listing_type = Some(listing_type.into());

		self
	}

	/// Caps the remaining listing time.
	pub fn with_max_time_left_hours(mut self, hours: u32) -> Self {
		self.max_time_left_hours = Some(hours);

		self
	}

	/// Lowers the constraints into an ordered [`FilterSet`].
	///
	/// The order is fixed (price bounds, condition, listing type, time left)
	/// so compilation stays deterministic. Unrecognized labels drop out here.
	pub fn to_filter_set(&self) -> FilterSet {
		let mut set = FilterSet::new();

		if let Some(price) = &self.max_price {
			set.push(FilterField::new("MaxPrice", price.clone()));
		}
		if let Some(price) = &self.min_price {
			set.push(FilterField::new("MinPrice", price.clone()));
		}
		if let Some(code) = self.condition.as_deref().and_then(condition_code) {
			set.push(FilterField::new("Condition", code));
		}
		if let Some(value) = self.listing_type.as_deref().and_then(listing_type_value) {
			set.push(FilterField::new("ListingType", value));
		}
		if let Some(hours) = self.max_time_left_hours {
			set.push(FilterField::new("MaxTimeLeft", format!("PT{hours}H")));
		}

		set
	}
}

/// Maps a condition label to its legacy wire code.
fn condition_code(label: &str) -> Option<&'static str> {
	match label {
		"New" => Some(CONDITION_NEW),
		"Used" => Some(CONDITION_USED),
		_ => None,
	}
}

/// Maps a listing type label to its legacy wire value. `BIN` is Buy It Now.
fn listing_type_value(label: &str) -> Option<&'static str> {
	match label {
		"Auction" => Some("Auction"),
		"BIN" => Some("FixedPrice"),
		_ => None,
	}
}
