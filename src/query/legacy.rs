//! Legacy indexed query scheme: `itemFilter(i).*` parameter families.
//!
//! The legacy search endpoint authenticates with an application identifier
//! carried on the query string itself and expects every filter as an indexed
//! parameter family. Indexes are assigned by position in the filtered set, so
//! dropping an empty field reindexes everything after it with no gaps.

// self
use crate::{
	auth::AppId,
	query::{CompiledQuery, FilterSet, SearchRequest},
};

/// Wire value of the `OPERATION-NAME` service parameter.
const OPERATION_NAME: &str = "findItemsAdvanced";
/// Wire value of the `SERVICE-VERSION` service parameter.
const SERVICE_VERSION: &str = "1.0.0";
/// Wire value of the `RESPONSE-DATA-FORMAT` service parameter.
const RESPONSE_FORMAT: &str = "JSON";

/// Compiles a filter set into indexed `itemFilter(i).*` entries.
///
/// For the field at filtered position `i` this emits `itemFilter(i).name`,
/// `itemFilter(i).value`, and, when the field carries an auxiliary pair,
/// `itemFilter(i).paramName` / `itemFilter(i).paramValue`. Equal inputs
/// produce identical output on every call.
pub fn compile_filters(fields: &FilterSet) -> CompiledQuery {
	let mut compiled = CompiledQuery::new();

	for (index, field) in fields.iter().enumerate() {
		compiled.push(format!("itemFilter({index}).name"), field.name.clone());
		compiled.push(format!("itemFilter({index}).value"), field.value.clone());

		if let Some((aux_name, aux_value)) = &field.aux {
			compiled.push(format!("itemFilter({index}).paramName"), aux_name.clone());
			compiled.push(format!("itemFilter({index}).paramValue"), aux_value.clone());
		}
	}

	compiled
}

/// Assembles the full legacy request: service metadata, keywords, paging, the
/// optional brand aspect, then the compiled filter entries.
pub fn compile_request(request: &SearchRequest, app_id: &AppId) -> CompiledQuery {
	let mut compiled = CompiledQuery::new();

	compiled.push("OPERATION-NAME", OPERATION_NAME);
	compiled.push("SERVICE-VERSION", SERVICE_VERSION);
	compiled.push("SECURITY-APPNAME", app_id.as_ref());
	compiled.push("RESPONSE-DATA-FORMAT", RESPONSE_FORMAT);
	compiled.push("REST-PAYLOAD", "");
	compiled.push("keywords", request.keyword_expression());
	compiled.push("paginationInput.entriesPerPage", request.entries_per_page.to_string());

	if let Some(brand) = request.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
		compiled.push("aspectFilter(0).aspectName", "Brand");
		compiled.push("aspectFilter(0).aspectValueName", brand);
	}

	compiled.extend(compile_filters(&request.filters.to_filter_set()));

	compiled
}
