//! Keyword expression assembly.

/// Joins the primary term, auxiliary terms, and exclusions into one expression.
///
/// Auxiliary terms follow the primary term separated by single spaces; each
/// excluded term is appended with a `-` prefix. Blank entries are skipped so
/// the result never carries doubled separators, and the caller-supplied order
/// is preserved on both lists.
pub fn keyword_expression<A, E>(primary: &str, auxiliary: &[A], excluded: &[E]) -> String
where
	A: AsRef<str>,
	E: AsRef<str>,
{
	let mut expression = String::from(primary.trim());

	for term in auxiliary {
		let term = term.as_ref().trim();

		if term.is_empty() {
			continue;
		}
		if !expression.is_empty() {
			expression.push(' ');
		}

		expression.push_str(term);
	}
	for term in excluded {
		let term = term.as_ref().trim();

		if term.is_empty() {
			continue;
		}
		if !expression.is_empty() {
			expression.push(' ');
		}

		expression.push('-');
		expression.push_str(term);
	}

	expression
}
