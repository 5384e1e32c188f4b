//! Query string encoding for the error endpoints.
//!
//! Grammar: `?limit=<N>`, then `&<key>=<value>` per active filter term, then
//! `&<key><i>=<value>` per term of the exclusion snapshot at stack position
//! `i`, then `&compare=<mode>`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::columns::ColumnKey;
use crate::compare::CompareMode;
use crate::exclusion::ExclusionStack;
use crate::filter::FilterModel;

/// Bytes left alone by the browser `escape()` function
const ESCAPE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'@')
    .remove(b'*')
    .remove(b'_')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'/');

/// Bytes left alone by `encodeURIComponent()`
const COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escape a filter or exclusion value
pub fn escape(value: &str) -> String {
    utf8_percent_encode(value, ESCAPE_SET).to_string()
}

/// Escape a path used as a single URI component (file names, view paths)
pub fn escape_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT_SET).to_string()
}

/// Encode the current view into a query string.
///
/// With `include_active_field` false the active field's own search text is
/// left out, so group counts show every value of that column under the other
/// filters.
pub fn encode(
    filter: &FilterModel,
    exclusions: &ExclusionStack,
    compare: CompareMode,
    active_field: ColumnKey,
    limit: usize,
    include_active_field: bool,
) -> String {
    let mut query = format!("?limit={}", limit);

    for (key, text) in filter.active_terms() {
        if include_active_field || key != active_field {
            push_term(&mut query, key.as_str(), text);
        }
    }

    for (position, snapshot) in exclusions.iter() {
        for (key, value) in snapshot.terms() {
            push_term(&mut query, &format!("{}{}", key.as_str(), position), value);
        }
    }

    if compare.emits_parameter() {
        push_term(&mut query, "compare", compare.as_str());
    }

    query
}

fn push_term(query: &mut String, name: &str, value: &str) {
    let escaped = escape(value);
    if escaped.is_empty() {
        return;
    }
    query.push('&');
    query.push_str(name);
    query.push('=');
    query.push_str(&escaped);
}
