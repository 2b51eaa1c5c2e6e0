//! Filter clauses stored in the `q` parameter.
//!
//! `q` holds clauses such as `name=like="%foo%";status==SUCCESS`. The grammar
//! belongs to the backend; only the operators the list views emit are
//! understood here and anything else is dropped when parsing.

use std::fmt;

use super::history::{Location, Navigator};
use super::query_params::{
    PAGE_INDEX, ParamPatch, QUERY, get_component_query_param_value, update_query_params_in_url,
};

const CLAUSE_SEPARATOR: char = ';';
const RESERVED: &[char] = &[';', ',', '"', '\'', '(', ')', '=', '!', '<', '>', '~'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    Like,
    NotLike,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "==",
            FilterOperator::NotEqual => "!=",
            FilterOperator::Like => "=like=",
            FilterOperator::NotLike => "=notlike=",
        }
    }

    // "==" must be tried before the word operators that also start with '='
    const ALL: [FilterOperator; 4] = [
        FilterOperator::Equal,
        FilterOperator::NotEqual,
        FilterOperator::Like,
        FilterOperator::NotLike,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub attribute: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterClause {
    pub fn new(attribute: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equal(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(attribute, FilterOperator::Equal, value)
    }

    /// `*` and `?` typed by the user become the backend's `%` and `_` wildcards.
    pub fn like(attribute: impl Into<String>, pattern: &str) -> Self {
        let value: String = pattern
            .chars()
            .map(|c| match c {
                '*' => '%',
                '?' => '_',
                other => other,
            })
            .collect();
        Self::new(attribute, FilterOperator::Like, value)
    }

    fn parse(clause: &str) -> Option<Self> {
        let position = clause.find(['=', '!'])?;
        let (attribute, rest) = clause.split_at(position);
        if attribute.is_empty()
            || !attribute
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '_')
        {
            return None;
        }

        let operator = FilterOperator::ALL
            .into_iter()
            .find(|op| rest.starts_with(op.as_str()))?;
        let value = unquote(&rest[operator.as_str().len()..])?;
        Some(Self::new(attribute, operator, value))
    }
}

impl fmt::Display for FilterClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.attribute, self.operator.as_str(), quote(&self.value))
    }
}

fn quote(value: &str) -> String {
    if !value.is_empty() && !value.contains(RESERVED) && !value.contains(char::is_whitespace) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

fn unquote(raw: &str) -> Option<String> {
    let Some(inner) = raw.strip_prefix('"') else {
        return (!raw.is_empty()).then(|| raw.to_string());
    };
    let inner = inner.strip_suffix('"')?;

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => value.push(chars.next()?),
            '"' => return None,
            other => value.push(other),
        }
    }
    Some(value)
}

fn split_clauses(expression: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in expression.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            CLAUSE_SEPARATOR if !in_quotes => {
                clauses.push(&expression[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    clauses.push(&expression[start..]);
    clauses
}

/// Clauses of a filter expression. Unparseable clauses are skipped.
pub fn parse_filter(expression: &str) -> Vec<FilterClause> {
    split_clauses(expression)
        .into_iter()
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .filter_map(|clause| {
            let parsed = FilterClause::parse(clause);
            if parsed.is_none() {
                log::debug!("dropping unparseable filter clause '{}'", clause);
            }
            parsed
        })
        .collect()
}

pub fn format_filter(clauses: &[FilterClause]) -> String {
    clauses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&CLAUSE_SEPARATOR.to_string())
}

/// Keeps one component's filter chips and its `q` parameter in step.
#[derive(Debug, Clone)]
pub struct FilteringBinder {
    component_id: Option<String>,
}

impl FilteringBinder {
    pub fn new(component_id: Option<&str>) -> Self {
        Self {
            component_id: component_id.filter(|id| !id.is_empty()).map(String::from),
        }
    }

    pub fn current(&self, location: &Location) -> Vec<FilterClause> {
        get_component_query_param_value(&location.search, QUERY, self.component_id.as_deref())
            .map(|q| parse_filter(&q))
            .unwrap_or_default()
    }

    pub fn add(&self, clause: FilterClause, navigator: &dyn Navigator) -> Location {
        let mut clauses = self.current(&navigator.location());
        if !clauses.contains(&clause) {
            clauses.push(clause);
        }
        self.write(&clauses, navigator)
    }

    /// Drop every clause on `attribute`.
    pub fn remove(&self, attribute: &str, navigator: &dyn Navigator) -> Location {
        let mut clauses = self.current(&navigator.location());
        clauses.retain(|clause| clause.attribute != attribute);
        self.write(&clauses, navigator)
    }

    pub fn clear(&self, navigator: &dyn Navigator) -> Location {
        self.write(&[], navigator)
    }

    // a different filter yields a different result set, so paging restarts
    fn write(&self, clauses: &[FilterClause], navigator: &dyn Navigator) -> Location {
        let patch = ParamPatch::new()
            .set(QUERY, format_filter(clauses))
            .set(PAGE_INDEX, "1");
        update_query_params_in_url(
            &patch,
            self.component_id.as_deref(),
            &navigator.location(),
            navigator,
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::MemoryHistory;

    #[test]
    fn test_parse_filter_expression() {
        let clauses = parse_filter("name=like=\"%foo%\";status==SUCCESS;temporaryBuild!=true");
        assert_eq!(
            clauses,
            vec![
                FilterClause::new("name", FilterOperator::Like, "%foo%"),
                FilterClause::equal("status", "SUCCESS"),
                FilterClause::new("temporaryBuild", FilterOperator::NotEqual, "true"),
            ]
        );
    }

    #[test]
    fn test_quoted_values_keep_separators() {
        let clause = FilterClause::equal("description", "a;b, \"c\"");
        let expression = format_filter(&[clause.clone(), FilterClause::equal("x", "1")]);
        assert_eq!(expression, "description==\"a;b, \\\"c\\\"\";x==1");
        assert_eq!(parse_filter(&expression), vec![clause, FilterClause::equal("x", "1")]);
    }

    #[test]
    fn test_unparseable_clauses_are_dropped() {
        let clauses = parse_filter("garbage;=like=x;name=~x;status==;ok==1;name==\"open");
        assert_eq!(clauses, vec![FilterClause::equal("ok", "1")]);
    }

    #[test]
    fn test_like_translates_wildcards() {
        let clause = FilterClause::like("name", "pnc-*-build?");
        assert_eq!(clause.value, "pnc-%-build_");
        assert_eq!(clause.to_string(), "name=like=pnc-%-build_");
    }

    #[test]
    fn test_binder_add_remove_clear() {
        let history = MemoryHistory::new(Location::new("/builds", "?bc1-pageIndex=5&bc1-pageSize=10"));
        let binder = FilteringBinder::new(Some("bc1"));

        binder.add(FilterClause::equal("status", "FAILED"), &history);
        let next = binder.add(FilterClause::like("name", "*core*"), &history);
        assert_eq!(
            get_component_query_param_value(&next.search, QUERY, Some("bc1")).as_deref(),
            Some("status==FAILED;name=like=%core%")
        );
        assert_eq!(
            get_component_query_param_value(&next.search, PAGE_INDEX, Some("bc1")).as_deref(),
            Some("1")
        );

        binder.remove("status", &history);
        assert_eq!(
            binder.current(&history.location()),
            vec![FilterClause::like("name", "*core*")]
        );

        let cleared = binder.clear(&history);
        assert_eq!(get_component_query_param_value(&cleared.search, QUERY, Some("bc1")), None);
    }
}
