//! Component-scoped query string codec.
//!
//! Several independent lists can live on one page, so every list owns the
//! keys prefixed with its component id (`bc1-pageIndex=2`). Keys without a
//! prefix belong to the global scope.

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::collections::HashSet;

use super::history::{Location, Navigator};

pub const PAGE_INDEX: &str = "pageIndex";
pub const PAGE_SIZE: &str = "pageSize";
pub const SORT: &str = "sort";
pub const QUERY: &str = "q";
pub const MILESTONE_1: &str = "milestone1";
pub const MILESTONE_2: &str = "milestone2";

const COMPONENT_SEPARATOR: char = '-';

/// Parameter names that take part in change detection by default.
pub const RECOGNIZED_KEYS: [&str; 6] = [PAGE_INDEX, PAGE_SIZE, SORT, QUERY, MILESTONE_1, MILESTONE_2];

/// Decoded parameters of one component, prefix stripped, in URL order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParamSet(IndexMap<String, String>);

impl QueryParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert a value. Existing keys keep their position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy restricted to `keys`.
    pub fn project(&self, keys: &RecognizedKeys) -> QueryParamSet {
        self.0
            .iter()
            .filter(|(k, _)| keys.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parameters last used for a request, or nothing yet.
///
/// `NotYetExecuted` never equals a computed set, not even an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParamsSnapshot {
    #[default]
    NotYetExecuted,
    Computed(QueryParamSet),
}

/// Keys considered by change detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedKeys(Vec<String>);

impl Default for RecognizedKeys {
    fn default() -> Self {
        Self(RECOGNIZED_KEYS.iter().map(|k| k.to_string()).collect())
    }
}

impl RecognizedKeys {
    /// Default keys plus `extra`.
    pub fn with_keys<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys = Self::default();
        for key in extra {
            let key = key.into();
            if !keys.0.contains(&key) {
                keys.0.push(key);
            }
        }
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }
}

/// Pending changes for one component. `None` or an empty value removes the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamPatch(IndexMap<String, Option<String>>);

impl ParamPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), Some(value.into()));
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

/// Global key for `param_name` in the scope of `component_id`.
pub fn namespaced_key(param_name: &str, component_id: Option<&str>) -> String {
    match component_id {
        Some(id) if !id.is_empty() => format!("{}{}{}", id, COMPONENT_SEPARATOR, param_name),
        _ => param_name.to_string(),
    }
}

/// Percent-encode a key or value the way HTML forms do.
pub fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Inverse of [`encode_component`]. `None` when the bytes are not UTF-8.
pub fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

fn raw_segments(search: &str) -> impl Iterator<Item = &str> {
    search
        .strip_prefix('?')
        .unwrap_or(search)
        .split('&')
        .filter(|segment| !segment.is_empty())
}

fn split_segment(segment: &str) -> (&str, &str) {
    segment.split_once('=').unwrap_or((segment, ""))
}

fn decode_segment(segment: &str) -> Option<(String, String)> {
    let (key, value) = split_segment(segment);
    Some((decode_component(key)?, decode_component(value)?))
}

/// Decoded `(key, value)` pairs in URL order. Undecodable entries are skipped.
pub fn parse_search(search: &str) -> Vec<(String, String)> {
    raw_segments(search).filter_map(decode_segment).collect()
}

/// Encode pairs as a query string with a leading `?`, or empty.
pub fn build_search<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let encoded: Vec<String> = pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect();
    if encoded.is_empty() {
        String::new()
    } else {
        format!("?{}", encoded.join("&"))
    }
}

/// Raw value of one parameter of a component. The first occurrence wins.
pub fn get_component_query_param_value(
    search: &str,
    param_name: &str,
    component_id: Option<&str>,
) -> Option<String> {
    let key = namespaced_key(param_name, component_id);
    raw_segments(search)
        .filter_map(decode_segment)
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Every parameter owned by `component_id`, prefix stripped.
///
/// Without a component id the global scope is returned: keys that carry no
/// component separator.
pub fn get_component_query_params_object(search: &str, component_id: Option<&str>) -> QueryParamSet {
    let prefix = match component_id {
        Some(id) if !id.is_empty() => Some(format!("{}{}", id, COMPONENT_SEPARATOR)),
        _ => None,
    };

    let mut params = QueryParamSet::new();
    for (key, value) in parse_search(search) {
        let name = match &prefix {
            Some(prefix) => match key.strip_prefix(prefix.as_str()) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            },
            None if key.contains(COMPONENT_SEPARATOR) => continue,
            None => key,
        };
        if !params.contains_key(&name) {
            params.insert(name, value);
        }
    }
    params
}

/// Merge `patch` into the query string of `current` within the scope of
/// `component_id` and navigate to the result.
///
/// Entries outside the patch are kept byte-for-byte. Navigation is skipped
/// when nothing changes. Returns the resulting location.
pub fn update_query_params_in_url(
    patch: &ParamPatch,
    component_id: Option<&str>,
    current: &Location,
    navigator: &dyn Navigator,
    replace_history_entry: bool,
) -> Location {
    let targets: IndexMap<String, Option<&str>> = patch
        .iter()
        .map(|(k, v)| (namespaced_key(k, component_id), v.filter(|v| !v.is_empty())))
        .collect();

    let mut written: HashSet<&str> = HashSet::new();
    let mut segments: Vec<String> = Vec::new();

    for segment in raw_segments(&current.search) {
        let key = decode_component(split_segment(segment).0);
        match key.as_deref().and_then(|k| targets.get_key_value(k)) {
            Some((key, value)) => {
                if written.insert(key.as_str()) {
                    if let Some(value) = value {
                        segments.push(format!("{}={}", encode_component(key), encode_component(value)));
                    }
                }
            }
            None => segments.push(segment.to_string()),
        }
    }

    for (key, value) in &targets {
        if written.contains(key.as_str()) {
            continue;
        }
        if let Some(value) = value {
            segments.push(format!("{}={}", encode_component(key), encode_component(value)));
        }
    }

    let search = if segments.is_empty() {
        String::new()
    } else {
        format!("?{}", segments.join("&"))
    };
    let next = Location {
        pathname: current.pathname.clone(),
        search,
    };

    if next != *current {
        if replace_history_entry {
            navigator.replace(next.clone());
        } else {
            navigator.push(next.clone());
        }
    }
    next
}

/// Deep equality over [`RECOGNIZED_KEYS`].
pub fn query_params_objects_are_equal(a: &ParamsSnapshot, b: &ParamsSnapshot) -> bool {
    params_equal_over(a, b, &RecognizedKeys::default())
}

/// Deep equality over `keys`.
pub fn params_equal_over(a: &ParamsSnapshot, b: &ParamsSnapshot, keys: &RecognizedKeys) -> bool {
    match (a, b) {
        (ParamsSnapshot::NotYetExecuted, ParamsSnapshot::NotYetExecuted) => true,
        (ParamsSnapshot::Computed(a), ParamsSnapshot::Computed(b)) => {
            a.project(keys) == b.project(keys)
        }
        _ => false,
    }
}
