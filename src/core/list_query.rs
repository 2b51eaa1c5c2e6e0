//! Binds a list's fetch function to its URL parameters.
//!
//! The effect recomputes the component's parameters on every location change,
//! skips the request when nothing relevant changed or when the pagination and
//! sorting binders have not written their defaults yet, and otherwise calls the
//! fetch function exactly once with the parameters as HTTP query parameters.

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::future::Future;
use tokio::sync::watch;

use super::history::Location;
use super::query_params::{
    MILESTONE_1, MILESTONE_2, PAGE_INDEX, PAGE_SIZE, ParamsSnapshot, QueryParamSet,
    RecognizedKeys, SORT, get_component_query_params_object, params_equal_over,
};

/// Request options handed to the fetch function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    /// Sent verbatim as the request's query parameters.
    pub params: QueryParamSet,
}

/// Named group of keys that must all be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamCategory {
    pub name: String,
    pub keys: Vec<String>,
}

impl ParamCategory {
    pub fn new<I, S>(name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Milestone comparison needs both milestones.
    pub fn milestone() -> Self {
        Self::new("milestone", [MILESTONE_1, MILESTONE_2])
    }

    fn is_satisfied(&self, params: &QueryParamSet) -> bool {
        self.keys.iter().all(|key| params.contains_key(key))
    }
}

/// Parameter categories that must be present before a request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandatoryParams {
    /// Requires `pageIndex` and `pageSize`.
    pub pagination: bool,
    /// Requires `sort`; the literal `none` counts as present.
    pub sorting: bool,
    pub custom: Vec<ParamCategory>,
}

impl Default for MandatoryParams {
    fn default() -> Self {
        Self {
            pagination: true,
            sorting: true,
            custom: Vec::new(),
        }
    }
}

impl MandatoryParams {
    /// No requirements at all.
    pub fn none() -> Self {
        Self {
            pagination: false,
            sorting: false,
            custom: Vec::new(),
        }
    }

    pub fn pagination_only() -> Self {
        Self {
            pagination: true,
            sorting: false,
            custom: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: ParamCategory) -> Self {
        self.custom.push(category);
        self
    }

    /// Name of the first unsatisfied category, if any.
    pub fn missing_category(&self, params: &QueryParamSet) -> Option<&str> {
        if self.pagination && !(params.contains_key(PAGE_INDEX) && params.contains_key(PAGE_SIZE)) {
            return Some("pagination");
        }
        if self.sorting && !params.contains_key(SORT) {
            return Some("sorting");
        }
        self.custom
            .iter()
            .find(|category| !category.is_satisfied(params))
            .map(|category| category.name.as_str())
    }

    pub fn is_satisfied(&self, params: &QueryParamSet) -> bool {
        self.missing_category(params).is_none()
    }

    /// Keys that take part in change detection for this policy.
    pub fn recognized_keys(&self) -> RecognizedKeys {
        RecognizedKeys::with_keys(
            self.custom
                .iter()
                .flat_map(|category| category.keys.iter().cloned()),
        )
    }
}

/// Why the effect did or did not fire for a location.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectDecision {
    Unchanged,
    NotReady { missing: String },
    Fire(QueryParamSet),
}

/// URL-driven fetch binding for one list component.
pub struct ListQueryEffect<F> {
    component_id: Option<String>,
    policy: MandatoryParams,
    recognized: RecognizedKeys,
    last: ParamsSnapshot,
    fetch: F,
}

impl<F, Fut> ListQueryEffect<F>
where
    F: FnMut(RequestConfig) -> Fut,
    Fut: Future,
{
    pub fn new(fetch: F, component_id: Option<&str>, policy: MandatoryParams) -> Self {
        Self {
            component_id: component_id.filter(|id| !id.is_empty()).map(String::from),
            recognized: policy.recognized_keys(),
            policy,
            last: ParamsSnapshot::NotYetExecuted,
            fetch,
        }
    }

    pub fn component_id(&self) -> Option<&str> {
        self.component_id.as_deref()
    }

    /// Parameters of the last request made, if any.
    pub fn last_params(&self) -> &ParamsSnapshot {
        &self.last
    }

    /// Decide what to do for `search` and record the parameters when firing.
    pub fn evaluate(&mut self, search: &str) -> EffectDecision {
        let params = get_component_query_params_object(search, self.component_id.as_deref());
        let current = ParamsSnapshot::Computed(params.clone());

        if params_equal_over(&current, &self.last, &self.recognized) {
            return EffectDecision::Unchanged;
        }

        if let Some(missing) = self.policy.missing_category(&params) {
            log::debug!(
                "list {:?}: waiting for {} parameters",
                self.component_id,
                missing
            );
            return EffectDecision::NotReady {
                missing: missing.to_string(),
            };
        }

        self.last = current;
        EffectDecision::Fire(params)
    }

    /// React to a location change. Returns the started request, if one was made.
    pub fn on_location_change(&mut self, search: &str) -> Option<Fut> {
        match self.evaluate(search) {
            EffectDecision::Fire(params) => {
                log::debug!("list {:?}: fetching with {:?}", self.component_id, params);
                Some((self.fetch)(RequestConfig { params }))
            }
            _ => None,
        }
    }

    /// Follow `locations` until its sender is dropped, running overlapping
    /// requests concurrently on the current task.
    pub async fn drive(&mut self, mut locations: watch::Receiver<Location>) {
        let mut in_flight = FuturesUnordered::new();

        let search = locations.borrow_and_update().search.clone();
        if let Some(request) = self.on_location_change(&search) {
            in_flight.push(request);
        }

        loop {
            tokio::select! {
                changed = locations.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let search = locations.borrow_and_update().search.clone();
                    if let Some(request) = self.on_location_change(&search) {
                        in_flight.push(request);
                    }
                }
                Some(_) = in_flight.next(), if !in_flight.is_empty() => {}
            }
        }

        while in_flight.next().await.is_some() {}
    }
}
