//! Two-way binding between a list's sort control and its `sort` parameter.
//!
//! Wire format: `none`, or `=<asc|desc>=<attribute>`.

use std::fmt;
use std::str::FromStr;

use super::history::{Location, Navigator};
use super::query_params::{
    PAGE_INDEX, ParamPatch, SORT, get_component_query_param_value, update_query_params_in_url,
};

const SORT_NONE: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

/// Current sort of a list. A `None` direction means explicitly unsorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub attribute: String,
    pub direction: Option<SortDirection>,
}

impl SortSpec {
    pub fn new(attribute: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            attribute: attribute.into(),
            direction: Some(direction),
        }
    }

    pub fn asc(attribute: impl Into<String>) -> Self {
        Self::new(attribute, SortDirection::Asc)
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self::new(attribute, SortDirection::Desc)
    }

    pub fn unsorted() -> Self {
        Self {
            attribute: String::new(),
            direction: None,
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.direction.is_some()
    }

    /// Value of the `sort` parameter.
    pub fn to_param(&self) -> String {
        match self.direction {
            Some(direction) => format!("={}={}", direction, self.attribute),
            None => SORT_NONE.to_string(),
        }
    }

    /// Parse a `sort` parameter. `None` for anything malformed.
    pub fn parse(value: &str) -> Option<Self> {
        if value == SORT_NONE {
            return Some(Self::unsorted());
        }
        let (direction, attribute) = value.strip_prefix('=')?.split_once('=')?;
        if attribute.is_empty() {
            return None;
        }
        Some(Self::new(attribute, direction.parse().ok()?))
    }
}

/// A column the user may sort by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOption {
    pub id: String,
    pub title: String,
}

impl SortOption {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Keeps one component's sort control and its `sort` parameter in step.
#[derive(Debug, Clone)]
pub struct SortingBinder {
    component_id: Option<String>,
    options: Vec<SortOption>,
    default_sort: Option<SortSpec>,
}

impl SortingBinder {
    /// With no `options`, any attribute is accepted.
    pub fn new(component_id: Option<&str>, options: Vec<SortOption>) -> Self {
        Self {
            component_id: component_id.filter(|id| !id.is_empty()).map(String::from),
            options,
            default_sort: None,
        }
    }

    pub fn with_default(mut self, default_sort: SortSpec) -> Self {
        self.default_sort = Some(default_sort);
        self
    }

    pub fn options(&self) -> &[SortOption] {
        &self.options
    }

    fn is_valid(&self, spec: &SortSpec) -> bool {
        !spec.is_sorted()
            || self.options.is_empty()
            || self.options.iter().any(|option| option.id == spec.attribute)
    }

    /// Sort currently in the URL, if present and valid.
    pub fn current(&self, location: &Location) -> Option<SortSpec> {
        get_component_query_param_value(&location.search, SORT, self.component_id.as_deref())
            .and_then(|value| SortSpec::parse(&value))
            .filter(|spec| self.is_valid(spec))
    }

    /// Run on mount and on every location change.
    ///
    /// A missing or invalid parameter is replaced by the default sort, or by
    /// `none` without a default. The history entry is replaced and `pageIndex`
    /// is left alone.
    pub fn sync(&self, navigator: &dyn Navigator) -> SortSpec {
        let location = navigator.location();
        if let Some(spec) = self.current(&location) {
            return spec;
        }

        let spec = self
            .default_sort
            .clone()
            .filter(|spec| self.is_valid(spec))
            .unwrap_or_else(SortSpec::unsorted);
        log::debug!(
            "sort {:?}: initializing to {}",
            self.component_id,
            spec.to_param()
        );

        let patch = ParamPatch::new().set(SORT, spec.to_param());
        update_query_params_in_url(
            &patch,
            self.component_id.as_deref(),
            &location,
            navigator,
            true,
        );
        spec
    }

    /// User picked a sort. Resets the list to its first page.
    pub fn sort_by(&self, spec: &SortSpec, navigator: &dyn Navigator) -> Location {
        let patch = ParamPatch::new()
            .set(SORT, spec.to_param())
            .set(PAGE_INDEX, "1");
        update_query_params_in_url(
            &patch,
            self.component_id.as_deref(),
            &navigator.location(),
            navigator,
            false,
        )
    }

    /// Column header click: a new column starts ascending, the same column
    /// cycles ascending, descending, unsorted.
    pub fn toggle(&self, attribute: &str, navigator: &dyn Navigator) -> SortSpec {
        let current = self.current(&navigator.location());
        let next = match current {
            Some(spec) if spec.attribute == attribute => match spec.direction {
                None => SortSpec::asc(attribute),
                Some(SortDirection::Asc) => SortSpec::desc(attribute),
                Some(SortDirection::Desc) => SortSpec::unsorted(),
            },
            _ => SortSpec::asc(attribute),
        };
        self.sort_by(&next, navigator);
        next
    }
}
