//! Page controls bound to `pageIndex` / `pageSize`.

use super::history::{Location, Navigator};
use super::query_params::{
    PAGE_INDEX, PAGE_SIZE, ParamPatch, get_component_query_params_object,
    update_query_params_in_url,
};
use crate::api::models::Page;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// 1-based page position of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
}

fn positive(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v >= 1)
}

#[derive(Debug, Clone)]
pub struct PaginationBinder {
    component_id: Option<String>,
    default_page_size: u32,
}

impl PaginationBinder {
    pub fn new(component_id: Option<&str>) -> Self {
        Self {
            component_id: component_id.filter(|id| !id.is_empty()).map(String::from),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size.max(1);
        self
    }

    /// Page position in the URL, if both parameters are valid.
    pub fn current(&self, location: &Location) -> Option<PageRequest> {
        let params = get_component_query_params_object(&location.search, self.component_id.as_deref());
        Some(PageRequest {
            page_index: positive(params.get(PAGE_INDEX))?,
            page_size: positive(params.get(PAGE_SIZE))?,
        })
    }

    /// Run on mount and on every location change. Missing or invalid values
    /// are replaced by page 1 and the default size in the current history entry.
    pub fn sync(&self, navigator: &dyn Navigator) -> PageRequest {
        let location = navigator.location();
        let params = get_component_query_params_object(&location.search, self.component_id.as_deref());
        let page_index = positive(params.get(PAGE_INDEX));
        let page_size = positive(params.get(PAGE_SIZE));

        let mut patch = ParamPatch::new();
        if page_index.is_none() {
            patch = patch.set(PAGE_INDEX, "1");
        }
        if page_size.is_none() {
            patch = patch.set(PAGE_SIZE, self.default_page_size.to_string());
        }
        if !patch.is_empty() {
            update_query_params_in_url(
                &patch,
                self.component_id.as_deref(),
                &location,
                navigator,
                true,
            );
        }

        PageRequest {
            page_index: page_index.unwrap_or(1),
            page_size: page_size.unwrap_or(self.default_page_size),
        }
    }

    pub fn go_to_page(&self, page_index: u32, navigator: &dyn Navigator) -> Location {
        let patch = ParamPatch::new().set(PAGE_INDEX, page_index.max(1).to_string());
        update_query_params_in_url(
            &patch,
            self.component_id.as_deref(),
            &navigator.location(),
            navigator,
            false,
        )
    }

    /// Changing the size invalidates page offsets, so the list restarts at page 1.
    pub fn set_page_size(&self, page_size: u32, navigator: &dyn Navigator) -> Location {
        let patch = ParamPatch::new()
            .set(PAGE_SIZE, page_size.max(1).to_string())
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

/// Summary line for a fetched page.
pub fn page_info<T>(page: &Page<T>) -> String {
    if page.total_hits == 0 || page.content.is_empty() {
        return "No records found".to_string();
    }
    let start = page.page_index.saturating_sub(1) as u64 * page.page_size as u64 + 1;
    let end = start + page.content.len() as u64 - 1;
    format!(
        "Showing {}-{} of {} records (Page {} of {})",
        start,
        end,
        page.total_hits,
        page.page_index,
        page.total_pages.max(1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::MemoryHistory;
    use crate::core::query_params::get_component_query_param_value;

    #[test]
    fn test_sync_writes_defaults() {
        let history = MemoryHistory::new(Location::new("/products", "?sort=none"));
        let binder = PaginationBinder::new(Some("p")).with_page_size(25);

        let request = binder.sync(&history);
        assert_eq!(
            request,
            PageRequest {
                page_index: 1,
                page_size: 25
            }
        );
        assert_eq!(
            history.location().search,
            "?sort=none&p-pageIndex=1&p-pageSize=25"
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_sync_repairs_invalid_values() {
        let history = MemoryHistory::new(Location::new("/products", "?pageIndex=0&pageSize=20"));
        let binder = PaginationBinder::new(None);

        let request = binder.sync(&history);
        assert_eq!(request.page_index, 1);
        assert_eq!(request.page_size, 20);
        assert_eq!(history.location().search, "?pageIndex=1&pageSize=20");
    }

    #[test]
    fn test_sync_keeps_valid_values() {
        let history = MemoryHistory::new(Location::new("/products", "?pageIndex=4&pageSize=20"));
        let binder = PaginationBinder::new(None);

        assert_eq!(binder.current(&history.location()), Some(binder.sync(&history)));
        assert_eq!(history.location().search, "?pageIndex=4&pageSize=20");
    }

    #[test]
    fn test_set_page_size_resets_index() {
        let history = MemoryHistory::new(Location::new("/builds", "?pageIndex=4&pageSize=20"));
        let binder = PaginationBinder::new(None);

        let next = binder.set_page_size(50, &history);
        assert_eq!(
            get_component_query_param_value(&next.search, PAGE_INDEX, None).as_deref(),
            Some("1")
        );

        let next = binder.go_to_page(3, &history);
        assert_eq!(next.search, "?pageIndex=3&pageSize=50");
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_page_info() {
        let page = Page {
            page_index: 2,
            page_size: 10,
            total_pages: 3,
            total_hits: 25,
            content: vec![0; 10],
        };
        assert_eq!(page_info(&page), "Showing 11-20 of 25 records (Page 2 of 3)");

        let empty: Page<u8> = Page::default();
        assert_eq!(page_info(&empty), "No records found");
    }
}
