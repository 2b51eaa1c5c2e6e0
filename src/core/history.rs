//! Browser-style history for list views.
//!
//! The URL query string is the shared state every list reads and writes.
//! [`Navigator`] is the seam the binders write through; [`MemoryHistory`]
//! is the in-process implementation used by the CLI and the tests.

use std::sync::Mutex;
use tokio::sync::watch;

/// Path and query string of the current view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub pathname: String,
    /// Query string including the leading `?`, or empty.
    pub search: String,
}

impl Location {
    pub fn new(pathname: impl Into<String>, search: impl Into<String>) -> Self {
        let search = search.into();
        let search = if search.is_empty() || search.starts_with('?') {
            search
        } else {
            format!("?{}", search)
        };

        Self {
            pathname: pathname.into(),
            search,
        }
    }

    /// Full relative URL, e.g. `/builds?pageIndex=1`.
    pub fn href(&self) -> String {
        format!("{}{}", self.pathname, self.search)
    }
}

/// Navigation without a page reload.
pub trait Navigator: Send + Sync {
    /// Current location.
    fn location(&self) -> Location;
    /// Navigate and add a new history entry.
    fn push(&self, location: Location);
    /// Navigate and overwrite the current history entry.
    fn replace(&self, location: Location);
}

#[derive(Debug)]
struct Entries {
    stack: Vec<Location>,
    index: usize,
}

/// In-memory history stack with observable location changes.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Entries>,
    current: watch::Sender<Location>,
}

impl MemoryHistory {
    pub fn new(initial: Location) -> Self {
        let (current, _) = watch::channel(initial.clone());
        Self {
            entries: Mutex::new(Entries {
                stack: vec![initial],
                index: 0,
            }),
            current,
        }
    }

    /// Subscribe to location changes. The receiver starts at the current location.
    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.current.subscribe()
    }

    /// Number of entries in the back stack up to and including the current one.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.index + 1)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Go one entry back. Returns false when already at the first entry.
    pub fn back(&self) -> bool {
        let previous = match self.entries.lock() {
            Ok(mut entries) if entries.index > 0 => {
                entries.index -= 1;
                entries.stack[entries.index].clone()
            }
            _ => return false,
        };
        self.current.send_replace(previous);
        true
    }

    fn navigate(&self, location: Location, replace: bool) {
        if let Ok(mut entries) = self.entries.lock() {
            let index = entries.index;
            if replace {
                entries.stack[index] = location.clone();
            } else {
                entries.stack.truncate(index + 1);
                entries.stack.push(location.clone());
                entries.index += 1;
            }
        }
        log::debug!(
            "history {}: {}",
            if replace { "replace" } else { "push" },
            location.href()
        );
        self.current.send_replace(location);
    }
}

impl Navigator for MemoryHistory {
    fn location(&self) -> Location {
        self.current.borrow().clone()
    }

    fn push(&self, location: Location) {
        self.navigate(location, false);
    }

    fn replace(&self, location: Location) {
        self.navigate(location, true);
    }
}
