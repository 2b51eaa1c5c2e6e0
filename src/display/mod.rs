//! Terminal presentation of list pages.

pub mod table;

pub use table::TableDisplay;

/// Colors only when stdout is a terminal and `NO_COLOR` is unset.
pub fn use_colors() -> bool {
    atty::is(atty::Stream::Stdout) && std::env::var_os("NO_COLOR").is_none()
}
