//! URL-synchronized list state.
//!
//! Dependency flow: `query_params` is the leaf codec over [`history`]; the
//! binders (`sorting`, `pagination`, `filtering`) write defaults and user
//! choices into the URL; `list_query` watches the URL and feeds a
//! `service_container`, which `push` can patch in place.

pub mod filtering;
pub mod history;
pub mod list_query;
pub mod pagination;
pub mod push;
pub mod query_params;
pub mod service_container;
pub mod services;
pub mod sorting;
