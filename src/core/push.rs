//! Splicing pushed item updates into an already loaded page.
//!
//! Notifications (e.g. a build changing status) arrive as JSON objects that
//! carry the changed item under a resource key such as `"build"`. Matching
//! rows are replaced in place through [`ServiceContainer::set_data`], so no
//! refetch happens and `loading`/`error` stay as they are.

use serde_json::Value;

use super::service_container::ServiceContainer;
use crate::api::models::Page;

const ID_FIELD: &str = "id";

/// Item carried by a push notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemUpdate {
    pub id: Value,
    pub item: Value,
}

impl ItemUpdate {
    /// Extract the object under `item_key`. `None` if the message has no
    /// such object or the object has no `id`.
    pub fn from_message(message: &Value, item_key: &str) -> Option<Self> {
        let item = message.get(item_key)?;
        if !item.is_object() {
            return None;
        }
        Some(Self {
            id: item.get(ID_FIELD)?.clone(),
            item: item.clone(),
        })
    }
}

/// Replace the row with the same id. Returns whether a row was replaced.
///
/// Unknown items are not inserted: their position depends on sorting and
/// paging the client cannot reproduce.
pub fn splice_item(page: &mut Page<Value>, update: &ItemUpdate) -> bool {
    match page
        .content
        .iter_mut()
        .find(|row| row.get(ID_FIELD) == Some(&update.id))
    {
        Some(row) => {
            *row = update.item.clone();
            true
        }
        None => false,
    }
}

/// Callback for a push channel feeding `container`.
pub fn push_handler(
    container: ServiceContainer<Page<Value>>,
    item_key: impl Into<String>,
) -> impl Fn(Value) + Send + Sync + 'static {
    let item_key = item_key.into();
    move |message: Value| {
        let Some(update) = ItemUpdate::from_message(&message, &item_key) else {
            log::debug!("ignoring push message without '{}'", item_key);
            return;
        };
        container.set_data(|data| {
            if let Some(page) = data.as_mut() {
                if splice_item(page, &update) {
                    log::debug!("spliced pushed {} {}", item_key, update.id);
                }
            }
        });
    }
}
