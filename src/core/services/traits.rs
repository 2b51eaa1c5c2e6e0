use crate::api::models::Page;
use crate::core::list_query::RequestConfig;
use crate::error::ApiError;
use async_trait::async_trait;

/// Trait for services that list resources page by page
#[async_trait]
pub trait ListService<T>: Send + Sync {
    /// Fetch one page; `config.params` are sent as query parameters
    async fn list(&self, config: RequestConfig) -> Result<Page<T>, ApiError>;
}
