use crate::api::client::PncClient;
use crate::api::models::Page;
use crate::core::list_query::RequestConfig;
use crate::core::services::resources::Resource;
use crate::core::services::traits::ListService;
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Lists one [`Resource`] through the shared REST client.
pub struct RestListService {
    client: Arc<PncClient>,
    resource: Resource,
}

impl RestListService {
    pub fn new(client: Arc<PncClient>, resource: Resource) -> Self {
        Self { client, resource }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }
}

#[async_trait]
impl ListService<Value> for RestListService {
    async fn list(&self, config: RequestConfig) -> Result<Page<Value>, ApiError> {
        self.client
            .get_page(&self.resource.path(), &config.params)
            .await
    }
}
