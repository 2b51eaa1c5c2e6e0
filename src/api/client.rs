use crate::api::models::Page;
use crate::core::query_params::QueryParamSet;
use crate::error::ApiError;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("pnc-console/", env!("CARGO_PKG_VERSION"));

/// REST client shared by every list of the console.
///
/// Constructed once at start-up and handed to the services that need it.
#[derive(Debug, Clone)]
pub struct PncClient {
    client: Client,
    pub base_url: String,
    token: Option<String>,
    timeout_secs: u64,
}

impl PncClient {
    pub fn new(base_url: String) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: String, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Http {
                status: 0,
                endpoint: "client_init".to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(PncClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            timeout_secs,
        })
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, url);

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET a list endpoint, sending `params` as the query string.
    pub async fn get_page<T>(&self, path: &str, params: &QueryParamSet) -> Result<Page<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .build_request(Method::GET, path)
            .query(params)
            .send()
            .await
            .map_err(|e| self.convert_request_error(e, path))?;

        self.handle_response(response, path).await
    }

    fn convert_request_error(&self, error: reqwest::Error, endpoint: &str) -> ApiError {
        if error.is_timeout() {
            return ApiError::Timeout {
                timeout_secs: self.timeout_secs,
                endpoint: endpoint.to_string(),
            };
        }
        ApiError::Http {
            status: error.status().map(|s| s.as_u16()).unwrap_or(0),
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        }
    }

    pub async fn handle_response<T>(&self, response: Response, endpoint: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if status.is_success() {
            response.json::<T>().await.map_err(|e| ApiError::Http {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            match status.as_u16() {
                401 | 403 => Err(ApiError::Unauthorized {
                    status: status.as_u16(),
                    endpoint: endpoint.to_string(),
                    server_message: error_text,
                }),
                408 | 504 => Err(ApiError::Timeout {
                    timeout_secs: self.timeout_secs,
                    endpoint: endpoint.to_string(),
                }),
                _ => Err(ApiError::Http {
                    status: status.as_u16(),
                    endpoint: endpoint.to_string(),
                    message: error_text,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_trims_slash() {
        let client = PncClient::new("http://pnc.example.test/pnc-rest/v2/".to_string())
            .expect("client creation failed");
        assert_eq!(client.base_url, "http://pnc.example.test/pnc-rest/v2");
        assert!(!client.is_authenticated());
    }

    #[test]
    fn test_build_request_without_token() {
        let client =
            PncClient::new("http://example.test".to_string()).expect("client creation failed");
        let request = client
            .build_request(Method::GET, "/builds")
            .build()
            .expect("Failed to build request");

        assert_eq!(request.url().as_str(), "http://example.test/builds");
        assert_eq!(request.method(), Method::GET);
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn test_build_request_with_token() {
        let mut client =
            PncClient::new("http://example.test".to_string()).expect("client creation failed");
        client.set_token("abc".to_string());

        let request = client
            .build_request(Method::GET, "/builds")
            .build()
            .expect("Failed to build request");
        assert_eq!(
            request
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok()),
            Some("Bearer abc")
        );
    }

    #[test]
    fn test_params_become_query_string() {
        let client =
            PncClient::new("http://example.test".to_string()).expect("client creation failed");
        let params: QueryParamSet = [("pageIndex", "1"), ("sort", "=desc=submitTime")]
            .into_iter()
            .collect();

        let request = client
            .build_request(Method::GET, "/builds")
            .query(&params)
            .build()
            .expect("Failed to build request");
        assert_eq!(
            request.url().query(),
            Some("pageIndex=1&sort=%3Ddesc%3DsubmitTime")
        );
    }
}
