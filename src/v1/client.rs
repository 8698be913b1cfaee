//! Entry point for the v1 API.

use crate::client::ApiClient;
use crate::error::{DevicesError, Result};

use super::query::CustomerDevices;

/// Client for the `/customers` endpoints.
#[derive(Debug, Clone)]
pub struct DevicesV1Api {
    client: ApiClient,
}

impl DevicesV1Api {
    /// Session with a fixed bearer token. Fails with `InvalidToken` when
    /// `token` is missing or empty.
    pub fn new(url: &str, token: Option<&str>) -> Result<Self> {
        Ok(DevicesV1Api {
            client: ApiClient::new(url, token)?,
        })
    }

    /// Wraps an existing session.
    pub fn from_client(client: ApiClient) -> Self {
        DevicesV1Api { client }
    }

    /// Device status listing for `customer_id`.
    pub fn get_devices(&self, customer_id: &str) -> Result<CustomerDevices> {
        if customer_id.is_empty() {
            return Err(DevicesError::InvalidParams(
                "No customer id set to query API-devices".to_string(),
            ));
        }
        Ok(CustomerDevices::new(self.client.clone(), customer_id))
    }
}
