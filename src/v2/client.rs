//! Entry point for the v2 API.
//!
//! [`DevicesV2Api`] holds one authenticated session and hands out resource
//! builders. Each factory checks its required arguments and fails with
//! `InvalidParams` before any request is built.

use std::sync::Arc;

use crate::auth::TokenCache;
use crate::client::ApiClient;
use crate::error::{DevicesError, Result};

use super::query::{Assignment, Device, Devices, DownloadLink, Mdm};

/// Client for the `/v2` endpoints.
#[derive(Debug, Clone)]
pub struct DevicesV2Api {
    client: ApiClient,
}

impl DevicesV2Api {
    /// Session with a fixed bearer token. Fails with `InvalidToken` when
    /// `token` is missing or empty.
    pub fn new(url: &str, token: Option<&str>) -> Result<Self> {
        Ok(DevicesV2Api {
            client: ApiClient::new(url, token)?,
        })
    }

    /// Session that takes its tokens from `cache`.
    pub fn with_token_cache(url: &str, cache: Arc<TokenCache>) -> Result<Self> {
        Ok(DevicesV2Api {
            client: ApiClient::with_token_cache(url, cache)?,
        })
    }

    /// Wraps an existing session.
    pub fn from_client(client: ApiClient) -> Self {
        DevicesV2Api { client }
    }

    /// The underlying session.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Device listing for `customer_id`.
    pub fn devices(&self, customer_id: &str) -> Result<Devices> {
        require_customer(customer_id)?;
        Ok(Devices::new(self.client.clone(), customer_id))
    }

    /// A single device.
    pub fn device(&self, customer_id: &str, device_id: &str) -> Result<Device> {
        if customer_id.is_empty() || device_id.is_empty() {
            return Err(DevicesError::InvalidParams(
                "Both customer_id and device_id are needed to query API-Devices".to_string(),
            ));
        }
        Ok(Device::new(self.client.clone(), customer_id, device_id))
    }

    /// MDM enrollments of `customer_id`.
    pub fn mdm(&self, customer_id: &str) -> Result<Mdm> {
        require_customer(customer_id)?;
        Ok(Mdm::new(self.client.clone(), customer_id))
    }

    /// Agent download links of `customer_id`.
    pub fn download_link(&self, customer_id: &str) -> Result<DownloadLink> {
        require_customer(customer_id)?;
        Ok(DownloadLink::new(self.client.clone(), customer_id))
    }

    /// Assignment request for `employee_ids`. At least one id is required.
    pub fn assignments(&self, customer_id: &str, employee_ids: &[String]) -> Result<Assignment> {
        if customer_id.is_empty() || employee_ids.is_empty() {
            return Err(DevicesError::InvalidParams(
                "Both customer_id and employee_ids are needed to query API-Devices".to_string(),
            ));
        }
        Ok(Assignment::new(self.client.clone(), customer_id, employee_ids))
    }
}

fn require_customer(customer_id: &str) -> Result<()> {
    if customer_id.is_empty() {
        return Err(DevicesError::InvalidParams(
            "customer_id is needed to query API-devices".to_string(),
        ));
    }
    Ok(())
}
