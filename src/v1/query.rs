//! Device status listing for the v1 API.

use reqwest::Method;

use crate::client::{ApiClient, ApiVersion};
use crate::error::Result;
use crate::query::{DeviceFilters, Query, QueryParams};

use super::schemas::CustomerDeviceStatus;

fn customer_devices_status_path(customer_id: &str) -> String {
    format!("/customers/{customer_id}/devices/status")
}

/// Filtered, paginated device status listing for one customer.
///
/// Unlike v2, the customer goes in the path and the query string starts
/// empty.
#[derive(Debug, Clone)]
pub struct CustomerDevices {
    query: Query,
    customer_id: String,
}

impl CustomerDevices {
    /// Starts a listing for `customer_id`.
    pub fn new(client: ApiClient, customer_id: &str) -> Self {
        CustomerDevices {
            query: Query::new(client, ApiVersion::V1),
            customer_id: customer_id.to_string(),
        }
    }

    /// Customer the listing is for.
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Parameters accumulated so far.
    pub fn query_parameters(&self) -> &QueryParams {
        self.query.params()
    }

    /// Fetches one page.
    pub async fn all(&self) -> Result<CustomerDeviceStatus> {
        let resource = customer_devices_status_path(&self.customer_id);
        self.query.fetch(Method::GET, &resource, None).await
    }
}

impl DeviceFilters for CustomerDevices {
    const ORDER_KEY: &'static str = "orderby";

    fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterByOperator, Order, ParamValue};

    const CUSTOMER_ID: &str = "9a919a42-b506-49ee-b053-402827b761b7";

    fn devices() -> CustomerDevices {
        let client = ApiClient::new("http://someurlrandom.com.ar", Some("token")).unwrap();
        CustomerDevices::new(client, CUSTOMER_ID)
    }

    #[test]
    fn starts_without_parameters() {
        let q = devices();
        assert_eq!(q.customer_id(), CUSTOMER_ID);
        assert!(q.query_parameters().is_empty());
    }

    #[test]
    fn order_by_uses_orderby() {
        let q = devices().order_by(Order::Ascending, "os_version");
        assert_eq!(
            q.query_parameters().get("orderby"),
            Some(&ParamValue::Str("+os_version".into()))
        );
        assert!(q.query_parameters().get("sortby").is_none());
    }

    #[test]
    fn each_mutator_sets_only_its_key() {
        let q = devices().filter_by([("bitlocker", true), ("firewall", true)]);
        assert_eq!(q.query_parameters().len(), 1);
        assert_eq!(
            q.query_parameters().get("filterby"),
            Some(&ParamValue::Str("bitlocker:true,firewall:true".into()))
        );

        let q = devices().filter_by_operator(FilterByOperator::Or);
        assert_eq!(q.query_parameters().len(), 1);
        assert_eq!(
            q.query_parameters().get("filterbyOperator"),
            Some(&ParamValue::Str("or".into()))
        );

        let q = devices().limit(Some(2));
        assert_eq!(q.query_parameters().len(), 1);
        assert_eq!(q.query_parameters().get("limit"), Some(&ParamValue::Int(2)));
    }

    #[test]
    fn path_template() {
        assert_eq!(
            customer_devices_status_path(CUSTOMER_ID),
            format!("/customers/{CUSTOMER_ID}/devices/status")
        );
    }
}
