//! Resource queries for the v2 API.
//!
//! | Builder | Operation | Endpoint |
//! |---------|-----------|----------|
//! | [`Devices`] | `all` | GET `/v2/devices` |
//! | [`DeviceAssignment`] | `get` / `create` / `delete` | GET/PUT/DELETE `/v2/devices/{host_identifier}/assignment` |
//! | [`Mdm`] | `get` | GET `/v2/mdm/{name}/{customer_id}` |
//! | [`Mdm`] | `create` | POST `/v2/mdm` |
//! | [`DownloadLink`] | `get` | GET `/v2/download-link/{customer_id}` |
//! | [`Assignment`] | `request` | POST `/v2/assignments/request` |

use reqwest::Method;

use crate::client::{ApiClient, ApiVersion};
use crate::error::Result;
use crate::query::{DeviceFilters, Query, QueryParams};
use crate::schema::Schema;

use super::schemas::{
    AssignmentResponse, CreateAssignmentPayload, CreateMdmPayload, DevicesResponse,
    DownloadLinkResponse, MdmName, MdmResponse, RequestAssignmentsPayload,
};

const DEVICES_PATH: &str = "/v2/devices";
const MDM_PATH: &str = "/v2/mdm";
const ASSIGNMENTS_REQUEST_PATH: &str = "/v2/assignments/request";

fn device_assignment_path(host_identifier: &str) -> String {
    format!("/v2/devices/{host_identifier}/assignment")
}

fn customer_mdm_path(name: MdmName, customer_id: &str) -> String {
    format!("/v2/mdm/{name}/{customer_id}")
}

fn download_link_path(customer_id: &str) -> String {
    format!("/v2/download-link/{customer_id}")
}

// ── Devices ──────────────────────────────────────────────────────────

/// Filtered, paginated device listing for one customer.
#[derive(Debug, Clone)]
pub struct Devices {
    query: Query,
}

impl Devices {
    /// Starts a listing; `customerId` is always sent.
    pub fn new(client: ApiClient, customer_id: &str) -> Self {
        let mut query = Query::new(client, ApiVersion::V2);
        query.params_mut().set("customerId", customer_id);
        Devices { query }
    }

    /// Parameters accumulated so far.
    pub fn query_parameters(&self) -> &QueryParams {
        self.query.params()
    }

    /// The session this query runs on.
    pub fn client(&self) -> &ApiClient {
        self.query.client()
    }

    /// Only devices assigned to `user_id`.
    pub fn assigned_to<'a>(mut self, user_id: impl Into<Option<&'a str>>) -> Self {
        if let Some(user) = user_id.into().filter(|u| !u.is_empty()) {
            self.query.params_mut().set("assigned_to", user);
        }
        self
    }

    /// Fetches one page.
    pub async fn all(&self) -> Result<DevicesResponse> {
        self.query.fetch(Method::GET, DEVICES_PATH, None).await
    }
}

impl DeviceFilters for Devices {
    const ORDER_KEY: &'static str = "sortby";

    fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }
}

// ── Device / assignment ──────────────────────────────────────────────

/// A single device, addressed by customer and device id.
#[derive(Debug, Clone)]
pub struct Device {
    client: ApiClient,
    customer_id: String,
    device_id: String,
}

impl Device {
    /// Addresses `device_id` of `customer_id`.
    pub fn new(client: ApiClient, customer_id: &str, device_id: &str) -> Self {
        Device {
            client,
            customer_id: customer_id.to_string(),
            device_id: device_id.to_string(),
        }
    }

    /// Owning customer.
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Device id.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// `customer_id::device_id`, the key used by assignment endpoints.
    pub fn host_identifier(&self) -> String {
        format!("{}::{}", self.customer_id, self.device_id)
    }

    /// The device's assignment resource.
    pub fn assignment(&self) -> DeviceAssignment {
        DeviceAssignment::new(self.client.clone(), &self.host_identifier())
    }
}

/// Assignment of one device to an employee.
#[derive(Debug, Clone)]
pub struct DeviceAssignment {
    query: Query,
    host_identifier: String,
}

impl DeviceAssignment {
    /// Addresses the assignment of `host_identifier`.
    pub fn new(client: ApiClient, host_identifier: &str) -> Self {
        DeviceAssignment {
            query: Query::new(client, ApiVersion::V2),
            host_identifier: host_identifier.to_string(),
        }
    }

    /// `customer_id::device_id` of the device.
    pub fn host_identifier(&self) -> &str {
        &self.host_identifier
    }

    /// Current assignment.
    pub async fn get(&self) -> Result<AssignmentResponse> {
        let resource = device_assignment_path(&self.host_identifier);
        self.query.fetch(Method::GET, &resource, None).await
    }

    /// Assigns the device to `assigned_to`, recorded as done by `assigned_by`.
    pub async fn create(&self, assigned_to: &str, assigned_by: &str) -> Result<()> {
        let payload = CreateAssignmentPayload {
            assigned_to: assigned_to.to_string(),
            assigned_by: assigned_by.to_string(),
        }
        .dump()?;
        let resource = device_assignment_path(&self.host_identifier);
        self.query.send(Method::PUT, &resource, Some(&payload)).await
    }

    /// Removes the assignment.
    pub async fn delete(&self) -> Result<()> {
        let resource = device_assignment_path(&self.host_identifier);
        self.query.send(Method::DELETE, &resource, None).await
    }
}

// ── MDM ──────────────────────────────────────────────────────────────

/// A customer's MDM enrollments.
///
/// Vendor names are checked against [`MdmName`] before any request is
/// made; an unsupported name fails with `InvalidParams`.
#[derive(Debug, Clone)]
pub struct Mdm {
    query: Query,
    customer_id: String,
}

impl Mdm {
    /// Addresses the enrollments of `customer_id`.
    pub fn new(client: ApiClient, customer_id: &str) -> Self {
        Mdm {
            query: Query::new(client, ApiVersion::V2),
            customer_id: customer_id.to_string(),
        }
    }

    /// Owning customer.
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Enrollment for vendor `name`.
    pub async fn get(&self, name: &str) -> Result<MdmResponse> {
        let name: MdmName = name.parse()?;
        let resource = customer_mdm_path(name, &self.customer_id);
        self.query.fetch(Method::GET, &resource, None).await
    }

    /// Provisions vendor `name` for the customer.
    pub async fn create(&self, name: &str) -> Result<MdmResponse> {
        let name: MdmName = name.parse()?;
        let payload = CreateMdmPayload {
            customer_id: self.customer_id.clone(),
            name,
        }
        .dump()?;
        self.query
            .fetch(Method::POST, MDM_PATH, Some(&payload))
            .await
    }
}

// ── Download links ───────────────────────────────────────────────────

/// Agent download links for a customer.
#[derive(Debug, Clone)]
pub struct DownloadLink {
    query: Query,
    customer_id: String,
}

impl DownloadLink {
    /// Addresses the links of `customer_id`.
    pub fn new(client: ApiClient, customer_id: &str) -> Self {
        DownloadLink {
            query: Query::new(client, ApiVersion::V2),
            customer_id: customer_id.to_string(),
        }
    }

    /// Owning customer.
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Current links; vendors not provisioned come back as `None`.
    pub async fn get(&self) -> Result<DownloadLinkResponse> {
        let resource = download_link_path(&self.customer_id);
        self.query.fetch(Method::GET, &resource, None).await
    }
}

// ── Assignment requests ──────────────────────────────────────────────

/// Asks a set of employees to claim their devices.
#[derive(Debug, Clone)]
pub struct Assignment {
    query: Query,
    customer_id: String,
    employee_ids: Vec<String>,
}

impl Assignment {
    /// Prepares a request for `employee_ids` of `customer_id`.
    pub fn new(client: ApiClient, customer_id: &str, employee_ids: &[String]) -> Self {
        Assignment {
            query: Query::new(client, ApiVersion::V2),
            customer_id: customer_id.to_string(),
            employee_ids: employee_ids.to_vec(),
        }
    }

    /// Owning customer.
    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Employees included in the request.
    pub fn employee_ids(&self) -> &[String] {
        &self.employee_ids
    }

    /// Sends the request. The API answers with an empty body.
    pub async fn request(&self) -> Result<()> {
        let payload = RequestAssignmentsPayload {
            customer_id: self.customer_id.clone(),
            employee_ids: self.employee_ids.clone(),
        }
        .dump()?;
        self.query
            .send(Method::POST, ASSIGNMENTS_REQUEST_PATH, Some(&payload))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterByOperator, Order, ParamValue};

    const CUSTOMER_ID: &str = "9a919a42-b506-49ee-b053-402827b761b7";
    const DEVICE_ID: &str = "9c9a7ce5b2fca4658633800bf9cd9d6e";

    fn client() -> ApiClient {
        ApiClient::new("http://someurlrandom.com.ar", Some("aRandomBearerToken")).unwrap()
    }

    fn param<'a>(devices: &'a Devices, key: &str) -> Option<&'a ParamValue> {
        devices.query_parameters().get(key)
    }

    #[test]
    fn devices_starts_with_customer_id() {
        let devices = Devices::new(client(), CUSTOMER_ID);
        assert_eq!(devices.query_parameters().len(), 1);
        assert_eq!(
            param(&devices, "customerId"),
            Some(&ParamValue::Str(CUSTOMER_ID.into()))
        );
        assert_eq!(devices.client().base_url(), "http://someurlrandom.com.ar");
    }

    #[test]
    fn filter_by_joins_lowercased_pairs() {
        let devices = Devices::new(client(), CUSTOMER_ID)
            .filter_by([("bitlocker", true), ("firewall", true)]);
        assert_eq!(
            param(&devices, "filterby"),
            Some(&ParamValue::Str("bitlocker:true,firewall:true".into()))
        );
        assert!(param(&devices, "customerId").is_some());
    }

    #[test]
    fn filter_by_operator_sets_wire_value() {
        let devices = Devices::new(client(), CUSTOMER_ID).filter_by_operator(FilterByOperator::And);
        assert_eq!(
            param(&devices, "filterbyOperator"),
            Some(&ParamValue::Str("and".into()))
        );
    }

    #[test]
    fn limit_and_after() {
        let devices = Devices::new(client(), CUSTOMER_ID)
            .limit(Some(2))
            .after(DEVICE_ID);
        assert_eq!(param(&devices, "limit"), Some(&ParamValue::Int(2)));
        assert_eq!(
            param(&devices, "after"),
            Some(&ParamValue::Str(DEVICE_ID.into()))
        );
    }

    #[test]
    fn empty_inputs_are_no_ops() {
        let none: [(&str, bool); 0] = [];
        let devices = Devices::new(client(), CUSTOMER_ID)
            .filter_by(none)
            .filter_by_operator(None)
            .limit(None)
            .limit(Some(0))
            .after(None)
            .after("")
            .order_by(None, "x")
            .order_by(Order::Ascending, None)
            .assigned_to(None);
        assert_eq!(devices.query_parameters().len(), 1);
    }

    #[test]
    fn order_by_uses_sortby() {
        let devices = Devices::new(client(), CUSTOMER_ID).order_by(Order::Ascending, "os_version");
        assert_eq!(
            param(&devices, "sortby"),
            Some(&ParamValue::Str("+os_version".into()))
        );
        assert!(param(&devices, "orderby").is_none());

        let devices = devices.order_by(Order::Descending, "hostname");
        assert_eq!(
            param(&devices, "sortby"),
            Some(&ParamValue::Str("-hostname".into()))
        );
    }

    #[test]
    fn assigned_to_sets_param() {
        let devices = Devices::new(client(), CUSTOMER_ID).assigned_to("employee-1");
        assert_eq!(
            param(&devices, "assigned_to"),
            Some(&ParamValue::Str("employee-1".into()))
        );
    }

    #[test]
    fn mutators_are_independent() {
        let devices = Devices::new(client(), CUSTOMER_ID)
            .limit(Some(5))
            .filter_by([("firewall", false)]);
        assert_eq!(param(&devices, "limit"), Some(&ParamValue::Int(5)));
        assert_eq!(
            param(&devices, "filterby"),
            Some(&ParamValue::Str("firewall:false".into()))
        );
    }

    #[test]
    fn device_host_identifier_and_assignment() {
        let device = Device::new(client(), CUSTOMER_ID, DEVICE_ID);
        assert_eq!(device.customer_id(), CUSTOMER_ID);
        assert_eq!(device.device_id(), DEVICE_ID);
        let expected = format!("{CUSTOMER_ID}::{DEVICE_ID}");
        assert_eq!(device.host_identifier(), expected);
        assert_eq!(device.assignment().host_identifier(), expected);
    }

    #[test]
    fn endpoint_templates() {
        assert_eq!(device_assignment_path("c::d"), "/v2/devices/c::d/assignment");
        assert_eq!(
            customer_mdm_path(MdmName::Jamf, CUSTOMER_ID),
            format!("/v2/mdm/jamf/{CUSTOMER_ID}")
        );
        assert_eq!(
            download_link_path(CUSTOMER_ID),
            format!("/v2/download-link/{CUSTOMER_ID}")
        );
    }

    #[tokio::test]
    async fn mdm_rejects_unknown_name_without_network() {
        // The base URL does not resolve; reaching the network would yield
        // a Network error instead of InvalidParams.
        let mdm = Mdm::new(client(), CUSTOMER_ID);
        let err = mdm.get("not_an_mdm").await.unwrap_err();
        assert!(matches!(err, crate::error::DevicesError::InvalidParams(_)));
        let err = mdm.create("not_an_mdm").await.unwrap_err();
        assert!(matches!(err, crate::error::DevicesError::InvalidParams(_)));
    }
}
