//! Request and response records for the v2 API.
//!
//! Field requiredness follows the current v2 contract. Optional fields
//! are nullable and default to `None`; unknown fields are ignored.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::DevicesError;
use crate::schema::{nullable, timestamp, timestamp_opt};

// ── Devices ──────────────────────────────────────────────────────────

/// Remote lock state reported for a device.
///
/// Devices that do not report a lock state decode as `Unknown`, whether
/// the field is absent or `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockStatus {
    /// Device is locked.
    Locked,
    /// Device is unlocked.
    Unlocked,
    /// A lock command is in flight.
    PendingLock,
    /// An unlock command is in flight.
    PendingUnlock,
    /// The last lock command failed.
    FailedLock,
    /// The last unlock command failed.
    FailedUnlock,
    /// Not reported.
    #[default]
    Unknown,
}

fn lock_status_or_unknown<'de, D>(deserializer: D) -> Result<LockStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LockStatus>::deserialize(deserializer)?.unwrap_or_default())
}

/// A managed device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    // Ids
    /// Owning customer.
    pub customer_id: String,
    /// Device id within the customer.
    pub id: String,

    // Audit
    /// Creation time of the record.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last update of the record.
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Composite `customer_id::device_id`.
    #[serde(default)]
    pub host_identifier: Option<String>,
    /// Hardware UUID.
    #[serde(default)]
    pub host_uuid: Option<String>,

    // Source
    /// Management source the device was synced from (e.g. `kaseya`).
    pub source: String,
    /// Device id at the source.
    pub source_id: String,
    /// Last sync with the source.
    #[serde(with = "timestamp")]
    pub source_last_sync: DateTime<Utc>,
    /// Last check-in reported by the source.
    #[serde(with = "timestamp")]
    pub source_last_check_in: DateTime<Utc>,
    /// Enrolled in an MDM.
    pub enrolled: bool,
    /// Host name.
    pub hostname: String,
    /// Whether the device can be traced.
    pub traceable: bool,

    // Hardware
    /// Serial number.
    pub serial: String,
    /// Hardware model.
    #[serde(default)]
    pub hardware_model: Option<String>,
    /// Hardware vendor.
    #[serde(default)]
    pub hardware_vendor: Option<String>,
    /// Free-form hardware description.
    #[serde(default)]
    pub hardware_description: Option<String>,
    /// Installed RAM.
    #[serde(default)]
    pub total_ram: Option<f64>,
    /// Disk capacity.
    #[serde(default)]
    pub total_hard_drive_space: Option<f64>,
    /// Free disk space.
    #[serde(default)]
    pub free_hard_drive_space: Option<f64>,

    // OS
    /// OS family.
    #[serde(default)]
    pub os_type: Option<String>,
    /// OS name.
    #[serde(default)]
    pub os_name: Option<String>,
    /// OS version.
    #[serde(default)]
    pub os_version: Option<String>,
    /// Automatic OS updates enabled.
    #[serde(default)]
    pub os_auto_update: Option<bool>,
    /// Screen lock timeout.
    #[serde(default)]
    pub screen_timeout: Option<f64>,

    // Security
    /// Firewall enabled.
    #[serde(default)]
    pub firewall: Option<bool>,
    /// BitLocker enabled.
    #[serde(default)]
    pub bitlocker: Option<bool>,
    /// BitLocker progress, 0-100.
    #[serde(default)]
    pub bitlocker_encryption_percent: Option<f64>,
    /// FileVault enabled.
    #[serde(default)]
    pub filevault: Option<bool>,
    /// FileVault progress, 0-100.
    #[serde(default)]
    pub filevault_encryption_percent: Option<f64>,
    /// Gatekeeper enabled.
    #[serde(default)]
    pub gatekeeper: Option<bool>,

    // Activity
    /// Last logged-in user.
    #[serde(default)]
    pub username: Option<String>,
    /// Last user activity.
    #[serde(default, with = "timestamp_opt")]
    pub last_active: Option<DateTime<Utc>>,

    // Assignment
    /// Employee the device is assigned to.
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Who made the assignment.
    #[serde(default)]
    pub assigned_by: Option<String>,
    /// When the assignment was made.
    #[serde(default, with = "timestamp_opt")]
    pub assigned_at: Option<DateTime<Utc>>,

    // Computed
    /// Overall health verdict.
    pub healthy: bool,
    /// Whether the device is assigned.
    #[serde(default)]
    pub assigned: Option<bool>,
    /// Reporting state, e.g. `NON_REPORTING`.
    #[serde(default)]
    pub state: Option<String>,
    /// Remote lock state.
    #[serde(default, deserialize_with = "lock_status_or_unknown")]
    pub lock_status: LockStatus,
}

/// One page of devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicesResponse {
    /// Cursor for the next page; `null` on the last page.
    #[serde(deserialize_with = "nullable")]
    pub after: Option<String>,
    /// Devices matching the query across all pages.
    pub total: i64,
    /// Devices in this page.
    pub count: i64,
    /// The page.
    pub data: Vec<Device>,
}

// ── Assignment ───────────────────────────────────────────────────────

/// Binding of a device to an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentData {
    /// `customer_id::device_id`.
    pub host_identifier: String,
    /// Employee id.
    pub assigned_to: String,
    /// Id of whoever made the assignment.
    pub assigned_by: String,
    /// When the assignment was made.
    #[serde(with = "timestamp")]
    pub assigned_at: DateTime<Utc>,
}

/// Envelope of `GET /v2/devices/{host_identifier}/assignment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResponse {
    /// The assignment.
    pub data: AssignmentData,
}

/// Body of `PUT /v2/devices/{host_identifier}/assignment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssignmentPayload {
    /// Employee id.
    pub assigned_to: String,
    /// Id of whoever makes the assignment.
    pub assigned_by: String,
}

/// Body of `POST /v2/assignments/request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAssignmentsPayload {
    /// Customer whose employees are asked to claim devices.
    pub customer_id: String,
    /// Employees to ask.
    pub employee_ids: Vec<String>,
}

// ── MDM ──────────────────────────────────────────────────────────────

/// Supported MDM vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MdmName {
    /// Jamf Pro.
    Jamf,
    /// Kaseya VSA.
    Kaseya,
}

impl MdmName {
    /// Every supported vendor.
    pub const ALL: [MdmName; 2] = [MdmName::Jamf, MdmName::Kaseya];

    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            MdmName::Jamf => "jamf",
            MdmName::Kaseya => "kaseya",
        }
    }
}

impl fmt::Display for MdmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MdmName {
    type Err = DevicesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MdmName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = MdmName::ALL.iter().map(|n| n.as_str()).collect();
                DevicesError::InvalidParams(format!(
                    "MDM name should be one of {allowed:?}, got {s:?}"
                ))
            })
    }
}

/// Provisioning state of a customer's MDM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MdmState {
    /// Requested, not yet provisioned.
    Pending,
    /// Ready to enroll devices.
    Created,
    /// Provisioning failed.
    Failed,
}

/// A customer's MDM enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdmData {
    /// Owning customer.
    pub customer_id: String,
    /// Vendor.
    pub name: MdmName,
    /// Provisioning state.
    pub state: MdmState,
    /// Creation time.
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Last update.
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Vendor-side organisation id.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Vendor server URL.
    #[serde(default)]
    pub server_url: Option<String>,
    /// URL devices use to enroll.
    #[serde(default)]
    pub enroll_url: Option<String>,
}

/// Envelope of the MDM endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdmResponse {
    /// The enrollment.
    pub data: MdmData,
}

/// Body of `POST /v2/mdm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMdmPayload {
    /// Customer to provision for.
    pub customer_id: String,
    /// Vendor.
    pub name: MdmName,
}

// ── Download links ───────────────────────────────────────────────────

/// Agent download links per vendor. `None` when not provisioned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLinks {
    /// Jamf agent link.
    #[serde(default)]
    pub jamf: Option<String>,
    /// Kaseya agent link.
    #[serde(default)]
    pub kaseya: Option<String>,
}

/// Envelope of `GET /v2/download-link/{customer_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLinkResponse {
    /// The links.
    pub data: DownloadLinks,
}

// ── Errors ───────────────────────────────────────────────────────────

/// Error envelope returned with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable explanation.
    pub detail: String,
    /// Whatever the API attached about the failing input.
    #[serde(deserialize_with = "nullable")]
    pub source: Option<Map<String, Value>>,
}
