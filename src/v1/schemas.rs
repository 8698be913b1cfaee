//! Records returned by the v1 device status endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error};

use crate::schema::timestamp_opt;

/// Length of a v1 continuation cursor.
pub const CURSOR_LEN: usize = 32;

fn cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(c) if c.chars().count() != CURSOR_LEN => Err(D::Error::custom(format!(
            "after must be {CURSOR_LEN} characters long, got {}",
            c.chars().count()
        ))),
        other => Ok(other),
    }
}

/// One page of a customer's device status listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDeviceStatus {
    /// Cursor for the next page; `None` on the last page.
    #[serde(default, deserialize_with = "cursor")]
    pub after: Option<String>,
    /// Devices on this page.
    pub count: i64,
    /// Devices across all pages.
    pub total: i64,
    /// The page itself.
    pub devices: Vec<DeviceStatus>,
}

/// Health snapshot of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Owning customer.
    pub customer_id: String,
    /// Stable device key.
    pub serial_number_hash: String,
    /// Hardware serial.
    #[serde(default)]
    pub serial: Option<String>,
    /// Whether the device is enrolled with its source.
    #[serde(default)]
    pub enrolled: Option<bool>,
    /// Integration that reported the device.
    #[serde(default)]
    pub source: Option<String>,
    /// Last report from the device.
    #[serde(default, with = "timestamp_opt")]
    pub last_check_in: Option<DateTime<Utc>>,
    /// Overall health verdict.
    #[serde(default)]
    pub healthy: Option<bool>,
    /// Per-attribute detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<DeviceAttributes>,
}

/// A single reported value and when it last changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceAttribute {
    /// Reported value, always a string on the wire.
    #[serde(default)]
    pub value: Option<String>,
    /// Last time the value changed.
    #[serde(default, with = "timestamp_opt")]
    pub last_update: Option<DateTime<Utc>>,
}

/// Attributes reported for a device. Each is absent when the source does
/// not report it.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, with = "timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub source_last_check_in: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitlocker: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filevault: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gatekeeper: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_model: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_vendor: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_description: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_identifier: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_uuid: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_auto_update: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_name: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_ram: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hard_drive_space: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_hard_drive_space: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitlocker_encryption_percent: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filevault_encryption_percent: Option<DeviceAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_timeout: Option<DeviceAttribute>,
}
