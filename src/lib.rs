//! Async Rust client library for the API-devices REST service.
//!
//! Covers both API generations: v1 (customer device status) and v2
//! (device listings, assignments, MDM enrollments, agent download links).
//! Requests carry a bearer token, either fixed or taken from an OAuth2
//! client-credentials [`TokenCache`](auth::TokenCache).
//!
//! # Modules
//!
//! - [`auth`] — Bearer authenticator and client-credentials token cache.
//! - [`client`] — Authenticated HTTP session and request executor.
//! - [`error`] — Typed error hierarchy (`DevicesError`) for all library operations.
//! - [`query`] — Query parameters and the shared filter/order/pagination builder.
//! - [`schema`] — JSON codec trait and field helpers for API records.
//! - [`v1`] — Customer device status API.
//! - [`v2`] — Devices, assignments, MDM and download links.
//!
//! # Quick Start
//!
//! ```ignore
//! use api_devices::query::{DeviceFilters, FilterByOperator, Order};
//! use api_devices::v2::DevicesV2Api;
//!
//! let api = DevicesV2Api::new("https://api-devices.example.com", Some(&token))?;
//! let page = api
//!     .devices(customer_id)?
//!     .filter_by([("bitlocker", true), ("firewall", true)])
//!     .filter_by_operator(FilterByOperator::And)
//!     .order_by(Order::Ascending, "os_version")
//!     .limit(Some(50))
//!     .all()
//!     .await?;
//! for device in &page.data {
//!     println!("{} {}", device.hostname, device.healthy);
//! }
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod error;
pub mod query;
pub mod schema;
pub mod v1;
pub mod v2;
