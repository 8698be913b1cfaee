//! The v1 customer device status API.

pub mod client;
pub mod query;
pub mod schemas;

pub use client::DevicesV1Api;
