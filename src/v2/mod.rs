//! The `/v2` devices API: listings, assignments, MDM enrollments and
//! agent download links.

pub mod client;
pub mod query;
pub mod schemas;

pub use client::DevicesV2Api;
