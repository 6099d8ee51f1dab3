//! HTTP provisioning target for idstorm
//!
//! Talks to a SCIM-style `/Users` collection over plain HTTP or TLS.

pub mod client;
pub mod errors;
pub mod status;

pub use client::ScimTarget;
pub use errors::HttpTargetError;
pub use status::StatusMap;
