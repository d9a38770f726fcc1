//! VM inventory collection
//!
//! Fetches the VM pool snapshot from the OpenNebula control plane.
//!
//! # Example
//!
//! ```ignore
//! use opennebula_exporter::collector::OneClient;
//!
//! let client = OneClient::new("http://localhost:2633/vmpool", 5000, false)?;
//! let vms = client.fetch_pool().await?;
//! ```

mod client;
mod parser;

pub use client::OneClient;
pub use parser::{parse_pool, CollectResult};
