//! The `Resource` event record (§3): a Tron account bandwidth/energy change.
//! Same shape as `Transfer` plus a resource code and contract-type tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceCode {
    Energy,
    Bandwidth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub contract_type: String,
    pub balance: i64,
    pub from_address: String,
    pub recv_address: String,
    pub timestamp: DateTime<Utc>,
    pub resource_code: ResourceCode,
}
