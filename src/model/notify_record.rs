//! `NotifyRecord` — the uniqueness-on-`txid` dedup record used by the
//! non-order and resource loops (§3, §5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyRecord {
    pub txid: String,
}
