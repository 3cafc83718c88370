//! Watched blockchain address (§3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletStatus {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub address: String,
    /// Lowercased for case-insensitive chains; compared against
    /// `Transfer::recv_address` / `from_address`.
    pub match_addr: String,
    pub status: WalletStatus,
    /// Controls whether unmatched transfers/resource changes against this
    /// wallet get reported as "unexpected transfer" notifications.
    pub other_notify: bool,
}

impl Wallet {
    pub fn new(address: String, case_sensitive: bool, other_notify: bool) -> Self {
        let match_addr = if case_sensitive {
            address.clone()
        } else {
            address.to_lowercase()
        };

        Wallet {
            address,
            match_addr,
            status: WalletStatus::Enabled,
            other_notify,
        }
    }
}
