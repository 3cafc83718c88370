//! The merchant-facing `Order` record and its status lifecycle (§3, §4.E).
//!
//! The struct itself is a plain snapshot — mutation happens at the
//! repository layer via compare-and-set transition methods (§5: "Order
//! state-machine transitions must be atomic at the persistence layer").
//! `OrderTransition` is the signal a successful CAS hands back to the caller
//! so it knows which notification to fire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::amount::Amount;
use super::trade_type::TradeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Waiting,
    Confirming,
    Success,
    Failed,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Success | OrderStatus::Failed | OrderStatus::Expired)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    /// Wallet address, or a channel's match-qr, depending on trade type.
    pub address: String,
    pub trade_type: TradeType,
    pub amount: Amount,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub expired_at: DateTime<Utc>,
    /// Empty while waiting; non-empty and globally unique thereafter.
    pub ref_hash: String,
    pub from_address: Option<String>,
    pub block_num: Option<i64>,
    /// Alipay's `merchant_order_no`, carried by the transfer's `recv_address`.
    pub merchant_order_no: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub matched_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_waiting(&self) -> bool {
        self.status == OrderStatus::Waiting
    }

    pub fn is_confirming(&self) -> bool {
        self.status == OrderStatus::Confirming
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expired_at <= now
    }
}

/// What a successful repository transition call actually did; `None` means
/// the call found the order already past the precondition and was a no-op
/// (the idempotence §8 property 8 and §4.E require).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    None,
    Expired,
    ConfirmingChannel,
    ConfirmingWallet,
    Success,
    Failed,
}

impl OrderTransition {
    pub fn applied(&self) -> bool {
        !matches!(self, OrderTransition::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Success.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(!OrderStatus::Waiting.is_terminal());
        assert!(!OrderStatus::Confirming.is_terminal());
    }
}
