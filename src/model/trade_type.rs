//! Trade-type registry: the small polymorphism-over-trade-types table described
//! in the design notes, generalized from the per-token constants in
//! `registry[TradeType]` (`model/channel.go`) into a closed Rust enum.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Discriminant spanning chain+token pairs and off-chain rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    UsdtTrc20,
    UsdtErc20,
    UsdtBep20,
    Trx,
    AlipayMck,
}

impl TradeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::UsdtTrc20 => "USDT.TRC20",
            TradeType::UsdtErc20 => "USDT.ERC20",
            TradeType::UsdtBep20 => "USDT.BEP20",
            TradeType::Trx => "TRX",
            TradeType::AlipayMck => "AlipayMck",
        }
    }

    /// Whether order/event matching for this trade type is case-insensitive on
    /// its address field (on-chain addresses mostly are; Alipay match-qr isn't
    /// address-shaped but follows the same case-folding rule as `AddrCaseSens`).
    pub fn case_sensitive_addr(&self) -> bool {
        !matches!(self, TradeType::AlipayMck)
    }

    /// Whether matching orders for this trade type live behind a wallet
    /// address or a channel match-qr.
    pub fn target_type(&self) -> TargetType {
        match self {
            TradeType::AlipayMck => TargetType::Channel,
            _ => TargetType::Wallet,
        }
    }

    /// Standard atomicity (decimal places) for amounts of this trade type.
    pub fn decimal_places(&self) -> u32 {
        match self {
            TradeType::UsdtTrc20 | TradeType::UsdtErc20 | TradeType::UsdtBep20 => 6,
            TradeType::Trx => 6,
            TradeType::AlipayMck => 2,
        }
    }

    /// Global min/max amount gate applied before any matching is attempted.
    pub fn amount_bounds(&self) -> (Decimal, Decimal) {
        match self {
            TradeType::AlipayMck => (Decimal::new(1, 2), Decimal::new(5_000_000, 2)),
            _ => (Decimal::new(1, 6), Decimal::new(1_000_000, 0)),
        }
    }

    pub fn all() -> &'static [TradeType] {
        &[
            TradeType::UsdtTrc20,
            TradeType::UsdtErc20,
            TradeType::UsdtBep20,
            TradeType::Trx,
            TradeType::AlipayMck,
        ]
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether matching orders for a trade type are addressed by wallet or by
/// channel match-qr (§4.D `get_trade_configs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Wallet,
    Channel,
}

/// Per-trade-type configuration as returned by `OrderRepository::get_trade_configs`.
#[derive(Debug, Clone, Copy)]
pub struct TradeConfig {
    pub target_type: TargetType,
}

/// Checks whether an observed amount falls within the trade type's global
/// min/max gate (§4.F `is_amount_valid`).
pub fn is_amount_valid(trade_type: TradeType, amount: Decimal) -> bool {
    let (min, max) = trade_type.amount_bounds();
    amount >= min && amount <= max
}

/// Snapshot of the trade-type registry in the shape the order repository
/// exposes it (§4.D). Derived from the static registry above since trade
/// types here are a closed set, not admin-configurable rows.
pub fn trade_configs() -> HashMap<TradeType, TradeConfig> {
    TradeType::all()
        .iter()
        .map(|t| {
            (
                *t,
                TradeConfig {
                    target_type: t.target_type(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alipay_targets_channel_and_is_case_insensitive() {
        assert_eq!(TradeType::AlipayMck.target_type(), TargetType::Channel);
        assert!(!TradeType::AlipayMck.case_sensitive_addr());
    }

    #[test]
    fn wallet_trade_types_target_wallet_and_are_case_sensitive() {
        assert_eq!(TradeType::UsdtTrc20.target_type(), TargetType::Wallet);
        assert!(TradeType::UsdtTrc20.case_sensitive_addr());
    }

    #[test]
    fn amount_bounds_gate() {
        assert!(is_amount_valid(TradeType::UsdtTrc20, Decimal::new(10_000001, 6)));
        assert!(!is_amount_valid(TradeType::UsdtTrc20, Decimal::new(0, 6)));
    }
}
