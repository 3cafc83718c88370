//! Domain model: event records, merchant orders, channels/wallets, rates.

pub mod amount;
pub mod channel;
pub mod match_mode;
pub mod notify_record;
pub mod order;
pub mod rate;
pub mod resource;
pub mod trade_type;
pub mod transfer;
pub mod wallet;

pub use amount::{round_half_up_decimal, Amount};
pub use channel::{AlipayMckConfig, Channel, ChannelError, ChannelStatus};
pub use match_mode::PaymentMatchMode;
pub use notify_record::NotifyRecord;
pub use order::{Order, OrderStatus, OrderTransition};
pub use rate::Rate;
pub use resource::{Resource, ResourceCode};
pub use trade_type::{TargetType, TradeConfig, TradeType};
pub use transfer::Transfer;
pub use wallet::{Wallet, WalletStatus};
