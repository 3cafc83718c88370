//! Merchant-collect channel (§3): Alipay app credentials plus the match-qr
//! used to correlate incoming bills with waiting orders. Grounded on
//! `original_source/app/model/channel.go`'s `Channel` / `Validate` /
//! `BeforeSave`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::trade_type::TradeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
    Enabled,
    Disabled,
}

/// Parsed `channels.config` JSON for an `AlipayMck` channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlipayMckConfig {
    #[serde(rename = "appid")]
    pub app_id: String,
    #[serde(rename = "publickey")]
    pub public_key: String,
    #[serde(rename = "privatekey")]
    pub private_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub status: ChannelStatus,
    /// The raw QR URL as registered.
    pub qrcode: String,
    /// Canonical join key: `qrcode`, lowercased iff the trade type is
    /// case-insensitive. Unique together with `trade_type`.
    pub match_qr: String,
    pub trade_type: TradeType,
    pub config: AlipayMckConfig,
    pub other_notify: bool,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid Alipay QR code format")]
    InvalidQrFormat,
    #[error("invalid Alipay app id format")]
    InvalidAppId,
    #[error("invalid Alipay public key")]
    InvalidPublicKey,
    #[error("invalid Alipay private key")]
    InvalidPrivateKey,
}

impl Channel {
    /// Build a channel from its raw QR code and config, deriving `match_qr`
    /// the same way `Channel::BeforeSave` does: copy the QR, then lowercase
    /// it when the trade type doesn't distinguish case.
    pub fn new(
        name: String,
        qrcode: String,
        trade_type: TradeType,
        config: AlipayMckConfig,
        other_notify: bool,
    ) -> Self {
        let match_qr = if trade_type.case_sensitive_addr() {
            qrcode.clone()
        } else {
            qrcode.to_lowercase()
        };

        Channel {
            name,
            status: ChannelStatus::Enabled,
            qrcode,
            match_qr,
            trade_type,
            config,
            other_notify,
        }
    }

    /// Admission-time validation (§7: "reject at admin-write time"). The
    /// admin write surface itself is out of scope, but the check it would
    /// run is not.
    pub fn validate(&self) -> Result<(), ChannelError> {
        if self.trade_type != TradeType::AlipayMck {
            return Ok(());
        }

        if !is_valid_alipay_qr(&self.qrcode) {
            return Err(ChannelError::InvalidQrFormat);
        }
        if !is_valid_alipay_app_id(&self.config.app_id) {
            return Err(ChannelError::InvalidAppId);
        }
        if self.config.public_key.trim().is_empty() {
            return Err(ChannelError::InvalidPublicKey);
        }
        if self.config.private_key.trim().is_empty() {
            return Err(ChannelError::InvalidPrivateKey);
        }

        Ok(())
    }
}

/// e.g. `https://qr.alipay.com/tsx10738hvgx4upcpnel5da`.
fn is_valid_alipay_qr(qr: &str) -> bool {
    qr.starts_with("https://qr.alipay.com/") && qr.len() > "https://qr.alipay.com/".len()
}

/// Alipay app ids are 16-digit numeric strings.
fn is_valid_alipay_app_id(app_id: &str) -> bool {
    app_id.len() == 16 && app_id.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AlipayMckConfig {
        AlipayMckConfig {
            app_id: "2021000000000000".to_string(),
            public_key: "pub".to_string(),
            private_key: "priv".to_string(),
        }
    }

    #[test]
    fn match_qr_lowercased_for_alipay() {
        let c = Channel::new(
            "shop".to_string(),
            "https://qr.alipay.com/TSX1".to_string(),
            TradeType::AlipayMck,
            config(),
            false,
        );
        assert_eq!(c.match_qr, "https://qr.alipay.com/tsx1");
    }

    #[test]
    fn match_qr_preserves_case_for_wallet_trade_types() {
        let c = Channel::new(
            "wallet".to_string(),
            "TAbc123".to_string(),
            TradeType::UsdtTrc20,
            config(),
            false,
        );
        assert_eq!(c.match_qr, "TAbc123");
    }

    #[test]
    fn validate_rejects_bad_qr() {
        let c = Channel::new(
            "shop".to_string(),
            "not-a-qr".to_string(),
            TradeType::AlipayMck,
            config(),
            false,
        );
        assert!(matches!(c.validate(), Err(ChannelError::InvalidQrFormat)));
    }

    #[test]
    fn validate_accepts_well_formed_channel() {
        let c = Channel::new(
            "shop".to_string(),
            "https://qr.alipay.com/tsx10738hvgx4upcpnel5da".to_string(),
            TradeType::AlipayMck,
            config(),
            false,
        );
        assert!(c.validate().is_ok());
    }
}
