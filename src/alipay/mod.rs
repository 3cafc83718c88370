//! Alipay merchant-collect channel integration (§4.I, §6): a signed V3 HTTP
//! client plus the periodic poller that turns bill entries into transfers.

pub mod client;
pub mod keys;
pub mod poller;

pub use client::{AlipayClient, AlipayError};
pub use keys::KeyError;
pub use poller::{AlipayPoller, PollerError};
