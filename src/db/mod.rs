//! Persistence contracts (§4.D, §4.E, §6). A concrete SQL-backed
//! implementation is out of scope (§1, §10.G); `memory` carries the
//! in-process reference implementation used by this crate's own tests and
//! by the example entrypoint.

pub mod memory;
pub mod repository;

use thiserror::Error;

pub use repository::{ChannelRepository, NotifyRepository, OrderRepository, RateRepository, WalletRepository};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type DbResult<T> = Result<T, DbError>;
