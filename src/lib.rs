//! Payment-reconciliation core.
//!
//! Ingests on-chain transfers and Tron resource events, matches them
//! against waiting orders (wallet path and Alipay channel path), polls
//! Alipay for settled bills, aggregates crypto/fiat rates, and drives
//! orders through their confirm/expire lifecycle. Persistence and outbound
//! notification delivery are abstracted behind traits; concrete transports
//! live outside this crate.

pub mod alipay;
pub mod config;
pub mod confirm;
pub mod db;
pub mod matcher;
pub mod model;
pub mod nonorder;
pub mod notify;
pub mod queue;
pub mod rate;
pub mod resource_loop;
pub mod scheduler;

pub use config::{Config, ConfigError};
pub use db::{DbError, DbResult};
pub use notify::{LoggingNotifier, Notifier};
pub use scheduler::{ScheduledTask, TaskScheduler};
