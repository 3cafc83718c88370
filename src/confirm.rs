//! Final-confirmation loop (§4.K), grounded on `bin/auto-cancel.rs`'s
//! periodic-loop shape and
//! `original_source/app/task/alipay_mck.go`'s `tradeConfirmHandle`: every
//! tick, confirming orders for a fixed set of trade types either expire (if
//! past deadline) or graduate to success.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::db::{DbError, OrderRepository};
use crate::model::{OrderStatus, OrderTransition, TradeType};
use crate::notify::Notifier;
use crate::scheduler::ScheduledTask;

#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("repository error: {0}")]
    Db(#[from] DbError),
}

/// Drives `confirming` orders of `trade_types` to `failed` (past deadline)
/// or `success` (still live) every `tick_interval`.
pub struct FinalConfirmLoop {
    order_repo: Arc<dyn OrderRepository>,
    notifier: Arc<dyn Notifier>,
    trade_types: Vec<TradeType>,
    tick_interval: Duration,
}

impl FinalConfirmLoop {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        notifier: Arc<dyn Notifier>,
        trade_types: Vec<TradeType>,
        tick_interval: Duration,
    ) -> Self {
        FinalConfirmLoop {
            order_repo,
            notifier,
            trade_types,
            tick_interval,
        }
    }

    async fn tick(&self) -> Result<(), ConfirmError> {
        let confirming = self.order_repo.get_confirming_orders(&self.trade_types).await?;
        let now = Utc::now();

        for order in confirming {
            if order.is_expired_at(now) {
                if self.order_repo.set_failed(&order.order_id).await?.applied() {
                    let mut failed = order.clone();
                    failed.status = OrderStatus::Failed;
                    self.notifier.order_lifecycle(&failed).await;
                }
                continue;
            }

            let transition = self.order_repo.set_success(&order.order_id).await?;
            if transition == OrderTransition::Success {
                let mut succeeded = order;
                succeeded.status = OrderStatus::Success;
                self.notifier.order_success(&succeeded).await;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduledTask for FinalConfirmLoop {
    fn name(&self) -> &str {
        "final-confirm-loop"
    }

    async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        tracing::error!(error = %e, "final-confirm tick failed");
                    }
                }
            }
        }
    }
}
