//! Non-order loop (§4.G), grounded on `original_source/app/task/transfer.go`'s
//! `notOrderTransferHandle`: drains transfers that matched no waiting order
//! and, for those touching a watched wallet, fires a deduplicated
//! "unexpected transfer" notification.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use crate::db::{DbError, NotifyRepository, WalletRepository};
use crate::model::Transfer;
use crate::notify::Notifier;
use crate::queue::QueueReceiver;
use crate::scheduler::ScheduledTask;

#[derive(Debug, Error)]
pub enum NonOrderError {
    #[error("repository error: {0}")]
    Db(#[from] DbError),
}

pub struct NonOrderLoop {
    wallet_repo: Arc<dyn WalletRepository>,
    notify_repo: Arc<dyn NotifyRepository>,
    notifier: Arc<dyn Notifier>,
    transfer_rx: AsyncMutex<QueueReceiver<Transfer>>,
    tick_interval: Duration,
}

impl NonOrderLoop {
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        notify_repo: Arc<dyn NotifyRepository>,
        notifier: Arc<dyn Notifier>,
        transfer_rx: QueueReceiver<Transfer>,
        tick_interval: Duration,
    ) -> Self {
        NonOrderLoop {
            wallet_repo,
            notify_repo,
            notifier,
            transfer_rx: AsyncMutex::new(transfer_rx),
            tick_interval,
        }
    }

    async fn process_buffer(&self, buffer: Vec<Transfer>) -> Result<(), NonOrderError> {
        if buffer.is_empty() {
            return Ok(());
        }

        let watched = self.wallet_repo.get_watched().await?;
        for transfer in buffer {
            let wallet = watched
                .iter()
                .find(|w| w.match_addr == transfer.recv_address || w.match_addr == transfer.from_address);
            let Some(wallet) = wallet else { continue };

            if self.notify_repo.try_mark_notified(&transfer.tx_hash).await? {
                self.notifier.non_order_transfer(&transfer, wallet).await;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduledTask for NonOrderLoop {
    fn name(&self) -> &str {
        "non-order-loop"
    }

    async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        let mut buffer: Vec<Transfer> = Vec::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let mut rx = self.transfer_rx.lock().await;
                    buffer.extend(rx.drain_ready());
                    if let Err(e) = self.process_buffer(std::mem::take(&mut buffer)).await {
                        tracing::error!(error = %e, "non-order loop final drain failed");
                    }
                    return;
                }
                _ = ticker.tick() => {
                    if !buffer.is_empty() {
                        if let Err(e) = self.process_buffer(std::mem::take(&mut buffer)).await {
                            tracing::error!(error = %e, "non-order loop tick failed");
                        }
                    }
                }
                batch = async { self.transfer_rx.lock().await.recv().await } => {
                    match batch {
                        Some(b) => buffer.extend(b),
                        None => return,
                    }
                }
            }
        }
    }
}
