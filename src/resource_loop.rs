//! Resource loop (§4.H), grounded on `original_source/app/task/transfer.go`'s
//! `tronResourceHandle`: identical shape to the non-order loop but for Tron
//! energy/bandwidth change events, reporting only energy changes on watched
//! wallets.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use crate::db::{DbError, NotifyRepository, WalletRepository};
use crate::model::{Resource, ResourceCode};
use crate::notify::Notifier;
use crate::queue::QueueReceiver;
use crate::scheduler::ScheduledTask;

#[derive(Debug, Error)]
pub enum ResourceLoopError {
    #[error("repository error: {0}")]
    Db(#[from] DbError),
}

pub struct ResourceLoop {
    wallet_repo: Arc<dyn WalletRepository>,
    notify_repo: Arc<dyn NotifyRepository>,
    notifier: Arc<dyn Notifier>,
    resource_rx: AsyncMutex<QueueReceiver<Resource>>,
    tick_interval: Duration,
}

impl ResourceLoop {
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        notify_repo: Arc<dyn NotifyRepository>,
        notifier: Arc<dyn Notifier>,
        resource_rx: QueueReceiver<Resource>,
        tick_interval: Duration,
    ) -> Self {
        ResourceLoop {
            wallet_repo,
            notify_repo,
            notifier,
            resource_rx: AsyncMutex::new(resource_rx),
            tick_interval,
        }
    }

    async fn process_buffer(&self, buffer: Vec<Resource>) -> Result<(), ResourceLoopError> {
        if buffer.is_empty() {
            return Ok(());
        }

        let watched = self.wallet_repo.get_enabled_and_watched().await?;
        for resource in buffer {
            if resource.resource_code != ResourceCode::Energy {
                continue;
            }

            let touches_watched = watched
                .iter()
                .any(|w| w.match_addr == resource.recv_address || w.match_addr == resource.from_address);
            if !touches_watched {
                continue;
            }

            if self.notify_repo.try_mark_notified(&resource.id).await? {
                self.notifier.resource_change(&resource).await;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduledTask for ResourceLoop {
    fn name(&self) -> &str {
        "resource-loop"
    }

    async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        let mut buffer: Vec<Resource> = Vec::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let mut rx = self.resource_rx.lock().await;
                    buffer.extend(rx.drain_ready());
                    if let Err(e) = self.process_buffer(std::mem::take(&mut buffer)).await {
                        tracing::error!(error = %e, "resource loop final drain failed");
                    }
                    return;
                }
                _ = ticker.tick() => {
                    if !buffer.is_empty() {
                        if let Err(e) = self.process_buffer(std::mem::take(&mut buffer)).await {
                            tracing::error!(error = %e, "resource loop tick failed");
                        }
                    }
                }
                batch = async { self.resource_rx.lock().await.recv().await } => {
                    match batch {
                        Some(b) => buffer.extend(b),
                        None => return,
                    }
                }
            }
        }
    }
}
