//! Outbound notifier interface (§6). The core only calls this trait —
//! the concrete webhook/email transport is an external collaborator and
//! explicitly out of scope (§1, §10.G). Fire-and-forget from the core's
//! perspective: callers spawn these and don't await a response path back
//! into order state.

use async_trait::async_trait;

use crate::model::{Order, Resource, Transfer, Wallet};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// An order reached `success`.
    async fn order_success(&self, order: &Order);

    /// An order left `waiting`/`confirming` into a terminal non-success
    /// state (`expired` or `failed`).
    async fn order_lifecycle(&self, order: &Order);

    /// A transfer touched a watched wallet but matched no order.
    async fn non_order_transfer(&self, transfer: &Transfer, wallet: &Wallet);

    /// A Tron energy/bandwidth change touched a watched wallet.
    async fn resource_change(&self, resource: &Resource);
}

/// Default notifier: logs at `info` and does nothing else. Stands in for
/// the real transport the same way the repository traits stand in for a
/// concrete database until one is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn order_success(&self, order: &Order) {
        tracing::info!(order_id = %order.order_id, ref_hash = %order.ref_hash, "order success");
    }

    async fn order_lifecycle(&self, order: &Order) {
        tracing::info!(order_id = %order.order_id, status = ?order.status, "order lifecycle change");
    }

    async fn non_order_transfer(&self, transfer: &Transfer, wallet: &Wallet) {
        tracing::info!(
            tx_hash = %transfer.tx_hash,
            wallet = %wallet.address,
            "unexpected transfer against watched wallet"
        );
    }

    async fn resource_change(&self, resource: &Resource) {
        tracing::info!(resource_id = %resource.id, "resource change on watched wallet");
    }
}
