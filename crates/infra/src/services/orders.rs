use tracing::{info, instrument};

use stockroom_auth::User;
use stockroom_core::OrderId;
use stockroom_sales::{Order, OrderDetail, OrderDraft, OrderItem, OrderStatus, OrderStatusUpdate};

use crate::error::ServiceResult;
use crate::reconciliation::ReconciliationEngine;
use crate::store::{Filter, Store, UnitOfWork, Value};

#[derive(Clone)]
pub struct OrderService<S: Store> {
    store: S,
    engine: ReconciliationEngine<S>,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: S, engine: ReconciliationEngine<S>) -> Self {
        Self { store, engine }
    }

    /// Most recent first, optionally narrowed to one status.
    pub async fn list(&self, status: Option<OrderStatus>) -> ServiceResult<Vec<Order>> {
        let filter = match status {
            Some(status) => Filter::eq("status", status.as_str()),
            None => Filter::All,
        };
        let mut tx = self.store.begin().await?;
        Ok(tx.find(filter).await?)
    }

    pub async fn detail(&self, id: OrderId) -> ServiceResult<OrderDetail> {
        let mut tx = self.store.begin().await?;
        let order = tx.require::<Order>(id).await?;
        let items = tx
            .find::<OrderItem>(Filter::eq("order_id", Value::id(id)))
            .await?;
        Ok(OrderDetail { order, items })
    }

    pub async fn place(&self, draft: OrderDraft) -> ServiceResult<OrderDetail> {
        self.engine.place_order(draft).await
    }

    /// Status changes never move stock.
    #[instrument(skip(self, update), fields(order_id = %id, status = %update.status), err)]
    pub async fn update_status(&self, id: OrderId, update: OrderStatusUpdate) -> ServiceResult<Order> {
        let mut tx = self.store.begin().await?;
        let mut order = tx.require_for_update::<Order>(id).await?;
        if let Some(staff) = update.staff_id {
            tx.require::<User>(staff).await?;
        }
        order.update_status(update);
        tx.save(&order).await?;
        tx.commit().await?;
        info!(order_id = %id, status = %order.status, "order status updated");
        Ok(order)
    }
}
