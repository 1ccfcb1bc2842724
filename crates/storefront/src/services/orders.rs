//! Order reads, mutations and dashboard filtering.

use cardshop_core::{
    NewOrder, Order, OrderId, OrderStatus, OrderUpdate, PaymentContactStatus, Principal,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::backend::{Backend, BackendResult};
use crate::query::{QueryClient, QueryError, QueryKey, QueryOptions};

/// Keys made stale by any change to a single order.
const ORDER_MUTATION_ROOTS: [&str; 3] = [QueryKey::ORDERS, QueryKey::ORDER, QueryKey::MY_ORDERS];

/// Order operations for one caller, with cache invalidation on writes.
pub struct OrderService<'a> {
    backend: &'a dyn Backend,
    queries: &'a QueryClient,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(backend: &'a dyn Backend, queries: &'a QueryClient) -> Self {
        Self { backend, queries }
    }

    fn options(&self) -> QueryOptions {
        QueryOptions::enabled_if(self.backend.is_ready())
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection.
    #[instrument(skip(self, order), fields(caller = %caller))]
    pub async fn submit(&self, caller: &Principal, order: &NewOrder) -> BackendResult<OrderId> {
        let id = self.backend.submit_order(caller, order).await?;
        self.queries
            .invalidate(&[QueryKey::ORDERS, QueryKey::MY_ORDERS])
            .await;
        info!(order_id = %id, "Order placed");
        Ok(id)
    }

    /// Every order (admin only).
    ///
    /// # Errors
    ///
    /// Returns an error if the query is disabled or the backend fails.
    pub async fn all_orders(&self, caller: &Principal) -> Result<Vec<Order>, QueryError> {
        self.queries
            .fetch(&QueryKey::orders(caller), self.options(), || {
                self.backend.get_all_orders(caller)
            })
            .await
    }

    /// The caller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is disabled or the backend fails.
    pub async fn my_orders(&self, caller: &Principal) -> Result<Vec<Order>, QueryError> {
        let mut orders = self
            .queries
            .fetch(&QueryKey::my_orders(caller), self.options(), || {
                self.backend.get_my_orders(caller)
            })
            .await?;
        sort_newest_first(&mut orders);
        Ok(orders)
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is disabled or the backend fails.
    pub async fn order(&self, caller: &Principal, id: OrderId) -> Result<Option<Order>, QueryError> {
        self.queries
            .fetch(&QueryKey::order(id, caller), self.options(), || {
                self.backend.get_order(caller, id)
            })
            .await
    }

    /// # Errors
    ///
    /// Returns the backend's rejection.
    #[instrument(skip(self), fields(caller = %caller))]
    pub async fn update_status(
        &self,
        caller: &Principal,
        id: OrderId,
        status: OrderStatus,
    ) -> BackendResult<()> {
        self.backend.update_order_status(caller, id, status).await?;
        self.invalidate_order_state().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the backend's rejection.
    #[instrument(skip(self, notes), fields(caller = %caller))]
    pub async fn update_payment_contact(
        &self,
        caller: &Principal,
        id: OrderId,
        status: PaymentContactStatus,
        notes: &str,
    ) -> BackendResult<()> {
        self.backend
            .update_payment_contact_status(caller, id, status, notes)
            .await?;
        self.invalidate_order_state().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the backend's rejection.
    #[instrument(skip(self, update), fields(caller = %caller))]
    pub async fn update(
        &self,
        caller: &Principal,
        id: OrderId,
        update: &OrderUpdate,
    ) -> BackendResult<()> {
        self.backend.update_order(caller, id, update).await?;
        self.invalidate_order_state().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the backend's rejection.
    #[instrument(skip(self), fields(caller = %caller))]
    pub async fn set_tracking_number(
        &self,
        caller: &Principal,
        id: OrderId,
        tracking_number: &str,
    ) -> BackendResult<()> {
        self.backend
            .add_or_update_tracking_number(caller, id, tracking_number)
            .await?;
        self.invalidate_order_state().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the backend's rejection.
    #[instrument(skip(self), fields(caller = %caller))]
    pub async fn delete(&self, caller: &Principal, id: OrderId) -> BackendResult<()> {
        self.backend.delete_order(caller, id).await?;
        self.invalidate_order_state().await;
        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    async fn invalidate_order_state(&self) {
        self.queries.invalidate(&ORDER_MUTATION_ROOTS).await;
    }
}

fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_time.cmp(&a.created_time));
}

// =============================================================================
// Dashboard filtering
// =============================================================================

/// Filter value that matches everything.
pub const ALL: &str = "all";

/// Dashboard query string: `?search=&status=&payment=`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment: Option<String>,
}

fn selected<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value
        .filter(|v| !v.is_empty() && *v != ALL)
        .and_then(|v| v.parse().ok())
}

impl OrderFilter {
    /// Selected fulfillment status, if not "all".
    #[must_use]
    pub fn status(&self) -> Option<OrderStatus> {
        selected(self.status.as_deref())
    }

    /// Selected payment-contact status, if not "all".
    #[must_use]
    pub fn payment(&self) -> Option<PaymentContactStatus> {
        selected(self.payment.as_deref())
    }

    /// Whether any filter or search term is active.
    #[must_use]
    pub fn is_filtering(&self) -> bool {
        !self.search.trim().is_empty() || self.status().is_some() || self.payment().is_some()
    }

    /// Whether `order` passes every active filter.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        self.status().is_none_or(|s| order.status == s)
            && self.payment().is_none_or(|p| order.payment_contact_status == p)
            && order.matches_search(&self.search)
    }

    /// Matching orders, newest first.
    #[must_use]
    pub fn apply(&self, orders: &[Order]) -> Vec<Order> {
        let mut filtered: Vec<Order> = orders.iter().filter(|o| self.matches(o)).cloned().collect();
        sort_newest_first(&mut filtered);
        filtered
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub shipped: usize,
}

impl OrderStats {
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        let count = |status| orders.iter().filter(|o| o.status == status).count();
        Self {
            total: orders.len(),
            pending: count(OrderStatus::Pending),
            shipped: count(OrderStatus::Shipped),
        }
    }
}
