//! Order placement coordinator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use common::{CustomerId, OrderId, ProductId, SupplierId};
use domain::{Order, OrderItem, OrderStatus, Product};
use store::{CatalogStore, OrderStore, RoutingTable};
use tracing::Instrument;

use crate::error::{PlacementError, Result};
use crate::request::OrderLineRequest;
use crate::saga::{CommittedLine, PlacementSaga};
use crate::steps;

/// A request line with its routed store and the product snapshot read from it.
struct ResolvedLine {
    store: Arc<dyn CatalogStore>,
    product: Product,
    supplier_id: SupplierId,
    quantity: u32,
}

/// Orchestrates order placement across supplier-routed catalog stores.
///
/// Placement is a saga: stock is decremented line by line with an atomic
/// conditional update, and every committed line is restored in reverse
/// order if a later line or the order write fails. The coordinator holds
/// no mutable state and is cheap to clone.
#[derive(Clone)]
pub struct OrderPlacement {
    routing: Arc<RoutingTable>,
    orders: Arc<dyn OrderStore>,
}

impl OrderPlacement {
    /// Creates a new coordinator.
    pub fn new(routing: Arc<RoutingTable>, orders: Arc<dyn OrderStore>) -> Self {
        Self { routing, orders }
    }

    pub fn routing(&self) -> &Arc<RoutingTable> {
        &self.routing
    }

    /// Places an order and returns it `CONFIRMED`.
    ///
    /// Nothing is mutated until every line has been resolved and validated.
    /// From the first stock commit on, the workflow runs on its own task, so
    /// dropping the returned future cannot interrupt compensation.
    #[tracing::instrument(
        skip(self, lines, shipping_address),
        fields(customer_id = %customer_id, lines = lines.len())
    )]
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        lines: Vec<OrderLineRequest>,
        shipping_address: String,
    ) -> Result<Order> {
        metrics::counter!("placement_orders_total").increment(1);
        let start = Instant::now();

        let result = self.run_placement(customer_id, lines, shipping_address).await;

        let duration = start.elapsed().as_secs_f64();
        metrics::histogram!("placement_duration_seconds").record(duration);
        match &result {
            Ok(order) => {
                metrics::counter!("placement_orders_confirmed").increment(1);
                tracing::info!(
                    order_id = %order.id(),
                    total = %order.calculate_total(),
                    duration,
                    "order confirmed"
                );
            }
            Err(e) => {
                metrics::counter!("placement_orders_failed", "reason" => e.kind()).increment(1);
                if e.is_operator_alert() {
                    tracing::error!(error = %e, "order placement left stock unrestored");
                } else {
                    tracing::warn!(error = %e, "order placement rejected");
                }
            }
        }
        result
    }

    async fn run_placement(
        &self,
        customer_id: CustomerId,
        lines: Vec<OrderLineRequest>,
        shipping_address: String,
    ) -> Result<Order> {
        check_request(&lines, &shipping_address)?;

        let resolved = self.resolve_lines(&lines).await?;
        validate_lines(&resolved)?;

        let items: Vec<OrderItem> = resolved
            .iter()
            .map(|line| OrderItem::snapshot(&line.product, line.supplier_id.clone(), line.quantity))
            .collect();
        let order = Order::place(customer_id, items, shipping_address)?;

        let this = self.clone();
        tokio::spawn(async move { this.commit_and_persist(order, resolved).await }.in_current_span())
            .await
            .map_err(|e| PlacementError::Internal(format!("placement task aborted: {e}")))?
    }

    async fn resolve_lines(&self, lines: &[OrderLineRequest]) -> Result<Vec<ResolvedLine>> {
        let mut resolved = Vec::with_capacity(lines.len());
        for line in lines {
            let store = self.routing.resolve(&line.supplier_id);
            let product = store
                .find_by_id(&line.product_id)
                .await?
                .ok_or_else(|| PlacementError::ProductNotFound(line.product_id.clone()))?;

            tracing::debug!(
                step = steps::STEP_RESOLVE,
                product_id = %line.product_id,
                supplier_id = %line.supplier_id,
                store = store.name(),
                stock = product.stock(),
                "line resolved"
            );
            resolved.push(ResolvedLine {
                store,
                product,
                supplier_id: line.supplier_id.clone(),
                quantity: line.quantity,
            });
        }
        Ok(resolved)
    }

    async fn commit_and_persist(&self, order: Order, lines: Vec<ResolvedLine>) -> Result<Order> {
        let mut saga = PlacementSaga::new(order.id());

        for line in &lines {
            let product_id = line.product.id();
            match line
                .store
                .conditional_decrement_stock(product_id, line.quantity)
                .await
            {
                Ok(remaining) => {
                    metrics::counter!(
                        "store_stock_decrements_total",
                        "store" => line.store.name().to_string()
                    )
                    .increment(1);
                    tracing::info!(
                        step = steps::STEP_COMMIT_STOCK,
                        order_id = %saga.order_id(),
                        %product_id,
                        supplier_id = %line.supplier_id,
                        quantity = line.quantity,
                        remaining,
                        "stock committed"
                    );
                    saga.record_commit(
                        CommittedLine {
                            product_id: product_id.clone(),
                            supplier_id: line.supplier_id.clone(),
                            quantity: line.quantity,
                        },
                        Arc::clone(&line.store),
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        step = steps::STEP_COMMIT_STOCK,
                        order_id = %saga.order_id(),
                        %product_id,
                        supplier_id = %line.supplier_id,
                        error = %e,
                        "stock commit failed"
                    );
                    return Err(self.compensate(&mut saga, e.into()).await);
                }
            }
        }

        saga.begin_persist();
        let confirmed = match order.confirm() {
            Ok(confirmed) => confirmed,
            Err(e) => return Err(self.compensate(&mut saga, e.into()).await),
        };

        match self.orders.save(&confirmed).await {
            Ok(saved) => {
                saga.complete();
                tracing::debug!(
                    step = steps::STEP_PERSIST_ORDER,
                    order_id = %saga.order_id(),
                    state = %saga.state(),
                    lines = saga.committed_count(),
                    "placement saga finished"
                );
                Ok(saved)
            }
            Err(e) => {
                tracing::error!(
                    step = steps::STEP_PERSIST_ORDER,
                    order_id = %saga.order_id(),
                    error = %e,
                    "order persist failed"
                );
                Err(self.compensate(&mut saga, e.into()).await)
            }
        }
    }

    /// Restores every committed line, most recent first, and returns the
    /// error to surface. A failed restore does not stop the remaining ones.
    async fn compensate(&self, saga: &mut PlacementSaga, cause: PlacementError) -> PlacementError {
        let order_id = saga.order_id();
        if saga.committed_count() == 0 {
            saga.fail();
            return cause;
        }

        metrics::counter!("placement_compensations_total").increment(1);
        tracing::warn!(
            step = steps::STEP_COMPENSATE,
            %order_id,
            lines = saga.committed_count(),
            cause = %cause,
            "compensating committed stock"
        );

        let mut unreverted = Vec::new();
        for (line, store) in saga.begin_compensation() {
            match store.increment_stock(&line.product_id, line.quantity).await {
                Ok(stock) => tracing::info!(
                    step = steps::STEP_COMPENSATE,
                    %order_id,
                    product_id = %line.product_id,
                    quantity = line.quantity,
                    stock,
                    "stock restored"
                ),
                Err(e) => {
                    tracing::error!(
                        step = steps::STEP_COMPENSATE,
                        %order_id,
                        product_id = %line.product_id,
                        supplier_id = %line.supplier_id,
                        quantity = line.quantity,
                        error = %e,
                        "stock restore failed, manual repair needed"
                    );
                    unreverted.push(line.clone());
                }
            }
        }
        saga.fail();

        if unreverted.is_empty() {
            return cause;
        }

        unreverted.reverse();
        metrics::counter!("placement_compensation_failed_total").increment(1);
        PlacementError::CompensationFailed {
            cause: cause.to_string(),
            unreverted,
        }
    }

    /// Loads an order by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.find_by_id(order_id).await?)
    }

    /// Returns a customer's orders, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn get_orders_by_customer(&self, customer_id: &CustomerId) -> Result<Vec<Order>> {
        Ok(self.orders.find_by_customer(customer_id).await?)
    }

    /// Cancels an order. Stock is not restored.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let order = self.load_order(order_id).await?;
        let cancelled = order.cancel()?;
        let saved = self.orders.save(&cancelled).await?;

        tracing::info!(%order_id, previous_status = %order.status(), "order cancelled");
        Ok(saved)
    }

    /// Administrative status overwrite. The transition graph is not enforced;
    /// off-graph moves are logged.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let order = self.load_order(order_id).await?;
        if !order.status().can_transition_to(status) {
            tracing::warn!(
                %order_id,
                from = %order.status(),
                to = %status,
                "status override outside the transition graph"
            );
        }

        let updated = order.with_status(status);
        let saved = self.orders.save(&updated).await?;

        tracing::info!(%order_id, %status, "order status updated");
        Ok(saved)
    }

    async fn load_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or(PlacementError::OrderNotFound(order_id))
    }
}

fn check_request(lines: &[OrderLineRequest], shipping_address: &str) -> Result<()> {
    if lines.is_empty() {
        return Err(PlacementError::InvalidRequest(
            "order must contain at least one item".to_string(),
        ));
    }
    if let Some(line) = lines.iter().find(|line| line.quantity == 0) {
        return Err(PlacementError::InvalidRequest(format!(
            "quantity must be positive for product {}",
            line.product_id
        )));
    }
    if shipping_address.trim().is_empty() {
        return Err(PlacementError::InvalidRequest(
            "shipping address is required".to_string(),
        ));
    }
    Ok(())
}

/// Checks every line can be sold. Quantities of lines hitting the same
/// product in the same store are summed first.
fn validate_lines(lines: &[ResolvedLine]) -> Result<()> {
    // Stores are told apart by identity; names are labels only.
    let key = |line: &ResolvedLine| (Arc::as_ptr(&line.store) as *const (), line.product.id().clone());

    let mut demand: HashMap<(*const (), ProductId), u32> = HashMap::new();
    for line in lines {
        let total = demand.entry(key(line)).or_default();
        *total = total.saturating_add(line.quantity);
    }

    for line in lines {
        let requested = demand[&key(line)];
        if !line.product.can_sell(requested) {
            tracing::debug!(
                step = steps::STEP_VALIDATE,
                product_id = %line.product.id(),
                requested,
                in_stock = line.product.stock(),
                "line cannot be sold"
            );
            return Err(PlacementError::InsufficientStock {
                product_id: line.product.id().clone(),
                requested,
                in_stock: line.product.stock(),
            });
        }
    }
    Ok(())
}
