//! Ledger of one placement run.

use std::sync::Arc;

use common::{OrderId, ProductId, SupplierId};
use serde::{Deserialize, Serialize};
use store::CatalogStore;

use crate::state::SagaState;

/// A stock decrement that has been applied to a supplier store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedLine {
    pub product_id: ProductId,
    pub supplier_id: SupplierId,
    pub quantity: u32,
}

/// Tracks the state of a placement and the stock it has committed, so the
/// coordinator knows exactly what to restore on failure.
pub(crate) struct PlacementSaga {
    order_id: OrderId,
    state: SagaState,
    committed: Vec<(CommittedLine, Arc<dyn CatalogStore>)>,
}

impl PlacementSaga {
    pub(crate) fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            state: SagaState::NotStarted,
            committed: Vec::new(),
        }
    }

    pub(crate) fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub(crate) fn state(&self) -> SagaState {
        self.state
    }

    /// Records a successful decrement.
    pub(crate) fn record_commit(&mut self, line: CommittedLine, store: Arc<dyn CatalogStore>) {
        debug_assert!(self.state.can_commit(), "commit recorded in {}", self.state);
        self.state = SagaState::Committing;
        self.committed.push((line, store));
    }

    pub(crate) fn begin_persist(&mut self) {
        self.state = SagaState::Persisting;
    }

    pub(crate) fn complete(&mut self) {
        self.state = SagaState::Completed;
    }

    /// Switches to compensation and hands out the committed lines, most
    /// recent first.
    pub(crate) fn begin_compensation(
        &mut self,
    ) -> impl Iterator<Item = &(CommittedLine, Arc<dyn CatalogStore>)> {
        if self.state.can_compensate() {
            self.state = SagaState::Compensating;
        }
        self.committed.iter().rev()
    }

    pub(crate) fn fail(&mut self) {
        self.state = SagaState::Failed;
    }

    pub(crate) fn committed_count(&self) -> usize {
        self.committed.len()
    }
}
