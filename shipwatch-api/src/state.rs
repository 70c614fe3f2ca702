use std::sync::Arc;
use shipwatch_core::{OrderRepository, StatusLogRepository};
use shipwatch_order::StatusChangeCoordinator;

use crate::locks::OrderLocks;
use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<StatusChangeCoordinator>,
    pub orders: Arc<dyn OrderRepository>,
    pub status_log: Arc<dyn StatusLogRepository>,
    pub metrics: Arc<Metrics>,
    pub order_locks: Arc<OrderLocks>,
}

impl AppState {
    pub fn new(
        coordinator: StatusChangeCoordinator,
        orders: Arc<dyn OrderRepository>,
        status_log: Arc<dyn StatusLogRepository>,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            coordinator: Arc::new(coordinator),
            orders,
            status_log,
            metrics: Arc::new(Metrics::new()?),
            order_locks: Arc::new(OrderLocks::new()),
        })
    }
}
