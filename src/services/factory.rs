use std::sync::Arc;

use crate::{
    db::DbPool,
    events::EventSender,
    services::{
        batches::BatchService, payroll::PayrollService, procurement::ProcurementService,
        reports::CostReportService, stock::StockService, warehouse::WarehouseService,
        works::WorkService,
    },
};

/// Factory for creating service instances with shared dependencies
pub struct ServiceFactory {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    id_retry_budget: u32,
}

impl ServiceFactory {
    /// Creates a new service factory with the given dependencies
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, id_retry_budget: u32) -> Self {
        Self {
            db_pool,
            event_sender,
            id_retry_budget,
        }
    }

    /// Creates a batch service instance
    pub fn batch_service(&self) -> BatchService {
        BatchService::new(
            self.db_pool.clone(),
            self.event_sender.clone(),
            self.id_retry_budget,
        )
    }

    /// Creates a work log service instance
    pub fn work_service(&self) -> WorkService {
        WorkService::new(self.db_pool.clone(), self.event_sender.clone())
    }

    /// Creates a warehouse service instance
    pub fn warehouse_service(&self) -> WarehouseService {
        WarehouseService::new(self.db_pool.clone(), self.event_sender.clone())
    }

    /// Creates a stock service instance
    pub fn stock_service(&self) -> StockService {
        StockService::new(self.db_pool.clone(), self.event_sender.clone())
    }

    /// Creates a procurement service instance
    pub fn procurement_service(&self) -> ProcurementService {
        ProcurementService::new(
            self.db_pool.clone(),
            self.event_sender.clone(),
            self.id_retry_budget,
        )
    }

    /// Creates a payroll service instance
    pub fn payroll_service(&self) -> PayrollService {
        PayrollService::new(self.db_pool.clone(), self.event_sender.clone())
    }

    /// Creates a cost report service instance
    pub fn cost_report_service(&self) -> CostReportService {
        CostReportService::new(self.db_pool.clone())
    }

    /// Gets a reference to the database pool
    pub fn db_pool(&self) -> &Arc<DbPool> {
        &self.db_pool
    }

    /// Gets a reference to the event sender
    pub fn event_sender(&self) -> &Arc<EventSender> {
        &self.event_sender
    }
}

/// Service container holding all service instances
#[derive(Clone)]
pub struct ServiceContainer {
    pub batches: Arc<BatchService>,
    pub works: Arc<WorkService>,
    pub warehouse: Arc<WarehouseService>,
    pub stock: Arc<StockService>,
    pub procurement: Arc<ProcurementService>,
    pub payroll: Arc<PayrollService>,
    pub reports: Arc<CostReportService>,
}

impl ServiceContainer {
    /// Creates a new service container with all services initialized
    pub fn new(factory: &ServiceFactory) -> Self {
        Self {
            batches: Arc::new(factory.batch_service()),
            works: Arc::new(factory.work_service()),
            warehouse: Arc::new(factory.warehouse_service()),
            stock: Arc::new(factory.stock_service()),
            procurement: Arc::new(factory.procurement_service()),
            payroll: Arc::new(factory.payroll_service()),
            reports: Arc::new(factory.cost_report_service()),
        }
    }
}
