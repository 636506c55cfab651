// Production floor
pub mod batches;
pub mod reports;
pub mod works;

// Warehouse and purchasing
pub mod procurement;
pub mod stock;
pub mod warehouse;

// Payroll
pub mod payroll;

// Display-id allocation shared by batches and purchase forms
pub mod identifiers;

// Service factory for dependency injection
pub mod factory;

pub use batches::BatchService;
pub use factory::{ServiceContainer, ServiceFactory};
pub use payroll::PayrollService;
pub use procurement::ProcurementService;
pub use reports::CostReportService;
pub use stock::StockService;
pub use warehouse::WarehouseService;
pub use works::WorkService;
