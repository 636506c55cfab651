pub mod batches;
pub mod common;
pub mod payroll;
pub mod procurement;
pub mod stock;
pub mod warehouse;
pub mod works;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;
