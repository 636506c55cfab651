// Catalog
pub mod component;
pub mod process;
pub mod product;
pub mod specification;
pub mod vendor;

// Production
pub mod batch;
pub mod batch_process;
pub mod warehouse_record;
pub mod work;
pub mod work_specification;

// Workforce
pub mod employee;
pub mod salary;

// Procurement
pub mod instock_form;
pub mod instock_item;
pub mod instock_record;
