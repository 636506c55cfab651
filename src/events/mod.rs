use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is gone.
    /// Domain operations never fail because a listener went away.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            error!("Failed to publish {} event: {}", name, e);
        }
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Batch lifecycle events
    BatchCreated {
        batch_id: i32,
        product_id: String,
        plan_amount: i32,
    },
    BatchCompleted {
        batch_id: i32,
        actual_amount: i32,
    },
    BatchCancelled(i32),
    StageStatusChanged {
        batch_process_id: i32,
        old_status: String,
        new_status: String,
    },

    // Work log events
    WorkRecorded {
        work_id: i32,
        batch_process_id: i32,
        employee_id: Option<i32>,
    },
    WorkDeleted(i32),

    // Warehouse events
    MaterialIssued {
        warehouse_record_id: i32,
        batch_process_id: i32,
        component_id: String,
        consumption: i32,
    },
    LowStock {
        component_id: String,
        warn_stock: i32,
        available: i32,
    },

    // Procurement events
    PurchaseFormCreated {
        form_id: i32,
        display_form_id: String,
        vendor_id: i32,
    },
    StockReceived {
        instock_item_id: i32,
        specification_id: String,
        amount: i32,
        balance: i32,
    },

    // Payroll events
    SalaryComputed {
        salary_id: i32,
        employee_id: i32,
        total: f64,
    },
    SalaryPaid(i32),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Stable label for logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Event::BatchCreated { .. } => "batch_created",
            Event::BatchCompleted { .. } => "batch_completed",
            Event::BatchCancelled(_) => "batch_cancelled",
            Event::StageStatusChanged { .. } => "stage_status_changed",
            Event::WorkRecorded { .. } => "work_recorded",
            Event::WorkDeleted(_) => "work_deleted",
            Event::MaterialIssued { .. } => "material_issued",
            Event::LowStock { .. } => "low_stock",
            Event::PurchaseFormCreated { .. } => "purchase_form_created",
            Event::StockReceived { .. } => "stock_received",
            Event::SalaryComputed { .. } => "salary_computed",
            Event::SalaryPaid(_) => "salary_paid",
            Event::Generic { .. } => "generic",
        }
    }
}

// Function to process incoming events. The loop ends when every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("workshop_api.events.received", 1, "event" => event.name());

        match event {
            Event::BatchCompleted {
                batch_id,
                actual_amount,
            } => {
                if let Err(e) = handle_batch_completed(batch_id, actual_amount).await {
                    error!(
                        "Failed to handle batch completed event: batch_id={}, error={}",
                        batch_id, e
                    );
                }
            }
            Event::LowStock {
                component_id,
                warn_stock,
                available,
            } => {
                if let Err(e) = handle_low_stock(&component_id, warn_stock, available).await {
                    error!(
                        "Failed to handle low stock event: component_id={}, error={}",
                        component_id, e
                    );
                }
            }
            Event::StockReceived {
                instock_item_id,
                specification_id,
                amount,
                balance,
            } => {
                info!(
                    "Stock received: item={}, specification={}, amount={}, balance={}",
                    instock_item_id, specification_id, amount, balance
                );
            }
            Event::SalaryComputed {
                salary_id,
                employee_id,
                total,
            } => {
                info!(
                    "Salary computed: salary_id={}, employee_id={}, total={:.2}",
                    salary_id, employee_id, total
                );
            }
            Event::SalaryPaid(salary_id) => {
                info!("Salary marked paid: {}", salary_id);
            }
            Event::BatchCancelled(batch_id) => {
                warn!("Batch cancelled: {}", batch_id);
            }
            _ => {
                info!("No specific handler for event: {:?}", event);
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Handler functions for specific events
async fn handle_batch_completed(batch_id: i32, actual_amount: i32) -> Result<(), String> {
    info!(
        "Processing batch completed event for batch {} with actual amount {}",
        batch_id, actual_amount
    );

    if actual_amount == 0 {
        warn!("Batch {} completed with zero output", batch_id);
    }

    Ok(())
}

async fn handle_low_stock(
    component_id: &str,
    warn_stock: i32,
    available: i32,
) -> Result<(), String> {
    warn!(
        "LOW STOCK WARNING: component {} is below its threshold. Threshold: {}, Available: {}",
        component_id, warn_stock, available
    );

    counter!("workshop_api.stock.low_stock_warnings", 1);

    Ok(())
}
