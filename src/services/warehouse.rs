//! Standard material issues per batch stage. Each record is both the
//! baseline for the cost report and a stock movement: issuing decrements
//! the specification stock, and re-issuing reverses the old movement
//! before applying the new one.

use crate::{
    db::DbPool,
    entities::{batch_process, warehouse_record},
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock::apply_stock_delta,
};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

/// Input for issuing material to a stage. Prices are snapshots taken by
/// the caller at issue time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct IssueMaterialInput {
    pub batch_process_id: i32,
    #[validate(length(min = 1, max = 32))]
    pub component_id: String,
    #[validate(length(min = 1, max = 32))]
    pub specification_id: String,
    pub component_name: Option<String>,
    /// Per-unit standard consumption for the stage.
    #[validate(range(min = 1))]
    pub consumption: i32,
    pub specification_net_price: f64,
    pub specification_gross_price: f64,
}

/// Partial update of an issue record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateWarehouseRecordInput {
    #[validate(length(min = 1, max = 32))]
    pub component_id: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub specification_id: Option<String>,
    pub component_name: Option<String>,
    #[validate(range(min = 1))]
    pub consumption: Option<i32>,
    pub specification_net_price: Option<f64>,
    pub specification_gross_price: Option<f64>,
}

#[derive(Clone)]
pub struct WarehouseService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl WarehouseService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    /// Issues material to a stage: inserts the record and takes the
    /// consumption out of the specification stock, transactionally.
    #[instrument(skip(self, input))]
    pub async fn issue_material(
        &self,
        input: IssueMaterialInput,
    ) -> Result<warehouse_record::Model, ServiceError> {
        input.validate()?;

        batch_process::Entity::find_by_id(input.batch_process_id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Batch stage {} not found",
                    input.batch_process_id
                ))
            })?;

        let txn = self
            .connection()
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let record = warehouse_record::ActiveModel {
            batch_process_id: Set(input.batch_process_id),
            component_id: Set(input.component_id.clone()),
            specification_id: Set(input.specification_id.clone()),
            component_name: Set(input.component_name.clone()),
            consumption: Set(input.consumption),
            specification_net_price: Set(input.specification_net_price),
            specification_gross_price: Set(input.specification_gross_price),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        apply_stock_delta(&txn, &record.specification_id, -record.consumption).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("workshop_api.warehouse.issues", 1);
        self.event_sender
            .send_or_log(Event::MaterialIssued {
                warehouse_record_id: record.id,
                batch_process_id: record.batch_process_id,
                component_id: record.component_id.clone(),
                consumption: record.consumption,
            })
            .await;

        Ok(record)
    }

    /// Re-issues: credits the old consumption back to the old
    /// specification, applies the changes, then debits the new
    /// consumption from the (possibly different) specification.
    #[instrument(skip(self, input))]
    pub async fn update_record(
        &self,
        id: i32,
        input: UpdateWarehouseRecordInput,
    ) -> Result<warehouse_record::Model, ServiceError> {
        input.validate()?;
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let existing = warehouse_record::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Warehouse record {} not found", id))
            })?;

        apply_stock_delta(&txn, &existing.specification_id, existing.consumption).await?;

        let mut active: warehouse_record::ActiveModel = existing.into();
        if let Some(component_id) = input.component_id {
            active.component_id = Set(component_id);
        }
        if let Some(specification_id) = input.specification_id {
            active.specification_id = Set(specification_id);
        }
        if let Some(component_name) = input.component_name {
            active.component_name = Set(Some(component_name));
        }
        if let Some(consumption) = input.consumption {
            active.consumption = Set(consumption);
        }
        if let Some(net) = input.specification_net_price {
            active.specification_net_price = Set(net);
        }
        if let Some(gross) = input.specification_gross_price {
            active.specification_gross_price = Set(gross);
        }
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        apply_stock_delta(&txn, &updated.specification_id, -updated.consumption).await?;

        txn.commit().await.map_err(ServiceError::db_error)?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_record(&self, id: i32) -> Result<warehouse_record::Model, ServiceError> {
        warehouse_record::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Warehouse record {} not found", id)))
    }

    /// All issues of one stage, the cost report baseline.
    #[instrument(skip(self))]
    pub async fn records_for_stage(
        &self,
        batch_process_id: i32,
    ) -> Result<Vec<warehouse_record::Model>, ServiceError> {
        warehouse_record::Entity::find()
            .filter(warehouse_record::Column::BatchProcessId.eq(batch_process_id))
            .order_by_asc(warehouse_record::Column::Id)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Issue history of one component across all stages.
    #[instrument(skip(self))]
    pub async fn records_for_component(
        &self,
        component_id: &str,
    ) -> Result<Vec<warehouse_record::Model>, ServiceError> {
        warehouse_record::Entity::find()
            .filter(warehouse_record::Column::ComponentId.eq(component_id))
            .order_by_desc(warehouse_record::Column::Id)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }
}
