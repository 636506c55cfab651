//! Batch lifecycle: creation with stage fan-out, status upkeep,
//! completion, and the stage updates that feed the cost report.

use crate::{
    db::DbPool,
    entities::{batch, batch_process, process, product},
    errors::ServiceError,
    events::{Event, EventSender},
    services::identifiers,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Lifecycle states of a batch. Stored as lowercase strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BatchStatus {
    Unstarted,
    Ongoing,
    Urgent,
    Finished,
    Shipped,
    Cancelled,
}

fn parse_status(raw: &str) -> Result<BatchStatus, ServiceError> {
    BatchStatus::from_str(raw)
        .map_err(|_| ServiceError::InvalidInput(format!("Unknown batch status '{}'", raw)))
}

/// Input for creating a batch.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBatchInput {
    #[validate(length(min = 1, max = 32))]
    pub product_id: String,
    #[validate(range(min = 1))]
    pub plan_amount: i32,
    /// Scheduled production start; also selects the id month window.
    pub start: NaiveDateTime,
    pub status: Option<String>,
    pub notice: Option<String>,
}

/// Partial update of a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateBatchInput {
    pub status: Option<String>,
    #[validate(range(min = 1))]
    pub plan_amount: Option<i32>,
    #[validate(range(min = 0))]
    pub actual_amount: Option<i32>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub ship: Option<NaiveDateTime>,
    pub notice: Option<String>,
}

/// Input for marking a batch finished.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CompleteBatchInput {
    #[validate(range(min = 1))]
    pub actual_amount: i32,
    /// When unset, defaults to true: finished goods enter the product
    /// inventory.
    pub update_inventory: Option<bool>,
}

/// Partial update of one batch stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStageInput {
    pub status: Option<String>,
    #[validate(range(min = 1))]
    pub start_amount: Option<i32>,
    #[validate(range(min = 0))]
    pub end_amount: Option<i32>,
}

/// Optional list filters, all combinable.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BatchListFilter {
    pub status: Option<String>,
    pub product_id: Option<String>,
    pub plan_amount_over: Option<i32>,
    pub plan_amount: Option<i32>,
    pub plan_amount_under: Option<i32>,
    pub started_after: Option<NaiveDate>,
    pub started_on: Option<NaiveDate>,
    pub started_before: Option<NaiveDate>,
    /// Batches whose actual output fell short of the plan.
    pub not_fulfilled: Option<bool>,
    /// Batches finished within the last seven days.
    pub recently_ended: Option<bool>,
    /// unstarted + ongoing + urgent.
    pub unfinished: Option<bool>,
    /// ongoing + urgent.
    pub working: Option<bool>,
    /// finished + shipped.
    pub collected: Option<bool>,
}

/// A batch together with its fan-out stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDetail {
    pub batch: batch::Model,
    pub stages: Vec<batch_process::Model>,
}

#[derive(Clone)]
pub struct BatchService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    id_retry_budget: u32,
}

impl BatchService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, id_retry_budget: u32) -> Self {
        Self {
            db_pool,
            event_sender,
            id_retry_budget: id_retry_budget.max(1),
        }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    /// Creates a batch and its stages in one transaction.
    ///
    /// The id comes from the month-window allocator; a concurrent insert
    /// into the same window triggers a recompute-and-retry, bounded by
    /// the configured budget.
    #[instrument(skip(self, input))]
    pub async fn create_batch(&self, input: CreateBatchInput) -> Result<BatchDetail, ServiceError> {
        input.validate()?;
        let status = match &input.status {
            Some(raw) => parse_status(raw)?,
            None => BatchStatus::Unstarted,
        };
        let db = self.connection();

        let product = product::Entity::find_by_id(input.product_id.clone())
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let processes = process::Entity::find()
            .filter(process::Column::ProductId.eq(product.id.clone()))
            .order_by_asc(process::Column::ProcessOrder)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut attempts = 0u32;
        let detail = loop {
            attempts += 1;
            let id = identifiers::allocate_batch_id(db, input.start).await?;

            match self.insert_batch_tree(id, status, &input, &processes).await {
                Ok(detail) => break detail,
                Err(ServiceError::DatabaseError(err))
                    if identifiers::is_unique_violation(&err) =>
                {
                    if attempts >= self.id_retry_budget {
                        return Err(ServiceError::AllocationConflict(format!(
                            "batch id {} kept colliding after {} attempts",
                            id, attempts
                        )));
                    }
                    warn!(batch_id = id, attempt = attempts, "batch id taken, reallocating");
                }
                Err(other) => return Err(other),
            }
        };

        counter!("workshop_api.batches.created", 1);
        info!(
            batch_id = detail.batch.id,
            stages = detail.stages.len(),
            "created batch"
        );
        self.event_sender
            .send_or_log(Event::BatchCreated {
                batch_id: detail.batch.id,
                product_id: detail.batch.product_id.clone(),
                plan_amount: detail.batch.plan_amount,
            })
            .await;

        Ok(detail)
    }

    async fn insert_batch_tree(
        &self,
        id: i32,
        status: BatchStatus,
        input: &CreateBatchInput,
        processes: &[process::Model],
    ) -> Result<BatchDetail, ServiceError> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let batch = batch::ActiveModel {
            id: Set(id),
            status: Set(status.to_string()),
            product_id: Set(input.product_id.clone()),
            plan_amount: Set(input.plan_amount),
            actual_amount: Set(None),
            create: Set(Utc::now().naive_utc()),
            start: Set(input.start),
            end: Set(None),
            ship: Set(None),
            notice: Set(input.notice.clone()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut stages = Vec::with_capacity(processes.len());
        for process in processes {
            let stage = batch_process::ActiveModel {
                status: Set(BatchStatus::Unstarted.to_string()),
                batch_id: Set(id),
                process_id: Set(process.id.clone()),
                start_amount: Set(None),
                end_amount: Set(None),
                unit_pay: Set(process.unit_pay),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            stages.push(stage);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;
        Ok(BatchDetail { batch, stages })
    }

    #[instrument(skip(self))]
    pub async fn get_batch(&self, id: i32) -> Result<batch::Model, ServiceError> {
        batch::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", id)))
    }

    /// Lists batches matching the filter, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_batches(
        &self,
        filter: &BatchListFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<batch::Model>, u64), ServiceError> {
        let mut query = batch::Entity::find();

        if let Some(status) = &filter.status {
            query = query.filter(batch::Column::Status.eq(parse_status(status)?.to_string()));
        }
        if let Some(product_id) = &filter.product_id {
            query = query.filter(batch::Column::ProductId.eq(product_id.clone()));
        }
        if let Some(over) = filter.plan_amount_over {
            query = query.filter(batch::Column::PlanAmount.gte(over));
        }
        if let Some(exact) = filter.plan_amount {
            query = query.filter(batch::Column::PlanAmount.eq(exact));
        }
        if let Some(under) = filter.plan_amount_under {
            query = query.filter(batch::Column::PlanAmount.lte(under));
        }
        if let Some(day) = filter.started_after {
            query = query.filter(batch::Column::Start.gte(day_start(day)?));
        }
        if let Some(day) = filter.started_on {
            query = query
                .filter(batch::Column::Start.gte(day_start(day)?))
                .filter(batch::Column::Start.lte(day_end(day)?));
        }
        if let Some(day) = filter.started_before {
            query = query.filter(batch::Column::Start.lte(day_end(day)?));
        }
        if filter.not_fulfilled.unwrap_or(false) {
            query = query.filter(
                Expr::col(batch::Column::ActualAmount).lt(Expr::col(batch::Column::PlanAmount)),
            );
        }
        if filter.recently_ended.unwrap_or(false) {
            let horizon = Utc::now().naive_utc() - Duration::days(7);
            query = query.filter(batch::Column::End.gte(horizon));
        }
        if filter.unfinished.unwrap_or(false) {
            query = query.filter(batch::Column::Status.is_in(status_strings(&[
                BatchStatus::Unstarted,
                BatchStatus::Ongoing,
                BatchStatus::Urgent,
            ])));
        }
        if filter.working.unwrap_or(false) {
            query = query.filter(
                batch::Column::Status
                    .is_in(status_strings(&[BatchStatus::Ongoing, BatchStatus::Urgent])),
            );
        }
        if filter.collected.unwrap_or(false) {
            query = query.filter(
                batch::Column::Status
                    .is_in(status_strings(&[BatchStatus::Finished, BatchStatus::Shipped])),
            );
        }

        let paginator = query
            .order_by_desc(batch::Column::Id)
            .paginate(self.connection(), limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let batches = paginator
            .fetch_page(page.max(1) - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((batches, total))
    }

    /// Applies a partial update. Setting status to `cancelled` is the
    /// cancellation path and is announced as an event.
    #[instrument(skip(self, input))]
    pub async fn update_batch(
        &self,
        id: i32,
        input: UpdateBatchInput,
    ) -> Result<batch::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_batch(id).await?;
        let old_status = parse_status(&existing.status)?;

        let new_status = match &input.status {
            Some(raw) => Some(parse_status(raw)?),
            None => None,
        };

        let mut active: batch::ActiveModel = existing.into();
        if let Some(status) = new_status {
            active.status = Set(status.to_string());
        }
        if let Some(plan_amount) = input.plan_amount {
            active.plan_amount = Set(plan_amount);
        }
        if let Some(actual_amount) = input.actual_amount {
            active.actual_amount = Set(Some(actual_amount));
        }
        if let Some(start) = input.start {
            active.start = Set(start);
        }
        if let Some(end) = input.end {
            active.end = Set(Some(end));
        }
        if let Some(ship) = input.ship {
            active.ship = Set(Some(ship));
        }
        if let Some(notice) = input.notice {
            active.notice = Set(Some(notice));
        }

        let updated = active
            .update(self.connection())
            .await
            .map_err(ServiceError::db_error)?;

        if new_status == Some(BatchStatus::Cancelled) && old_status != BatchStatus::Cancelled {
            counter!("workshop_api.batches.cancelled", 1);
            self.event_sender
                .send_or_log(Event::BatchCancelled(updated.id))
                .await;
        }

        Ok(updated)
    }

    /// Flips every `unstarted` batch whose start has passed to `ongoing`.
    /// Returns the number of batches transitioned.
    #[instrument(skip(self))]
    pub async fn refresh_statuses(&self) -> Result<u64, ServiceError> {
        let result = batch::Entity::update_many()
            .col_expr(
                batch::Column::Status,
                Expr::value(BatchStatus::Ongoing.to_string()),
            )
            .filter(batch::Column::Status.eq(BatchStatus::Unstarted.to_string()))
            .filter(batch::Column::Start.lte(Utc::now().naive_utc()))
            .exec(self.connection())
            .await
            .map_err(ServiceError::db_error)?;

        if result.rows_affected > 0 {
            info!(count = result.rows_affected, "auto-started batches");
        }
        Ok(result.rows_affected)
    }

    /// Marks a batch finished and, unless opted out, books the output
    /// into the product inventory within the same transaction.
    #[instrument(skip(self, input))]
    pub async fn complete_batch(
        &self,
        id: i32,
        input: CompleteBatchInput,
    ) -> Result<batch::Model, ServiceError> {
        input.validate()?;
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let existing = batch::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", id)))?;

        let mut active: batch::ActiveModel = existing.into();
        active.status = Set(BatchStatus::Finished.to_string());
        active.actual_amount = Set(Some(input.actual_amount));
        active.end = Set(Some(Utc::now().naive_utc()));
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        if input.update_inventory.unwrap_or(true) {
            let product = product::Entity::find_by_id(updated.product_id.clone())
                .one(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::MissingDependentData(format!(
                        "product {} of batch {} is gone",
                        updated.product_id, id
                    ))
                })?;
            let inventory = product.inventory + input.actual_amount;
            let mut product_active: product::ActiveModel = product.into();
            product_active.inventory = Set(inventory);
            product_active
                .update(&txn)
                .await
                .map_err(ServiceError::db_error)?;
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("workshop_api.batches.completed", 1);
        self.event_sender
            .send_or_log(Event::BatchCompleted {
                batch_id: updated.id,
                actual_amount: input.actual_amount,
            })
            .await;

        Ok(updated)
    }

    /// Deletes a batch. Deleting an id that does not exist is a client
    /// mistake and reported as such rather than ignored.
    #[instrument(skip(self))]
    pub async fn delete_batch(&self, id: i32) -> Result<(), ServiceError> {
        let result = batch::Entity::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(ServiceError::db_error)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Batch {} does not exist",
                id
            )));
        }
        counter!("workshop_api.batches.deleted", 1);
        Ok(())
    }

    /// Stages of a batch in fan-out order (ids are assigned in
    /// `process_order` at creation).
    #[instrument(skip(self))]
    pub async fn batch_stages(
        &self,
        batch_id: i32,
    ) -> Result<Vec<batch_process::Model>, ServiceError> {
        // Guard so an empty stage list is distinguishable from a bad id.
        self.get_batch(batch_id).await?;

        batch_process::Entity::find()
            .filter(batch_process::Column::BatchId.eq(batch_id))
            .order_by_asc(batch_process::Column::Id)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Partial update of one stage; the usual way start/end quantities
    /// enter the system.
    #[instrument(skip(self, input))]
    pub async fn update_stage(
        &self,
        stage_id: i32,
        input: UpdateStageInput,
    ) -> Result<batch_process::Model, ServiceError> {
        input.validate()?;
        let existing = batch_process::Entity::find_by_id(stage_id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Batch stage {} not found", stage_id))
            })?;
        let old_status = existing.status.clone();

        let mut active: batch_process::ActiveModel = existing.into();
        if let Some(status) = &input.status {
            active.status = Set(status.clone());
        }
        if let Some(start_amount) = input.start_amount {
            active.start_amount = Set(Some(start_amount));
        }
        if let Some(end_amount) = input.end_amount {
            active.end_amount = Set(Some(end_amount));
        }

        let updated = active
            .update(self.connection())
            .await
            .map_err(ServiceError::db_error)?;

        if updated.status != old_status {
            self.event_sender
                .send_or_log(Event::StageStatusChanged {
                    batch_process_id: updated.id,
                    old_status,
                    new_status: updated.status.clone(),
                })
                .await;
        }

        Ok(updated)
    }
}

fn status_strings(statuses: &[BatchStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.to_string()).collect()
}

fn day_start(day: NaiveDate) -> Result<NaiveDateTime, ServiceError> {
    day.and_hms_opt(0, 0, 0)
        .ok_or_else(|| ServiceError::InvalidInput(format!("Invalid date {}", day)))
}

fn day_end(day: NaiveDate) -> Result<NaiveDateTime, ServiceError> {
    day.and_hms_opt(23, 59, 59)
        .ok_or_else(|| ServiceError::InvalidInput(format!("Invalid date {}", day)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use chrono::NaiveDate;
    use sea_orm::ActiveValue::Set;
    use tokio::sync::mpsc;

    async fn service_with_events() -> (BatchService, mpsc::Receiver<Event>) {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..DbConfig::default()
        };
        let db = establish_connection_with_config(&config).await.unwrap();
        run_migrations(&db).await.unwrap();
        let (tx, rx) = mpsc::channel(16);
        let service = BatchService::new(Arc::new(db), Arc::new(EventSender::new(tx)), 3);
        (service, rx)
    }

    async fn seed_product(service: &BatchService, product_id: &str, orders: &[i32]) {
        product::ActiveModel {
            id: Set(product_id.to_string()),
            name: Set(Some("widget".to_string())),
            inventory: Set(0),
            deprecated: Set(false),
            ..Default::default()
        }
        .insert(service.connection())
        .await
        .unwrap();

        for order in orders {
            process::ActiveModel {
                id: Set(format!("{}-P{}", product_id, order)),
                product_id: Set(product_id.to_string()),
                process_name: Set(format!("step {}", order)),
                process_order: Set(*order),
                unit_pay: Set(*order as f64 / 10.0),
                ..Default::default()
            }
            .insert(service.connection())
            .await
            .unwrap();
        }
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn create_input(product_id: &str, start: NaiveDateTime) -> CreateBatchInput {
        CreateBatchInput {
            product_id: product_id.to_string(),
            plan_amount: 100,
            start,
            status: None,
            notice: None,
        }
    }

    #[tokio::test]
    async fn creating_a_batch_fans_out_stages_in_process_order() {
        let (service, mut rx) = service_with_events().await;
        seed_product(&service, "WX-100", &[30, 10, 20]).await;

        let detail = service
            .create_batch(create_input("WX-100", at(2024, 3, 5)))
            .await
            .unwrap();

        assert_eq!(detail.batch.id, 240301);
        assert_eq!(detail.batch.status, "unstarted");
        assert_eq!(detail.stages.len(), 3);
        let process_ids: Vec<&str> = detail.stages.iter().map(|s| s.process_id.as_str()).collect();
        assert_eq!(process_ids, vec!["WX-100-P10", "WX-100-P20", "WX-100-P30"]);
        assert!(detail.stages.iter().all(|s| s.status == "unstarted"));
        assert!(detail.stages.iter().all(|s| s.start_amount.is_none()));
        assert!((detail.stages[0].unit_pay - 1.0).abs() < 1e-9);

        match rx.recv().await.unwrap() {
            Event::BatchCreated {
                batch_id,
                product_id,
                plan_amount,
            } => {
                assert_eq!(batch_id, 240301);
                assert_eq!(product_id, "WX-100");
                assert_eq!(plan_amount, 100);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn second_batch_in_the_month_gets_the_next_serial() {
        let (service, _rx) = service_with_events().await;
        seed_product(&service, "WX-100", &[10]).await;

        let first = service
            .create_batch(create_input("WX-100", at(2024, 3, 5)))
            .await
            .unwrap();
        let second = service
            .create_batch(create_input("WX-100", at(2024, 3, 20)))
            .await
            .unwrap();

        assert_eq!(first.batch.id, 240301);
        assert_eq!(second.batch.id, 240302);
    }

    #[tokio::test]
    async fn create_rejects_unknown_product_and_bad_status() {
        let (service, _rx) = service_with_events().await;
        seed_product(&service, "WX-100", &[10]).await;

        let err = service
            .create_batch(create_input("GHOST", at(2024, 3, 5)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let mut input = create_input("WX-100", at(2024, 3, 5));
        input.status = Some("paused".to_string());
        let err = service.create_batch(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn list_filters_compose() {
        let (service, _rx) = service_with_events().await;
        seed_product(&service, "WX-100", &[10]).await;
        seed_product(&service, "WX-200", &[10]).await;

        service
            .create_batch(create_input("WX-100", at(2024, 3, 5)))
            .await
            .unwrap();
        let mut input = create_input("WX-200", at(2024, 4, 5));
        input.plan_amount = 50;
        service.create_batch(input).await.unwrap();

        let (all, total) = service
            .list_batches(&BatchListFilter::default(), 1, 10)
            .await
            .unwrap();
        assert_eq!(total, 2);
        // Newest first
        assert_eq!(all[0].id, 240401);

        let filter = BatchListFilter {
            product_id: Some("WX-100".to_string()),
            ..Default::default()
        };
        let (rows, _) = service.list_batches(&filter, 1, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_id, "WX-100");

        let filter = BatchListFilter {
            plan_amount_under: Some(60),
            ..Default::default()
        };
        let (rows, _) = service.list_batches(&filter, 1, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].plan_amount, 50);

        let filter = BatchListFilter {
            started_on: Some(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()),
            ..Default::default()
        };
        let (rows, _) = service.list_batches(&filter, 1, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 240301);

        let filter = BatchListFilter {
            unfinished: Some(true),
            ..Default::default()
        };
        let (rows, _) = service.list_batches(&filter, 1, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn unfulfilled_scope_compares_actual_to_plan() {
        let (service, _rx) = service_with_events().await;
        seed_product(&service, "WX-100", &[10]).await;

        let full = service
            .create_batch(create_input("WX-100", at(2024, 3, 5)))
            .await
            .unwrap();
        let short = service
            .create_batch(create_input("WX-100", at(2024, 3, 6)))
            .await
            .unwrap();

        service
            .complete_batch(
                full.batch.id,
                CompleteBatchInput {
                    actual_amount: 100,
                    update_inventory: Some(false),
                },
            )
            .await
            .unwrap();
        service
            .complete_batch(
                short.batch.id,
                CompleteBatchInput {
                    actual_amount: 80,
                    update_inventory: Some(false),
                },
            )
            .await
            .unwrap();

        let filter = BatchListFilter {
            not_fulfilled: Some(true),
            ..Default::default()
        };
        let (rows, _) = service.list_batches(&filter, 1, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, short.batch.id);
    }

    #[tokio::test]
    async fn refresh_statuses_flips_due_unstarted_batches() {
        let (service, _rx) = service_with_events().await;
        seed_product(&service, "WX-100", &[10]).await;

        // Past start: due. Far future start: not due.
        service
            .create_batch(create_input("WX-100", at(2024, 3, 5)))
            .await
            .unwrap();
        service
            .create_batch(create_input("WX-100", at(2099, 1, 5)))
            .await
            .unwrap();

        let flipped = service.refresh_statuses().await.unwrap();
        assert_eq!(flipped, 1);

        let filter = BatchListFilter {
            working: Some(true),
            ..Default::default()
        };
        let (rows, _) = service.list_batches(&filter, 1, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 240301);

        // Idempotent once everything due has flipped.
        assert_eq!(service.refresh_statuses().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn completing_a_batch_books_output_into_inventory() {
        let (service, mut rx) = service_with_events().await;
        seed_product(&service, "WX-100", &[10]).await;

        let detail = service
            .create_batch(create_input("WX-100", at(2024, 3, 5)))
            .await
            .unwrap();
        let _ = rx.recv().await; // BatchCreated

        let updated = service
            .complete_batch(
                detail.batch.id,
                CompleteBatchInput {
                    actual_amount: 90,
                    update_inventory: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, "finished");
        assert_eq!(updated.actual_amount, Some(90));
        assert!(updated.end.is_some());

        let product = product::Entity::find_by_id("WX-100".to_string())
            .one(service.connection())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.inventory, 90);

        match rx.recv().await.unwrap() {
            Event::BatchCompleted {
                batch_id,
                actual_amount,
            } => {
                assert_eq!(batch_id, detail.batch.id);
                assert_eq!(actual_amount, 90);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn completing_without_inventory_update_leaves_stock_alone() {
        let (service, _rx) = service_with_events().await;
        seed_product(&service, "WX-100", &[10]).await;

        let detail = service
            .create_batch(create_input("WX-100", at(2024, 3, 5)))
            .await
            .unwrap();
        service
            .complete_batch(
                detail.batch.id,
                CompleteBatchInput {
                    actual_amount: 90,
                    update_inventory: Some(false),
                },
            )
            .await
            .unwrap();

        let product = product::Entity::find_by_id("WX-100".to_string())
            .one(service.connection())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.inventory, 0);
    }

    #[tokio::test]
    async fn cancelling_via_update_emits_the_cancellation_event() {
        let (service, mut rx) = service_with_events().await;
        seed_product(&service, "WX-100", &[10]).await;

        let detail = service
            .create_batch(create_input("WX-100", at(2024, 3, 5)))
            .await
            .unwrap();
        let _ = rx.recv().await; // BatchCreated

        let updated = service
            .update_batch(
                detail.batch.id,
                UpdateBatchInput {
                    status: Some("cancelled".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, "cancelled");

        match rx.recv().await.unwrap() {
            Event::BatchCancelled(id) => assert_eq!(id, detail.batch.id),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn deleting_a_missing_batch_is_a_client_error() {
        let (service, _rx) = service_with_events().await;

        let err = service.delete_batch(999999).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));
        assert!(err.to_string().contains("999999"));
    }

    #[tokio::test]
    async fn stage_update_sets_amounts_and_reports_status_moves() {
        let (service, mut rx) = service_with_events().await;
        seed_product(&service, "WX-100", &[10, 20]).await;

        let detail = service
            .create_batch(create_input("WX-100", at(2024, 3, 5)))
            .await
            .unwrap();
        let _ = rx.recv().await; // BatchCreated
        let stage_id = detail.stages[0].id;

        let updated = service
            .update_stage(
                stage_id,
                UpdateStageInput {
                    status: Some("ongoing".to_string()),
                    start_amount: Some(100),
                    end_amount: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, "ongoing");
        assert_eq!(updated.start_amount, Some(100));

        match rx.recv().await.unwrap() {
            Event::StageStatusChanged {
                batch_process_id,
                old_status,
                new_status,
            } => {
                assert_eq!(batch_process_id, stage_id);
                assert_eq!(old_status, "unstarted");
                assert_eq!(new_status, "ongoing");
            }
            other => panic!("unexpected event {:?}", other),
        }

        // Amount-only updates stay quiet.
        service
            .update_stage(
                stage_id,
                UpdateStageInput {
                    status: None,
                    start_amount: None,
                    end_amount: Some(90),
                },
            )
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());

        let stages = service.batch_stages(detail.batch.id).await.unwrap();
        assert_eq!(stages[0].end_amount, Some(90));
        assert_eq!(stages.len(), 2);
    }
}
