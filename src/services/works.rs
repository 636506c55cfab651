//! Daily work entries and their component consumption lines. Work rows
//! are the payroll feed (via the `check`/`salary_id` columns) and the
//! actual-cost source for batch reports.

use crate::{
    db::DbPool,
    entities::{batch_process, work, work_specification},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::NaiveDate;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// One consumption line of a work entry. Prices are snapshots taken by
/// the caller; later catalog edits must not rewrite recorded work.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct WorkSpecificationInput {
    #[validate(length(min = 1, max = 32))]
    pub specification_id: String,
    pub component_name: Option<String>,
    #[validate(range(min = 0))]
    pub plan_amount: i32,
    #[validate(range(min = 0))]
    pub actual_amount: i32,
    pub specification_net_price: f64,
    pub specification_gross_price: f64,
}

/// Input for recording a day's work against a stage.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateWorkInput {
    pub batch_process_id: i32,
    pub employee_id: Option<i32>,
    pub employee_name: Option<String>,
    pub work_date: NaiveDate,
    pub unit_pay: f64,
    #[validate(range(min = 0))]
    pub complete_unit: i32,
    pub hour_pay: f64,
    #[validate(range(min = 0))]
    pub complete_hour: i32,
    #[validate(range(min = 0))]
    pub plan_unit: i32,
    /// Denormalized display fields, filled in by the caller.
    pub product_name: Option<String>,
    pub process_name: Option<String>,
    #[validate]
    pub specifications: Vec<WorkSpecificationInput>,
}

/// Partial update of a work entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateWorkInput {
    pub employee_id: Option<i32>,
    pub employee_name: Option<String>,
    pub work_date: Option<NaiveDate>,
    pub unit_pay: Option<f64>,
    #[validate(range(min = 0))]
    pub complete_unit: Option<i32>,
    pub hour_pay: Option<f64>,
    #[validate(range(min = 0))]
    pub complete_hour: Option<i32>,
    #[validate(range(min = 0))]
    pub plan_unit: Option<i32>,
    pub check: Option<bool>,
    pub salary_id: Option<i32>,
    pub product_name: Option<String>,
    pub process_name: Option<String>,
}

/// Optional list filters, all combinable.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct WorkListFilter {
    pub batch_process_id: Option<i32>,
    pub employee_id: Option<i32>,
    /// `false` selects the payroll feed (works not yet claimed).
    pub checked: Option<bool>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// A work entry with its consumption lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkDetail {
    pub work: work::Model,
    pub specifications: Vec<work_specification::Model>,
}

#[derive(Clone)]
pub struct WorkService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl WorkService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    /// Records a work entry and its consumption lines in one transaction.
    #[instrument(skip(self, input))]
    pub async fn create_work(&self, input: CreateWorkInput) -> Result<WorkDetail, ServiceError> {
        input.validate()?;

        let stage = batch_process::Entity::find_by_id(input.batch_process_id)
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

        let work = work::ActiveModel {
            batch_process_id: Set(stage.id),
            employee_id: Set(input.employee_id),
            employee_name: Set(input.employee_name.clone()),
            work_date: Set(input.work_date),
            unit_pay: Set(input.unit_pay),
            complete_unit: Set(input.complete_unit),
            hour_pay: Set(input.hour_pay),
            complete_hour: Set(input.complete_hour),
            plan_unit: Set(input.plan_unit),
            check: Set(false),
            salary_id: Set(None),
            product_name: Set(input.product_name.clone()),
            process_name: Set(input.process_name.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut specifications = Vec::with_capacity(input.specifications.len());
        for line in &input.specifications {
            let model = work_specification::ActiveModel {
                work_id: Set(work.id),
                specification_id: Set(line.specification_id.clone()),
                component_name: Set(line.component_name.clone()),
                plan_amount: Set(line.plan_amount),
                actual_amount: Set(line.actual_amount),
                specification_net_price: Set(line.specification_net_price),
                specification_gross_price: Set(line.specification_gross_price),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            specifications.push(model);
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("workshop_api.works.recorded", 1);
        self.event_sender
            .send_or_log(Event::WorkRecorded {
                work_id: work.id,
                batch_process_id: work.batch_process_id,
                employee_id: work.employee_id,
            })
            .await;

        Ok(WorkDetail {
            work,
            specifications,
        })
    }

    /// A work entry with its lines.
    #[instrument(skip(self))]
    pub async fn get_work(&self, id: i32) -> Result<WorkDetail, ServiceError> {
        let work = work::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Work {} not found", id)))?;

        let specifications = work_specification::Entity::find()
            .filter(work_specification::Column::WorkId.eq(id))
            .order_by_asc(work_specification::Column::Id)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(WorkDetail {
            work,
            specifications,
        })
    }

    /// Work entries matching the filter, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_works(
        &self,
        filter: &WorkListFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<work::Model>, u64), ServiceError> {
        let paginator = self
            .filtered(filter)
            .order_by_desc(work::Column::Id)
            .paginate(self.connection(), limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let works = paginator
            .fetch_page(page.max(1) - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((works, total))
    }

    /// Unclaimed works of one employee in a date range: what a payroll
    /// run would claim.
    #[instrument(skip(self))]
    pub async fn unchecked_for_employee(
        &self,
        employee_id: i32,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<work::Model>, ServiceError> {
        let filter = WorkListFilter {
            employee_id: Some(employee_id),
            checked: Some(false),
            date_from: Some(date_from),
            date_to: Some(date_to),
            ..Default::default()
        };
        self.filtered(&filter)
            .order_by_asc(work::Column::WorkDate)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }

    fn filtered(&self, filter: &WorkListFilter) -> sea_orm::Select<work::Entity> {
        let mut query = work::Entity::find();
        if let Some(stage_id) = filter.batch_process_id {
            query = query.filter(work::Column::BatchProcessId.eq(stage_id));
        }
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(work::Column::EmployeeId.eq(employee_id));
        }
        if let Some(checked) = filter.checked {
            query = query.filter(work::Column::Check.eq(checked));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(work::Column::WorkDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(work::Column::WorkDate.lte(to));
        }
        query
    }

    /// Applies a partial update to a work entry.
    #[instrument(skip(self, input))]
    pub async fn update_work(
        &self,
        id: i32,
        input: UpdateWorkInput,
    ) -> Result<work::Model, ServiceError> {
        input.validate()?;
        let existing = work::Entity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Work {} not found", id)))?;

        let mut active: work::ActiveModel = existing.into();
        if let Some(employee_id) = input.employee_id {
            active.employee_id = Set(Some(employee_id));
        }
        if let Some(employee_name) = input.employee_name {
            active.employee_name = Set(Some(employee_name));
        }
        if let Some(work_date) = input.work_date {
            active.work_date = Set(work_date);
        }
        if let Some(unit_pay) = input.unit_pay {
            active.unit_pay = Set(unit_pay);
        }
        if let Some(complete_unit) = input.complete_unit {
            active.complete_unit = Set(complete_unit);
        }
        if let Some(hour_pay) = input.hour_pay {
            active.hour_pay = Set(hour_pay);
        }
        if let Some(complete_hour) = input.complete_hour {
            active.complete_hour = Set(complete_hour);
        }
        if let Some(plan_unit) = input.plan_unit {
            active.plan_unit = Set(plan_unit);
        }
        if let Some(check) = input.check {
            active.check = Set(check);
        }
        if let Some(salary_id) = input.salary_id {
            active.salary_id = Set(Some(salary_id));
        }
        if let Some(product_name) = input.product_name {
            active.product_name = Set(Some(product_name));
        }
        if let Some(process_name) = input.process_name {
            active.process_name = Set(Some(process_name));
        }

        active
            .update(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Removes a work entry and its lines in one transaction.
    #[instrument(skip(self))]
    pub async fn delete_work(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        work_specification::Entity::delete_many()
            .filter(work_specification::Column::WorkId.eq(id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let result = work::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Work {} does not exist",
                id
            )));
        }

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("workshop_api.works.deleted", 1);
        self.event_sender.send_or_log(Event::WorkDeleted(id)).await;
        Ok(())
    }
}
