//! Pay statements. Creating a statement claims the employee's unchecked
//! work entries in the period, so the same work entry is never paid
//! twice; deleting one releases them back into the unpaid pool.

use crate::{
    db::DbPool,
    entities::{employee, salary, work},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, Value,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Status a statement moves to when its payment is confirmed.
const PAID: &str = "paid";

/// Input for computing a statement over a work period.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSalaryInput {
    pub employee_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub unit_salary: Option<f64>,
    pub hour_salary: Option<f64>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub deduction: f64,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub bonus: f64,
    pub status: Option<String>,
    pub notice: Option<String>,
}

/// Partial update of a statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSalaryInput {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub unit_salary: Option<f64>,
    pub hour_salary: Option<f64>,
    #[validate(range(min = 0.0))]
    pub deduction: Option<f64>,
    #[validate(range(min = 0.0))]
    pub bonus: Option<f64>,
    pub status: Option<String>,
    pub notice: Option<String>,
}

/// Input for confirming a payment; both fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ConfirmPaymentInput {
    /// Defaults to now.
    pub check_date: Option<NaiveDateTime>,
    /// Defaults to `paid`.
    pub status: Option<String>,
}

/// Optional statement list filters, all combinable. The period pair
/// selects statements whose whole period lies inside the window.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SalaryListFilter {
    pub employee_id: Option<i32>,
    pub status: Option<String>,
    pub period_after: Option<NaiveDate>,
    pub period_before: Option<NaiveDate>,
}

/// One work entry of a statement with its pay contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryStatementLine {
    pub work_id: i32,
    pub work_date: NaiveDate,
    pub product_name: Option<String>,
    pub process_name: Option<String>,
    pub complete_unit: i32,
    pub unit_pay: f64,
    pub complete_hour: i32,
    pub hour_pay: f64,
    pub work_sum: f64,
}

/// A statement with its claimed work entries and derived totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryStatement {
    pub salary: salary::Model,
    pub lines: Vec<SalaryStatementLine>,
    pub subtotal: f64,
    pub total: f64,
}

fn statement_lines(works: &[work::Model]) -> (Vec<SalaryStatementLine>, f64) {
    let mut lines = Vec::with_capacity(works.len());
    let mut subtotal = 0.0;
    for entry in works {
        let work_sum = entry.unit_pay * entry.complete_unit as f64
            + entry.hour_pay * entry.complete_hour as f64;
        subtotal += work_sum;
        lines.push(SalaryStatementLine {
            work_id: entry.id,
            work_date: entry.work_date,
            product_name: entry.product_name.clone(),
            process_name: entry.process_name.clone(),
            complete_unit: entry.complete_unit,
            unit_pay: entry.unit_pay,
            complete_hour: entry.complete_hour,
            hour_pay: entry.hour_pay,
            work_sum,
        });
    }
    (lines, subtotal)
}

fn assemble_statement(salary: salary::Model, works: &[work::Model]) -> SalaryStatement {
    let (lines, subtotal) = statement_lines(works);
    let total = subtotal - salary.deduction + salary.bonus;
    SalaryStatement {
        salary,
        lines,
        subtotal,
        total,
    }
}

#[derive(Clone)]
pub struct PayrollService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PayrollService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    fn connection(&self) -> &DatabaseConnection {
        self.db_pool.as_ref()
    }

    /// Inserts the statement and claims the employee's unchecked works in
    /// the period, all in one transaction. Emits `SalaryComputed` with the
    /// statement total.
    #[instrument(skip(self, input))]
    pub async fn create_statement(
        &self,
        input: CreateSalaryInput,
    ) -> Result<SalaryStatement, ServiceError> {
        input.validate()?;
        if input.end_date < input.start_date {
            return Err(ServiceError::InvalidInput(
                "Statement period ends before it starts".to_string(),
            ));
        }

        let db = self.connection();
        let worker = employee::Entity::find_by_id(input.employee_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", input.employee_id))
            })?;

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let statement = salary::ActiveModel {
            employee_id: Set(input.employee_id),
            employee_name: Set(Some(worker.name.clone())),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            unit_salary: Set(input.unit_salary),
            hour_salary: Set(input.hour_salary),
            deduction: Set(input.deduction),
            bonus: Set(input.bonus),
            status: Set(input.status.clone()),
            notice: Set(input.notice.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let claimed = work::Entity::update_many()
            .col_expr(work::Column::SalaryId, Expr::value(statement.id))
            .col_expr(work::Column::Check, Expr::value(true))
            .filter(work::Column::EmployeeId.eq(input.employee_id))
            .filter(work::Column::Check.eq(false))
            .filter(work::Column::WorkDate.gte(input.start_date))
            .filter(work::Column::WorkDate.lte(input.end_date))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let works = work::Entity::find()
            .filter(work::Column::SalaryId.eq(statement.id))
            .order_by_asc(work::Column::WorkDate)
            .order_by_asc(work::Column::Id)
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        let detail = assemble_statement(statement, &works);
        counter!("workshop_api.payroll.statements", 1);
        info!(
            salary_id = detail.salary.id,
            employee_id = input.employee_id,
            claimed = claimed.rows_affected,
            total = detail.total,
            "computed pay statement"
        );
        self.event_sender
            .send_or_log(Event::SalaryComputed {
                salary_id: detail.salary.id,
                employee_id: input.employee_id,
                total: detail.total,
            })
            .await;

        Ok(detail)
    }

    /// A statement with its work lines and totals derived on the fly.
    #[instrument(skip(self))]
    pub async fn statement(&self, salary_id: i32) -> Result<SalaryStatement, ServiceError> {
        let statement = salary::Entity::find_by_id(salary_id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Salary statement {} not found", salary_id))
            })?;

        let works = work::Entity::find()
            .filter(work::Column::SalaryId.eq(salary_id))
            .order_by_asc(work::Column::WorkDate)
            .order_by_asc(work::Column::Id)
            .all(self.connection())
            .await
            .map_err(ServiceError::db_error)?;

        Ok(assemble_statement(statement, &works))
    }

    /// Statements matching the filter, newest first.
    #[instrument(skip(self, filter))]
    pub async fn list_statements(
        &self,
        filter: &SalaryListFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<salary::Model>, u64), ServiceError> {
        let mut query = salary::Entity::find();
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(salary::Column::EmployeeId.eq(employee_id));
        }
        if let Some(status) = &filter.status {
            query = query.filter(salary::Column::Status.eq(status.clone()));
        }
        if let Some(after) = filter.period_after {
            query = query.filter(salary::Column::StartDate.gte(after));
        }
        if let Some(before) = filter.period_before {
            query = query.filter(salary::Column::EndDate.lte(before));
        }

        let paginator = query
            .order_by_desc(salary::Column::Id)
            .paginate(self.connection(), limit.max(1));
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let rows = paginator
            .fetch_page(page.max(1) - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok((rows, total))
    }

    /// Applies a partial update. The claimed works are untouched.
    #[instrument(skip(self, input))]
    pub async fn update_statement(
        &self,
        salary_id: i32,
        input: UpdateSalaryInput,
    ) -> Result<salary::Model, ServiceError> {
        input.validate()?;
        let existing = salary::Entity::find_by_id(salary_id)
            .one(self.connection())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Salary statement {} not found", salary_id))
            })?;

        let mut active: salary::ActiveModel = existing.into();
        if let Some(start_date) = input.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(end_date);
        }
        if let Some(unit_salary) = input.unit_salary {
            active.unit_salary = Set(Some(unit_salary));
        }
        if let Some(hour_salary) = input.hour_salary {
            active.hour_salary = Set(Some(hour_salary));
        }
        if let Some(deduction) = input.deduction {
            active.deduction = Set(deduction);
        }
        if let Some(bonus) = input.bonus {
            active.bonus = Set(bonus);
        }
        if let Some(status) = input.status {
            active.status = Set(Some(status));
        }
        if let Some(notice) = input.notice {
            active.notice = Set(Some(notice));
        }

        active
            .update(self.connection())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Marks the statement paid and stamps the check date through to the
    /// employee's `last_pay_check` in the same transaction. Emits
    /// `SalaryPaid`.
    #[instrument(skip(self, input))]
    pub async fn confirm_payment(
        &self,
        salary_id: i32,
        input: ConfirmPaymentInput,
    ) -> Result<salary::Model, ServiceError> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let statement = salary::Entity::find_by_id(salary_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Salary statement {} not found", salary_id))
            })?;
        let worker = employee::Entity::find_by_id(statement.employee_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::MissingDependentData(format!(
                    "employee {} of salary statement {} is gone",
                    statement.employee_id, salary_id
                ))
            })?;

        let check_date = input.check_date.unwrap_or_else(|| Utc::now().naive_utc());

        let mut active: salary::ActiveModel = statement.into();
        active.status = Set(Some(input.status.unwrap_or_else(|| PAID.to_string())));
        active.check_date = Set(Some(check_date));
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;

        let mut active_worker: employee::ActiveModel = worker.into();
        active_worker.last_pay_check = Set(Some(check_date));
        active_worker
            .update(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("workshop_api.payroll.payments", 1);
        info!(salary_id, "confirmed salary payment");
        self.event_sender.send_or_log(Event::SalaryPaid(salary_id)).await;

        Ok(updated)
    }

    /// Deletes a statement and releases the works it claimed back into
    /// the unpaid pool, in one transaction.
    #[instrument(skip(self))]
    pub async fn delete_statement(&self, salary_id: i32) -> Result<(), ServiceError> {
        let txn = self
            .connection()
            .begin()
            .await
            .map_err(ServiceError::db_error)?;

        let released = work::Entity::update_many()
            .col_expr(work::Column::SalaryId, Expr::value(Value::Int(None)))
            .col_expr(work::Column::Check, Expr::value(false))
            .filter(work::Column::SalaryId.eq(salary_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let result = salary::Entity::delete_by_id(salary_id)
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if result.rows_affected == 0 {
            return Err(ServiceError::InvalidOperation(format!(
                "Salary statement {} does not exist",
                salary_id
            )));
        }

        txn.commit().await.map_err(ServiceError::db_error)?;
        info!(
            salary_id,
            released = released.rows_affected,
            "deleted pay statement"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use tokio::sync::mpsc;

    async fn service_with_events() -> (PayrollService, mpsc::Receiver<Event>) {
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..DbConfig::default()
        };
        let db = establish_connection_with_config(&config).await.unwrap();
        run_migrations(&db).await.unwrap();
        let (tx, rx) = mpsc::channel(16);
        let service = PayrollService::new(Arc::new(db), Arc::new(EventSender::new(tx)));
        (service, rx)
    }

    async fn seed_employee(service: &PayrollService, id: i32, name: &str) {
        employee::ActiveModel {
            id: Set(id),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(service.connection())
        .await
        .unwrap();
    }

    async fn seed_work(
        service: &PayrollService,
        employee_id: Option<i32>,
        date: NaiveDate,
        unit: (f64, i32),
        hour: (f64, i32),
        checked: bool,
    ) -> i32 {
        work::ActiveModel {
            batch_process_id: Set(1),
            employee_id: Set(employee_id),
            work_date: Set(date),
            unit_pay: Set(unit.0),
            complete_unit: Set(unit.1),
            hour_pay: Set(hour.0),
            complete_hour: Set(hour.1),
            plan_unit: Set(unit.1),
            check: Set(checked),
            ..Default::default()
        }
        .insert(service.connection())
        .await
        .unwrap()
        .id
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january_input(employee_id: i32) -> CreateSalaryInput {
        CreateSalaryInput {
            employee_id,
            start_date: day(2024, 1, 1),
            end_date: day(2024, 1, 31),
            unit_salary: None,
            hour_salary: None,
            deduction: 30.0,
            bonus: 10.0,
            status: None,
            notice: None,
        }
    }

    async fn work_by_id(service: &PayrollService, id: i32) -> work::Model {
        work::Entity::find_by_id(id)
            .one(service.connection())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn creating_a_statement_claims_unchecked_works_in_range() {
        let (service, mut rx) = service_with_events().await;
        seed_employee(&service, 5, "li wei").await;
        // Piecework on Jan 10, hour work on Jan 20, each worth 100.
        let w1 = seed_work(&service, Some(5), day(2024, 1, 10), (2.0, 50), (0.0, 0), false).await;
        let w2 = seed_work(&service, Some(5), day(2024, 1, 20), (0.0, 0), (12.5, 8), false).await;
        // Out of range, other employee, already claimed elsewhere.
        let w3 = seed_work(&service, Some(5), day(2024, 2, 5), (2.0, 10), (0.0, 0), false).await;
        let w4 = seed_work(&service, Some(9), day(2024, 1, 15), (2.0, 10), (0.0, 0), false).await;
        let w5 = seed_work(&service, Some(5), day(2024, 1, 12), (2.0, 10), (0.0, 0), true).await;

        let detail = service.create_statement(january_input(5)).await.unwrap();

        assert_eq!(detail.salary.employee_name.as_deref(), Some("li wei"));
        assert_eq!(detail.lines.len(), 2);
        assert_eq!(detail.lines[0].work_id, w1);
        assert_eq!(detail.lines[1].work_id, w2);
        assert!((detail.subtotal - 200.0).abs() < 1e-9);
        assert!((detail.total - 180.0).abs() < 1e-9);

        match rx.recv().await.unwrap() {
            Event::SalaryComputed {
                salary_id,
                employee_id,
                total,
            } => {
                assert_eq!(salary_id, detail.salary.id);
                assert_eq!(employee_id, 5);
                assert!((total - 180.0).abs() < 1e-9);
            }
            other => panic!("unexpected event {:?}", other),
        }

        let claimed = work_by_id(&service, w1).await;
        assert!(claimed.check);
        assert_eq!(claimed.salary_id, Some(detail.salary.id));
        assert_eq!(work_by_id(&service, w3).await.salary_id, None);
        assert_eq!(work_by_id(&service, w4).await.salary_id, None);
        let manually_checked = work_by_id(&service, w5).await;
        assert!(manually_checked.check);
        assert_eq!(manually_checked.salary_id, None);
    }

    #[tokio::test]
    async fn create_rejects_unknown_employee_and_inverted_period() {
        let (service, _rx) = service_with_events().await;
        seed_employee(&service, 5, "li wei").await;

        let err = service.create_statement(january_input(99)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let mut inverted = january_input(5);
        inverted.start_date = day(2024, 1, 31);
        inverted.end_date = day(2024, 1, 1);
        let err = service.create_statement(inverted).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn statement_detail_recomputes_the_same_totals() {
        let (service, _rx) = service_with_events().await;
        seed_employee(&service, 5, "li wei").await;
        seed_work(&service, Some(5), day(2024, 1, 10), (2.0, 50), (0.0, 0), false).await;

        let created = service.create_statement(january_input(5)).await.unwrap();
        let reloaded = service.statement(created.salary.id).await.unwrap();

        assert_eq!(reloaded.lines.len(), created.lines.len());
        assert!((reloaded.subtotal - created.subtotal).abs() < 1e-9);
        assert!((reloaded.total - created.total).abs() < 1e-9);

        let err = service.statement(9999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn updating_deduction_and_bonus_changes_the_total() {
        let (service, _rx) = service_with_events().await;
        seed_employee(&service, 5, "li wei").await;
        seed_work(&service, Some(5), day(2024, 1, 10), (2.0, 50), (0.0, 0), false).await;

        let created = service.create_statement(january_input(5)).await.unwrap();
        assert!((created.total - 80.0).abs() < 1e-9);

        service
            .update_statement(
                created.salary.id,
                UpdateSalaryInput {
                    deduction: Some(0.0),
                    bonus: Some(20.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let reloaded = service.statement(created.salary.id).await.unwrap();
        assert!((reloaded.total - 120.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn list_filters_by_employee_status_and_period() {
        let (service, _rx) = service_with_events().await;
        seed_employee(&service, 5, "li wei").await;
        seed_employee(&service, 6, "wang fang").await;

        let first = service.create_statement(january_input(5)).await.unwrap();
        let mut february = january_input(6);
        february.start_date = day(2024, 2, 1);
        february.end_date = day(2024, 2, 29);
        service.create_statement(february).await.unwrap();

        service
            .update_statement(
                first.salary.id,
                UpdateSalaryInput {
                    status: Some(PAID.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let (all, total) = service
            .list_statements(&SalaryListFilter::default(), 1, 10)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(total, 2);

        let filter = SalaryListFilter {
            employee_id: Some(5),
            ..Default::default()
        };
        let (rows, _) = service.list_statements(&filter, 1, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, 5);

        let filter = SalaryListFilter {
            status: Some(PAID.to_string()),
            ..Default::default()
        };
        let (rows, _) = service.list_statements(&filter, 1, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, first.salary.id);

        let filter = SalaryListFilter {
            period_after: Some(day(2024, 2, 1)),
            period_before: Some(day(2024, 2, 29)),
            ..Default::default()
        };
        let (rows, _) = service.list_statements(&filter, 1, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, 6);
    }

    #[tokio::test]
    async fn confirming_payment_stamps_the_employee_last_pay_check() {
        let (service, mut rx) = service_with_events().await;
        seed_employee(&service, 5, "li wei").await;
        seed_work(&service, Some(5), day(2024, 1, 10), (2.0, 50), (0.0, 0), false).await;

        let created = service.create_statement(january_input(5)).await.unwrap();
        let _ = rx.recv().await; // SalaryComputed

        let paid = service
            .confirm_payment(created.salary.id, ConfirmPaymentInput::default())
            .await
            .unwrap();
        assert_eq!(paid.status.as_deref(), Some("paid"));
        assert!(paid.check_date.is_some());

        let worker = employee::Entity::find_by_id(5)
            .one(service.connection())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(worker.last_pay_check, paid.check_date);

        match rx.recv().await.unwrap() {
            Event::SalaryPaid(salary_id) => assert_eq!(salary_id, created.salary.id),
            other => panic!("unexpected event {:?}", other),
        }

        let err = service
            .confirm_payment(9999, ConfirmPaymentInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_a_statement_releases_its_works() {
        let (service, _rx) = service_with_events().await;
        seed_employee(&service, 5, "li wei").await;
        let w1 = seed_work(&service, Some(5), day(2024, 1, 10), (2.0, 50), (0.0, 0), false).await;

        let created = service.create_statement(january_input(5)).await.unwrap();
        assert_eq!(work_by_id(&service, w1).await.salary_id, Some(created.salary.id));

        service.delete_statement(created.salary.id).await.unwrap();

        let released = work_by_id(&service, w1).await;
        assert!(!released.check);
        assert_eq!(released.salary_id, None);

        let err = service.statement(created.salary.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = service.delete_statement(created.salary.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));
    }
}
