//! Standard-vs-actual cost roll-up for a production batch.
//!
//! The computation is a pure function over a fully loaded batch subtree
//! (`batch -> batch_process -> work -> work_specification`, plus each
//! stage's `warehouse_record` baseline and `process` definition). All
//! prices come from the snapshot columns on the consumption rows, never
//! from the live catalog, so reports stay stable when prices change.

use crate::{
    db::DbPool,
    entities::{batch, batch_process, process, warehouse_record, work, work_specification},
    errors::ServiceError,
};
use metrics::{counter, histogram};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;
use utoipa::ToSchema;

/// One line of the cost report: a stage, or the trailing batch summary.
///
/// `standard` figures derive from the warehouse baseline and planned
/// quantities, `actual` figures from recorded work and consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CostReportRow {
    /// `"{process_order} - {process_name}"`, or `"batch {id} total"`.
    pub scope: String,
    pub start_amount: i32,
    pub end_amount: i32,
    pub fulfillment_ratio: f64,
    pub standard_component_cost: f64,
    pub actual_component_cost: f64,
    pub standard_labor_cost: f64,
    pub actual_labor_cost: f64,
    pub standard_unit_component_cost: f64,
    pub actual_unit_component_cost: f64,
    pub standard_unit_labor_cost: f64,
    pub actual_unit_labor_cost: f64,
}

/// Per work-entry cost breakdown, the most granular report section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkCostDetail {
    pub work_id: i32,
    pub employee_name: Option<String>,
    pub work_date: chrono::NaiveDate,
    pub standard_component_cost: f64,
    pub actual_component_cost: f64,
    pub standard_labor_cost: f64,
    pub actual_labor_cost: f64,
    /// Divides by `complete_unit`, falling back to `plan_unit` when no
    /// units were completed.
    pub actual_unit_labor_cost: f64,
}

/// Full cost report for one batch: ordered stage rows plus the batch
/// summary row, per-work detail, and component consumption tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchCostReport {
    pub batch_id: i32,
    pub rows: Vec<CostReportRow>,
    pub work_details: Vec<WorkCostDetail>,
    /// Component name -> per-unit standard consumption (warehouse baseline).
    pub standard_unit_consumption: BTreeMap<String, i32>,
    /// Component name -> total actual consumption over all work entries.
    pub actual_consumption: BTreeMap<String, i32>,
}

/// A work entry with its consumption lines.
#[derive(Debug, Clone)]
pub struct WorkWithLines {
    pub work: work::Model,
    pub lines: Vec<work_specification::Model>,
}

/// One stage of the loaded subtree.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub stage: batch_process::Model,
    pub process: Option<process::Model>,
    pub works: Vec<WorkWithLines>,
    pub issues: Vec<warehouse_record::Model>,
}

/// The fully loaded input graph for one report run.
#[derive(Debug, Clone)]
pub struct BatchCostGraph {
    pub batch: batch::Model,
    pub stages: Vec<StageInput>,
}

/// Computes the cost report for a loaded batch graph.
///
/// Pure and idempotent; never emits NaN or infinity. Zero denominators
/// and missing relations surface as typed errors instead.
pub fn compute_cost_report(graph: &BatchCostGraph) -> Result<BatchCostReport, ServiceError> {
    let batch = &graph.batch;

    let mut standard_unit_consumption: BTreeMap<String, i32> = BTreeMap::new();
    let mut actual_consumption: BTreeMap<String, i32> = BTreeMap::new();
    let mut work_details = Vec::new();

    // Stage rows carry their process_order so the report can be emitted
    // in process order regardless of load order.
    let mut stage_rows: Vec<(i32, CostReportRow)> = Vec::with_capacity(graph.stages.len());

    let mut batch_standard_component = 0.0;
    let mut batch_actual_component = 0.0;
    let mut batch_standard_labor = 0.0;
    let mut batch_actual_labor = 0.0;

    for input in &graph.stages {
        let stage = &input.stage;
        let process = input.process.as_ref().ok_or_else(|| {
            ServiceError::MissingDependentData(format!(
                "batch_process {} has no process definition loaded",
                stage.id
            ))
        })?;
        let scope = format!("{} - {}", process.process_order, process.process_name);

        let start_amount = nonzero_amount(stage.start_amount, "start_amount", &scope)?;
        let end_amount = nonzero_amount(stage.end_amount, "end_amount", &scope)?;

        // The standard per-unit component cost comes from the warehouse
        // baseline, not from work plans: work rows only cover what was
        // actually attempted.
        let mut standard_unit_component = 0.0;
        for record in &input.issues {
            let name = record
                .component_name
                .clone()
                .unwrap_or_else(|| record.component_id.clone());
            *standard_unit_consumption.entry(name).or_insert(0) += record.consumption;
            standard_unit_component += record.specification_gross_price * record.consumption as f64;
        }

        let mut actual_component = 0.0;
        let mut actual_labor = 0.0;

        for entry in &input.works {
            let work = &entry.work;
            let mut work_actual_component = 0.0;
            let mut work_standard_component = 0.0;
            for line in &entry.lines {
                work_actual_component +=
                    line.specification_gross_price * line.actual_amount as f64;
                work_standard_component +=
                    line.specification_gross_price * line.plan_amount as f64;
                let name = line
                    .component_name
                    .clone()
                    .unwrap_or_else(|| line.specification_id.clone());
                *actual_consumption.entry(name).or_insert(0) += line.actual_amount;
            }

            let work_actual_labor = work.complete_hour as f64 * work.hour_pay
                + work.complete_unit as f64 * work.unit_pay;
            let work_standard_labor = stage.unit_pay * work.plan_unit as f64;

            let unit_denominator = if work.complete_unit != 0 {
                work.complete_unit
            } else if work.plan_unit != 0 {
                work.plan_unit
            } else {
                return Err(ServiceError::ZeroQuantity(format!(
                    "work {} in stage {} has zero complete_unit and zero plan_unit",
                    work.id, scope
                )));
            };

            work_details.push(WorkCostDetail {
                work_id: work.id,
                employee_name: work.employee_name.clone(),
                work_date: work.work_date,
                standard_component_cost: work_standard_component,
                actual_component_cost: work_actual_component,
                standard_labor_cost: work_standard_labor,
                actual_labor_cost: work_actual_labor,
                actual_unit_labor_cost: work_actual_labor / unit_denominator as f64,
            });

            actual_component += work_actual_component;
            actual_labor += work_actual_labor;
        }

        let standard_component = standard_unit_component * start_amount as f64;
        let standard_labor = start_amount as f64 * stage.unit_pay;

        stage_rows.push((
            process.process_order,
            CostReportRow {
                scope,
                start_amount,
                end_amount,
                fulfillment_ratio: end_amount as f64 / start_amount as f64,
                standard_component_cost: standard_component,
                actual_component_cost: actual_component,
                standard_labor_cost: standard_labor,
                actual_labor_cost: actual_labor,
                standard_unit_component_cost: standard_unit_component,
                actual_unit_component_cost: actual_component / end_amount as f64,
                standard_unit_labor_cost: stage.unit_pay,
                actual_unit_labor_cost: actual_labor / end_amount as f64,
            },
        ));

        batch_standard_component += standard_component;
        batch_actual_component += actual_component;
        batch_standard_labor += standard_labor;
        batch_actual_labor += actual_labor;
    }

    let batch_scope = format!("batch {} total", batch.id);
    let plan_amount = nonzero_amount(Some(batch.plan_amount), "plan_amount", &batch_scope)?;
    let actual_amount = nonzero_amount(batch.actual_amount, "actual_amount", &batch_scope)?;

    stage_rows.sort_by_key(|(order, _)| *order);
    let mut rows: Vec<CostReportRow> = stage_rows.into_iter().map(|(_, row)| row).collect();

    rows.push(CostReportRow {
        scope: batch_scope,
        start_amount: plan_amount,
        end_amount: actual_amount,
        fulfillment_ratio: actual_amount as f64 / plan_amount as f64,
        standard_component_cost: batch_standard_component,
        actual_component_cost: batch_actual_component,
        standard_labor_cost: batch_standard_labor,
        actual_labor_cost: batch_actual_labor,
        standard_unit_component_cost: batch_standard_component / plan_amount as f64,
        actual_unit_component_cost: batch_actual_component / actual_amount as f64,
        standard_unit_labor_cost: batch_standard_labor / plan_amount as f64,
        actual_unit_labor_cost: batch_actual_labor / actual_amount as f64,
    });

    Ok(BatchCostReport {
        batch_id: batch.id,
        rows,
        work_details,
        standard_unit_consumption,
        actual_consumption,
    })
}

fn nonzero_amount(value: Option<i32>, field: &str, scope: &str) -> Result<i32, ServiceError> {
    match value {
        Some(v) if v != 0 => Ok(v),
        _ => Err(ServiceError::ZeroQuantity(format!(
            "{} of {} is zero or unset",
            field, scope
        ))),
    }
}

/// Service producing cost reports from persisted batches.
#[derive(Clone)]
pub struct CostReportService {
    db_pool: Arc<DbPool>,
}

impl CostReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Loads the batch subtree and computes its cost report.
    #[instrument(skip(self))]
    pub async fn batch_cost_report(&self, batch_id: i32) -> Result<BatchCostReport, ServiceError> {
        let graph = self.load_batch_graph(batch_id).await?;

        let started = Instant::now();
        let report = compute_cost_report(&graph)?;
        histogram!("workshop_api.cost_report.duration", started.elapsed());
        counter!("workshop_api.cost_report.computed", 1);

        Ok(report)
    }

    /// Eagerly loads a batch with its stages, their process definitions,
    /// work entries with consumption lines, and warehouse baselines.
    pub(crate) async fn load_batch_graph(
        &self,
        batch_id: i32,
    ) -> Result<BatchCostGraph, ServiceError> {
        let db = self.db_pool.as_ref();

        let batch = batch::Entity::find_by_id(batch_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", batch_id)))?;

        let stages = batch_process::Entity::find()
            .filter(batch_process::Column::BatchId.eq(batch_id))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut inputs = Vec::with_capacity(stages.len());
        for stage in stages {
            let process = process::Entity::find_by_id(stage.process_id.clone())
                .one(db)
                .await
                .map_err(ServiceError::db_error)?;

            let work_rows = work::Entity::find()
                .filter(work::Column::BatchProcessId.eq(stage.id))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?;

            let mut works = Vec::with_capacity(work_rows.len());
            for work in work_rows {
                let lines = work_specification::Entity::find()
                    .filter(work_specification::Column::WorkId.eq(work.id))
                    .all(db)
                    .await
                    .map_err(ServiceError::db_error)?;
                works.push(WorkWithLines { work, lines });
            }

            let issues = warehouse_record::Entity::find()
                .filter(warehouse_record::Column::BatchProcessId.eq(stage.id))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?;

            inputs.push(StageInput {
                stage,
                process,
                works,
                issues,
            });
        }

        Ok(BatchCostGraph {
            batch,
            stages: inputs,
        })
    }
}
