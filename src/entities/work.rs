use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One employee's work on one stage for one day. Pay rates and the
/// product/process names are denormalized snapshots taken at entry time.
/// `check` marks the entry as claimed by a salary statement.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub batch_process_id: i32,
    pub employee_id: Option<i32>,
    pub employee_name: Option<String>,
    pub work_date: Date,
    pub unit_pay: f64,
    pub complete_unit: i32,
    pub hour_pay: f64,
    pub complete_hour: i32,
    pub plan_unit: i32,
    pub check: bool,
    pub salary_id: Option<i32>,
    pub product_name: Option<String>,
    pub process_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batch_process::Entity",
        from = "Column::BatchProcessId",
        to = "super::batch_process::Column::Id"
    )]
    BatchProcess,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
    #[sea_orm(
        belongs_to = "super::salary::Entity",
        from = "Column::SalaryId",
        to = "super::salary::Column::Id"
    )]
    Salary,
    #[sea_orm(has_many = "super::work_specification::Entity")]
    WorkSpecification,
}

impl Related<super::batch_process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchProcess.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::salary::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Salary.def()
    }
}

impl Related<super::work_specification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkSpecification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
