use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pay statement over a date range. Work entries claimed by a statement
/// carry its id in `work.salary_id` and have `work.check` set.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "salary")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub employee_id: i32,
    pub employee_name: Option<String>,
    pub start_date: Date,
    pub end_date: Date,
    pub unit_salary: Option<f64>,
    pub hour_salary: Option<f64>,
    pub deduction: f64,
    pub bonus: f64,
    pub status: Option<String>,
    pub notice: Option<String>,
    pub check_date: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
    #[sea_orm(has_many = "super::work::Entity")]
    Work,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::work::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Work.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
