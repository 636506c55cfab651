use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One stage of a batch, instantiated from a `process` row at batch
/// creation. `unit_pay` is copied from the process so later pay-rate edits
/// do not rewrite history. Amounts stay unset until the stage runs.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batch_process")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub status: String,
    pub batch_id: i32,
    pub process_id: String,
    pub start_amount: Option<i32>,
    pub end_amount: Option<i32>,
    pub unit_pay: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batch::Entity",
        from = "Column::BatchId",
        to = "super::batch::Column::Id"
    )]
    Batch,
    #[sea_orm(
        belongs_to = "super::process::Entity",
        from = "Column::ProcessId",
        to = "super::process::Column::Id"
    )]
    Process,
    #[sea_orm(has_many = "super::work::Entity")]
    Work,
    #[sea_orm(has_many = "super::warehouse_record::Entity")]
    WarehouseRecord,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl Related<super::process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Process.def()
    }
}

impl Related<super::work::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Work.def()
    }
}

impl Related<super::warehouse_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WarehouseRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
