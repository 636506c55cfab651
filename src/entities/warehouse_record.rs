use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Standard (per-unit) material issue for a stage: `consumption` units of
/// one specification per unit of output. Prices are snapshots taken when
/// the record is written, like `work_specification`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "warehouse_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub batch_process_id: i32,
    pub component_id: String,
    pub specification_id: String,
    pub component_name: Option<String>,
    pub consumption: i32,
    pub specification_net_price: f64,
    pub specification_gross_price: f64,
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
        belongs_to = "super::component::Entity",
        from = "Column::ComponentId",
        to = "super::component::Column::Id"
    )]
    Component,
    #[sea_orm(
        belongs_to = "super::specification::Entity",
        from = "Column::SpecificationId",
        to = "super::specification::Column::Id"
    )]
    Specification,
}

impl Related<super::batch_process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchProcess.def()
    }
}

impl Related<super::component::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Component.def()
    }
}

impl Related<super::specification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Specification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
