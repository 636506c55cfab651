use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A production run of one product. The id is not auto-generated: it is
/// allocated from the start month window (see `services::identifiers`).
/// `actual_amount` is meaningful once status reaches `finished`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub status: String,
    pub product_id: String,
    pub plan_amount: i32,
    pub actual_amount: Option<i32>,
    pub create: DateTime,
    pub start: DateTime,
    pub end: Option<DateTime>,
    pub ship: Option<DateTime>,
    pub notice: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(has_many = "super::batch_process::Entity")]
    BatchProcess,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::batch_process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BatchProcess.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
