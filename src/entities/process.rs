use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered manufacturing stage definition for a product. Batches fan out
/// into one `batch_process` per process row, in `process_order` order.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "process")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub product_id: String,
    pub process_name: String,
    pub process_order: i32,
    pub unit_pay: f64,
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
