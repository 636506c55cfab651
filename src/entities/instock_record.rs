use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only receipt ledger for an instock item. `balance` is the
/// item's received total after this receipt was applied.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "instock_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub instock_item_id: i32,
    pub amount_in: i32,
    pub balance: i32,
    pub operator: Option<String>,
    pub record_time: DateTime,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::instock_item::Entity",
        from = "Column::InstockItemId",
        to = "super::instock_item::Column::InstockItemId"
    )]
    InstockItem,
}

impl Related<super::instock_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InstockItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
