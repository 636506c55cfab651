use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase order against one vendor. `display_form_id` is the
/// human-readable `YYYYMMDD-VVV-NNNN` id allocated per vendor per year;
/// a unique index backs it up against concurrent allocation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "instock_form")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub form_id: i32,
    pub display_form_id: String,
    pub vendor_id: i32,
    pub create_time: DateTime,
    pub form_status: String,
    pub amount: f64,
    pub note: Option<String>,
    pub paid: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id"
    )]
    Vendor,
    #[sea_orm(has_many = "super::instock_item::Entity")]
    InstockItem,
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl Related<super::instock_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InstockItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
