use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One vendor's purchasable variant of a component. `stock` is the live
/// on-hand count for this variant; issues and receipts adjust it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "specification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub component_id: String,
    pub vendor_id: i32,
    pub gross_price: f64,
    pub net_price: f64,
    pub use_net: bool,
    pub stock: i32,
    pub unit_amount: Option<i32>,
    pub notice: Option<String>,
    pub hide: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::component::Entity",
        from = "Column::ComponentId",
        to = "super::component::Column::Id"
    )]
    Component,
    #[sea_orm(
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id"
    )]
    Vendor,
    #[sea_orm(has_many = "super::instock_item::Entity")]
    InstockItem,
    #[sea_orm(has_many = "super::work_specification::Entity")]
    WorkSpecification,
    #[sea_orm(has_many = "super::warehouse_record::Entity")]
    WarehouseRecord,
}

impl Related<super::component::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Component.def()
    }
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
