use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One ordered specification on a purchase form. `warehouse_quantity` is
/// the received-so-far total, advanced by receipt events.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "instock_item")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub instock_item_id: i32,
    pub form_id: i32,
    pub specification_id: String,
    pub order_quantity: i32,
    pub unit_cost: f64,
    pub warehouse_quantity: i32,
    pub last_time: Option<DateTime>,
    pub instock_date: Option<Date>,
    pub vendor_instock_date: Option<Date>,
    pub notice: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::instock_form::Entity",
        from = "Column::FormId",
        to = "super::instock_form::Column::FormId"
    )]
    InstockForm,
    #[sea_orm(
        belongs_to = "super::specification::Entity",
        from = "Column::SpecificationId",
        to = "super::specification::Column::Id"
    )]
    Specification,
    #[sea_orm(has_many = "super::instock_record::Entity")]
    InstockRecord,
}

impl Related<super::instock_form::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InstockForm.def()
    }
}

impl Related<super::specification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Specification.def()
    }
}

impl Related<super::instock_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InstockRecord.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
