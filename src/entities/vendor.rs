use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendor")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: Option<String>,
    pub company: Option<String>,
    pub payment_period: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub fax: Option<String>,
    pub notice: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::specification::Entity")]
    Specification,
    #[sea_orm(has_many = "super::instock_form::Entity")]
    InstockForm,
}

impl Related<super::specification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Specification.def()
    }
}

impl Related<super::instock_form::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InstockForm.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
