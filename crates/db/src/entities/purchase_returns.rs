//! `SeaORM` Entity for purchase_returns table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_returns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub return_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub returned_qty: Decimal,
    pub reason: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub returned_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub gross_returned: Decimal,
    pub bags_returned: i64,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchases::Entity",
        from = "Column::PurchaseId",
        to = "super::purchases::Column::Id"
    )]
    Purchases,
}

impl Related<super::purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
