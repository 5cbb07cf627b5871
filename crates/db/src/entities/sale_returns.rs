//! `SeaORM` Entity for sale_returns table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_returns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sale_id: Uuid,
    pub return_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub returned_qty: Decimal,
    pub reason: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub refund_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cost_per_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub restocked_cost: Decimal,
    pub reverses_cogs: bool,
    pub batch_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales::Entity",
        from = "Column::SaleId",
        to = "super::sales::Column::Id"
    )]
    Sales,
}

impl Related<super::sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
