//! `SeaORM` Entity for stock_consumptions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_consumptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub consumer_kind: String,
    pub consumer_id: Uuid,
    pub batch_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cost_per_kg: Decimal,
    pub consumed_on: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_batches::Entity",
        from = "Column::BatchId",
        to = "super::inventory_batches::Column::Id"
    )]
    InventoryBatches,
}

impl Related<super::inventory_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
