//! `SeaORM` Entity for inventory_batches table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_batches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub crop_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub original_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub remaining_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cost_per_kg: Decimal,
    pub purchase_date: Date,
    pub purchase_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub expiry_date: Option<Date>,
    pub origin: String,
    pub origin_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::crops::Entity",
        from = "Column::CropId",
        to = "super::crops::Column::Id"
    )]
    Crops,
    #[sea_orm(has_many = "super::stock_consumptions::Entity")]
    StockConsumptions,
}

impl Related<super::crops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Crops.def()
    }
}

impl Related<super::stock_consumptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockConsumptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
