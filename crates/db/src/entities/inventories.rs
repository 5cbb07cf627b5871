//! `SeaORM` Entity for inventories table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "inventories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub crop_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub current_stock_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub net_stock_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub gross_stock_kg: Decimal,
    pub bag_count: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub average_cost_per_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub low_stock_threshold_kg: Decimal,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::crops::Entity",
        from = "Column::CropId",
        to = "super::crops::Column::Id"
    )]
    Crops,
}

impl Related<super::crops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Crops.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
