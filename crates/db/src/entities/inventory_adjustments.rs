//! `SeaORM` Entity for inventory_adjustments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_adjustments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub crop_id: Uuid,
    pub adjustment_date: Date,
    pub adjustment_type: String,
    /// Signed: negative for shortage and spoilage.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cost_per_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_value: Decimal,
    pub batch_id: Option<Uuid>,
    pub season_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
