//! `SeaORM` Entity for transformations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transformations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub transform_date: Date,
    pub input_crop_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub input_qty: Decimal,
    pub output_crop_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub output_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub input_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub output_cost_per_kg: Decimal,
    pub output_batch_id: Uuid,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
