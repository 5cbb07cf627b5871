//! `SeaORM` Entity for crops table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "crops")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    /// JSON array of unit labels.
    pub pricing_units: Json,
    /// JSON object of unit label to kg factor, factors as decimal strings.
    pub conversion_factors: Json,
    pub is_active: bool,
    pub is_complex_unit: bool,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub default_tare_per_bag: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub standard_unit_weight: Option<Decimal>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::inventories::Entity")]
    Inventories,
    #[sea_orm(has_many = "super::inventory_batches::Entity")]
    InventoryBatches,
}

impl Related<super::inventories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventories.def()
    }
}

impl Related<super::inventory_batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryBatches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
