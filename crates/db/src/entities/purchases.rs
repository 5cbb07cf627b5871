//! `SeaORM` Entity for purchases table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub crop_id: Uuid,
    pub supplier_id: Uuid,
    pub season_id: Option<Uuid>,
    pub purchase_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub net_quantity_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub gross_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub tare_weight: Decimal,
    pub bag_count: i64,
    pub pricing_unit: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub conversion_factor: Decimal,
    pub calculation_formula: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount_paid: Decimal,
    pub payment_status: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub returned_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub returned_cost: Decimal,
    pub batch_id: Uuid,
    pub notes: Option<String>,
    pub created_by: Uuid,
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
    #[sea_orm(
        belongs_to = "super::contacts::Entity",
        from = "Column::SupplierId",
        to = "super::contacts::Column::Id"
    )]
    Contacts,
    #[sea_orm(has_many = "super::purchase_returns::Entity")]
    PurchaseReturns,
}

impl Related<super::crops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Crops.def()
    }
}

impl Related<super::contacts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contacts.def()
    }
}

impl Related<super::purchase_returns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseReturns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
