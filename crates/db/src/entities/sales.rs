//! `SeaORM` Entity for sales table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub crop_id: Uuid,
    pub customer_id: Uuid,
    pub season_id: Option<Uuid>,
    pub sale_date: Date,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity_sold_kg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub selling_unit_price: Decimal,
    pub selling_pricing_unit: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub selling_factor: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_sale_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount_received: Decimal,
    pub payment_status: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub gross_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub tare_weight: Decimal,
    pub bag_count: i64,
    pub calculation_formula: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cogs_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub returned_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub returned_amount: Decimal,
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
        from = "Column::CustomerId",
        to = "super::contacts::Column::Id"
    )]
    Contacts,
    #[sea_orm(has_many = "super::sale_returns::Entity")]
    SaleReturns,
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

impl Related<super::sale_returns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleReturns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
