//! `SeaORM` Entity for ledger_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_date: Date,
    pub account_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub credit: Decimal,
    pub description: String,
    pub source_kind: String,
    pub source_id: Uuid,
    pub reversal_of: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::financial_accounts::Entity",
        from = "Column::AccountId",
        to = "super::financial_accounts::Column::Id"
    )]
    FinancialAccounts,
}

impl Related<super::financial_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FinancialAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
