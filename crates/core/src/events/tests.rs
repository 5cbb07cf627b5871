//! Tests for the event composers.

use granary_shared::types::round_internal;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::audit::AuditAction;
use crate::calculation::FormulaKey;
use crate::error::KernelError;
use crate::inventory::{BatchOrigin, InventoryEngine};
use crate::ledger::{EventKind, LedgerEntry, PostingLeg, SourceKind};
use crate::masterdata::{CropRequest, CropService};
use crate::settings::{AccountRole, SettingsResolver, SettingsService, Tunable};
use crate::testing::{Fixture, day};

fn legs_of(fx: &Fixture, event: EventKind, source_id: uuid::Uuid) -> Vec<LedgerEntry> {
    fx.book()
        .ledger_entries()
        .filter(|leg| leg.in_group(SourceKind::of(event), source_id))
        .cloned()
        .collect()
}

fn role(fx: &Fixture, role: AccountRole) -> granary_shared::types::AccountId {
    SettingsResolver::resolve_uncached(fx.book(), role).unwrap()
}

fn payment_request(
    fx: &Fixture,
    purchase: &Purchase,
    amount: Decimal,
) -> PaymentRequest {
    PaymentRequest {
        payment_date: day(1, 20),
        amount,
        contact_id: None,
        method: "BANK".into(),
        debit_account_id: role(fx, AccountRole::Payable),
        credit_account_id: role(fx, AccountRole::Cash),
        transaction_type: TransactionType::Purchase,
        transaction_id: Some(purchase.id.into_inner()),
        notes: None,
    }
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

#[test]
fn test_purchase_posts_inventory_and_payable() {
    let mut fx = Fixture::new();
    let purchase = fx.buy(day(1, 5), dec!(1000), dec!(10), Decimal::ZERO);

    assert_eq!(purchase.total_cost, dec!(10000));
    assert_eq!(purchase.payment_status, PaymentStatus::Pending);
    let legs = legs_of(&fx, EventKind::Purchase, purchase.id.into_inner());
    assert_eq!(legs.len(), 2);
    assert_eq!(fx.balance(AccountRole::Inventory), dec!(10000));
    assert_eq!(fx.balance(AccountRole::Payable), dec!(10000));

    let batch = fx.book().batch(purchase.batch_id).unwrap();
    assert_eq!(batch.origin, BatchOrigin::Purchase);
    assert_eq!(batch.remaining_qty, dec!(1000));
    assert_eq!(batch.cost_per_kg, dec!(10));
    fx.assert_consistent();
}

#[test]
fn test_purchase_inline_payment_settles() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(10000));
    let purchase = fx.buy(day(1, 5), dec!(1000), dec!(10), dec!(4000));

    assert_eq!(purchase.amount_paid, dec!(4000));
    assert_eq!(purchase.payment_status, PaymentStatus::Partial);
    assert_eq!(fx.balance(AccountRole::Cash), dec!(6000));
    assert_eq!(fx.balance(AccountRole::Payable), dec!(6000));

    let payments: Vec<&Payment> =
        PaymentService::linked(fx.book(), TransactionType::Purchase, purchase.id.into_inner())
            .collect();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].origin, PaymentOrigin::Inline);
    assert_eq!(payments[0].method, "CASH");
}

#[test]
fn test_purchase_overpayment_is_rejected() {
    let mut fx = Fixture::new();
    let req = fx.purchase_request(day(1, 5), dec!(100), dec!(10), dec!(1001));
    let rows = fx.book().row_count();

    let err = fx.run(|uow| PurchaseService::record(uow, req)).unwrap_err();

    assert!(matches!(err, KernelError::Validation { ref field, .. } if field == "amount_paid"));
    assert_eq!(fx.book().row_count(), rows);
}

#[test]
fn test_government_qantar_purchase() {
    let mut fx = Fixture::new();
    let mut req = fx.purchase_request(day(1, 5), dec!(2400), dec!(8000), Decimal::ZERO);
    req.quantity = QuantityInput {
        formula: FormulaKey::QantarGovernment,
        gross_weight_kg: dec!(2400),
        bag_count: 10,
        tare_per_bag_kg: Some(dec!(2.5)),
        unit_price: dec!(8000),
        pricing_unit: None,
    };

    let purchase = fx.run(|uow| PurchaseService::record(uow, req)).unwrap();

    assert_eq!(purchase.net_quantity_kg, dec!(2375));
    assert_eq!(purchase.tare_weight, dec!(25));
    assert_eq!(purchase.total_cost, dec!(120634.9206));
    assert_eq!(purchase.pricing_unit, "qantar_government");
    let batch = fx.book().batch(purchase.batch_id).unwrap();
    assert_eq!(batch.cost_per_kg, dec!(50.7937));
    let inventory = fx.book().inventory(fx.crop).unwrap();
    assert_eq!(inventory.gross_stock_kg, dec!(2400));
    assert_eq!(inventory.bag_count, 10);
    assert_eq!(inventory.net_stock_kg, dec!(2375));
}

#[test]
fn test_purchase_update_keeps_standalone_payment() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(10000));
    let purchase = fx.buy(day(1, 5), dec!(100), dec!(10), dec!(200));
    let req = payment_request(&fx, &purchase, dec!(300));
    fx.run(|uow| PaymentService::record(uow, req)).unwrap();

    let mut update = fx.purchase_request(day(1, 6), dec!(150), dec!(10), dec!(100));
    update.notes = Some("re-weighed".into());
    let updated = fx
        .run(|uow| PurchaseService::update(uow, purchase.id, update))
        .unwrap();

    assert_eq!(updated.id, purchase.id);
    assert_eq!(updated.created_at, purchase.created_at);
    assert_eq!(updated.total_cost, dec!(1500));
    assert_eq!(updated.amount_paid, dec!(400));
    assert_eq!(updated.payment_status, PaymentStatus::Partial);
    assert_eq!(fx.book().inventory(fx.crop).unwrap().net_stock_kg, dec!(150));
    assert_eq!(fx.balance(AccountRole::Payable), dec!(1100));
    assert_eq!(fx.balance(AccountRole::Cash), dec!(9600));
    assert!(fx.book().audit_logs().any(|log| {
        log.action == AuditAction::Update && log.entity_id == purchase.id.into_inner()
    }));
    fx.assert_consistent();
}

#[test]
fn test_purchase_delete_restores_balances() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(5000));
    let purchase = fx.buy(day(1, 5), dec!(100), dec!(10), dec!(1000));

    fx.run(|uow| PurchaseService::delete(uow, purchase.id)).unwrap();

    assert!(fx.book().purchase(purchase.id).is_err());
    assert!(fx.book().batch(purchase.batch_id).is_err());
    assert_eq!(fx.balance(AccountRole::Cash), dec!(5000));
    assert_eq!(fx.balance(AccountRole::Inventory), Decimal::ZERO);
    assert_eq!(fx.balance(AccountRole::Payable), Decimal::ZERO);
    assert_eq!(fx.book().payments().count(), 0);
    let inventory = fx.book().inventory(fx.crop).unwrap();
    assert_eq!(inventory.net_stock_kg, Decimal::ZERO);
    assert_eq!(inventory.gross_stock_kg, Decimal::ZERO);
    fx.assert_consistent();
}

#[test]
fn test_purchase_delete_refused_with_standalone_payment() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(5000));
    let purchase = fx.buy(day(1, 5), dec!(100), dec!(10), Decimal::ZERO);
    let req = payment_request(&fx, &purchase, dec!(300));
    fx.run(|uow| PaymentService::record(uow, req)).unwrap();

    let err = fx
        .run(|uow| PurchaseService::delete(uow, purchase.id))
        .unwrap_err();

    assert!(matches!(err, KernelError::DependencyConflict { .. }));
    assert!(fx.book().purchase(purchase.id).is_ok());
}

#[test]
fn test_purchase_delete_after_consumption_needs_cascade() {
    let mut fx = Fixture::new();
    let purchase = fx.buy(day(1, 5), dec!(100), dec!(10), Decimal::ZERO);
    fx.sell(day(1, 6), dec!(10), dec!(15), Decimal::ZERO);

    let err = fx
        .run(|uow| PurchaseService::delete(uow, purchase.id))
        .unwrap_err();

    assert!(matches!(err, KernelError::CascadeRequired { .. }));
    fx.assert_consistent();
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

#[test]
fn test_sale_consumes_fifo_across_batches() {
    let mut fx = Fixture::new();
    let older = fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    let newer = fx.buy(day(1, 2), dec!(10), dec!(20), Decimal::ZERO);

    let sale = fx.sell(day(1, 3), dec!(15), dec!(30), Decimal::ZERO);

    assert_eq!(sale.total_sale_amount, dec!(450));
    assert_eq!(sale.cogs_total, dec!(200));
    assert_eq!(fx.balance(AccountRole::Cogs), dec!(200));
    assert_eq!(fx.balance(AccountRole::SalesRevenue), dec!(450));
    let first = fx.book().batch(older.batch_id).unwrap();
    assert!(!first.is_active);
    assert_eq!(first.remaining_qty, Decimal::ZERO);
    let second = fx.book().batch(newer.batch_id).unwrap();
    assert_eq!(second.remaining_qty, dec!(5));
    let inventory = fx.book().inventory(fx.crop).unwrap();
    assert_eq!(inventory.net_stock_kg, dec!(5));
    assert_eq!(inventory.average_cost_per_kg, dec!(20));
    fx.assert_consistent();
}

#[test]
fn test_sale_beyond_stock_rolls_back() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    let req = fx.sale_request(day(1, 2), dec!(11), dec!(30), dec!(100));
    let rows = fx.book().row_count();

    let err = fx.run(|uow| SaleService::record(uow, req)).unwrap_err();

    assert!(matches!(err, KernelError::InsufficientStock { .. }));
    assert_eq!(fx.book().row_count(), rows);
    assert_eq!(fx.balance(AccountRole::Receivable), Decimal::ZERO);
    fx.assert_consistent();
}

#[test]
fn test_sale_to_supplier_only_contact_is_rejected() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    let mut req = fx.sale_request(day(1, 2), dec!(5), dec!(30), Decimal::ZERO);
    req.customer_id = fx.supplier;

    let err = fx.run(|uow| SaleService::record(uow, req)).unwrap_err();

    assert!(matches!(err, KernelError::Validation { ref field, .. } if field == "customer_id"));
}

#[test]
fn test_sale_delete_restores_stock() {
    let mut fx = Fixture::new();
    let purchase = fx.buy(day(1, 1), dec!(100), dec!(10), Decimal::ZERO);
    let sale = fx.sell(day(1, 2), dec!(40), dec!(15), dec!(600));

    fx.run(|uow| SaleService::delete(uow, sale.id)).unwrap();

    let batch = fx.book().batch(purchase.batch_id).unwrap();
    assert_eq!(batch.remaining_qty, dec!(100));
    assert_eq!(fx.balance(AccountRole::Cash), Decimal::ZERO);
    assert_eq!(fx.balance(AccountRole::SalesRevenue), Decimal::ZERO);
    assert_eq!(fx.balance(AccountRole::Cogs), Decimal::ZERO);
    assert_eq!(fx.balance(AccountRole::Inventory), dec!(1000));
    assert_eq!(fx.book().consumptions().count(), 0);
    let inventory = fx.book().inventory(fx.crop).unwrap();
    assert_eq!(inventory.gross_stock_kg, dec!(100));
    fx.assert_consistent();
}

#[test]
fn test_sale_update_recosts() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    fx.buy(day(1, 2), dec!(10), dec!(20), Decimal::ZERO);
    let sale = fx.sell(day(1, 3), dec!(5), dec!(30), Decimal::ZERO);
    assert_eq!(sale.cogs_total, dec!(50));

    let req = fx.sale_request(day(1, 3), dec!(15), dec!(30), dec!(100));
    let updated = fx.run(|uow| SaleService::update(uow, sale.id, req)).unwrap();

    assert_eq!(updated.cogs_total, dec!(200));
    assert_eq!(updated.amount_received, dec!(100));
    assert_eq!(fx.balance(AccountRole::Cogs), dec!(200));
    assert_eq!(fx.balance(AccountRole::Receivable), dec!(350));
    fx.assert_consistent();
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

#[test]
fn test_standalone_payment_updates_parent_status() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(5000));
    let purchase = fx.buy(day(1, 5), dec!(100), dec!(10), Decimal::ZERO);

    let req = payment_request(&fx, &purchase, dec!(1000));
    let payment = fx.run(|uow| PaymentService::record(uow, req)).unwrap();
    assert_eq!(payment.contact_id, Some(fx.supplier));
    let parent = fx.book().purchase(purchase.id).unwrap();
    assert_eq!(parent.amount_paid, dec!(1000));
    assert_eq!(parent.payment_status, PaymentStatus::Paid);

    fx.run(|uow| PaymentService::delete(uow, payment.id)).unwrap();
    let parent = fx.book().purchase(purchase.id).unwrap();
    assert_eq!(parent.amount_paid, Decimal::ZERO);
    assert_eq!(parent.payment_status, PaymentStatus::Pending);
    assert_eq!(fx.balance(AccountRole::Cash), dec!(5000));
}

#[test]
fn test_payment_update_moves_amount() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(5000));
    let purchase = fx.buy(day(1, 5), dec!(100), dec!(10), Decimal::ZERO);
    let req = payment_request(&fx, &purchase, dec!(400));
    let payment = fx.run(|uow| PaymentService::record(uow, req)).unwrap();

    let req = payment_request(&fx, &purchase, dec!(250));
    let updated = fx
        .run(|uow| PaymentService::update(uow, payment.id, req))
        .unwrap();

    assert_eq!(updated.id, payment.id);
    assert_eq!(updated.origin, PaymentOrigin::Standalone);
    assert_eq!(fx.book().purchase(purchase.id).unwrap().amount_paid, dec!(250));
    assert_eq!(fx.balance(AccountRole::Cash), dec!(4750));
}

#[rstest]
#[case::zero(Decimal::ZERO)]
#[case::negative(dec!(-5))]
fn test_payment_requires_positive_amount(#[case] amount: Decimal) {
    let mut fx = Fixture::new();
    let purchase = fx.buy(day(1, 5), dec!(100), dec!(10), Decimal::ZERO);
    let req = payment_request(&fx, &purchase, amount);

    let err = fx.run(|uow| PaymentService::record(uow, req)).unwrap_err();

    assert!(matches!(err, KernelError::Validation { .. }));
}

#[test]
fn test_payment_same_accounts_rejected() {
    let mut fx = Fixture::new();
    let purchase = fx.buy(day(1, 5), dec!(100), dec!(10), Decimal::ZERO);
    let mut req = payment_request(&fx, &purchase, dec!(10));
    req.debit_account_id = req.credit_account_id;

    let err = fx.run(|uow| PaymentService::record(uow, req)).unwrap_err();

    assert!(matches!(err, KernelError::Validation { .. }));
}

#[test]
fn test_payment_for_missing_parent() {
    let mut fx = Fixture::new();
    let purchase = fx.buy(day(1, 5), dec!(100), dec!(10), Decimal::ZERO);
    let mut req = payment_request(&fx, &purchase, dec!(10));
    req.transaction_id = Some(uuid::Uuid::now_v7());

    let err = fx.run(|uow| PaymentService::record(uow, req)).unwrap_err();

    assert!(matches!(err, KernelError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

#[test]
fn test_sale_return_restocks_at_sale_cost() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    fx.buy(day(1, 2), dec!(10), dec!(20), Decimal::ZERO);
    let sale = fx.sell(day(1, 3), dec!(15), dec!(30), Decimal::ZERO);

    let sale_return = fx
        .run(|uow| {
            ReturnService::record_sale_return(
                uow,
                SaleReturnRequest {
                    sale_id: sale.id,
                    return_date: day(1, 4),
                    returned_qty: dec!(3),
                    reason: Some("wet".into()),
                },
            )
        })
        .unwrap();

    assert_eq!(sale_return.refund_amount, dec!(90));
    assert_eq!(sale_return.cost_per_kg, dec!(13.3333));
    assert_eq!(sale_return.restocked_cost, dec!(39.9999));
    assert!(sale_return.reverses_cogs);
    assert_eq!(fx.balance(AccountRole::SalesRevenue), dec!(360));
    assert_eq!(fx.balance(AccountRole::Receivable), dec!(360));
    assert_eq!(fx.balance(AccountRole::Cogs), dec!(160.0001));

    let batch = fx.book().batch(sale_return.batch_id).unwrap();
    assert_eq!(batch.origin, BatchOrigin::SaleReturn);
    assert_eq!(batch.remaining_qty, dec!(3));
    let sale = fx.book().sale(sale.id).unwrap();
    assert_eq!(sale.quantity_sold_kg, dec!(12));
    assert_eq!(sale.total_sale_amount, dec!(360));
    assert_eq!(sale.returned_qty, dec!(3));
    fx.assert_consistent();
}

#[test]
fn test_sale_return_without_cogs_reversal() {
    let mut fx = Fixture::new();
    fx.run(|uow| {
        SettingsService::set_setting(uow, Tunable::SaleReturnReversesCogs.key(), "false")
    })
    .unwrap();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    let sale = fx.sell(day(1, 3), dec!(10), dec!(30), Decimal::ZERO);

    let sale_return = fx
        .run(|uow| {
            ReturnService::record_sale_return(
                uow,
                SaleReturnRequest {
                    sale_id: sale.id,
                    return_date: day(1, 4),
                    returned_qty: dec!(2),
                    reason: None,
                },
            )
        })
        .unwrap();

    assert!(!sale_return.reverses_cogs);
    assert_eq!(fx.balance(AccountRole::Cogs), dec!(100));
    let legs = legs_of(&fx, EventKind::SaleReturn, sale_return.id.into_inner());
    assert_eq!(legs.len(), 2);
}

#[test]
fn test_sale_return_above_sold_quantity() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    let sale = fx.sell(day(1, 3), dec!(5), dec!(30), Decimal::ZERO);

    let err = fx
        .run(|uow| {
            ReturnService::record_sale_return(
                uow,
                SaleReturnRequest {
                    sale_id: sale.id,
                    return_date: day(1, 4),
                    returned_qty: dec!(6),
                    reason: None,
                },
            )
        })
        .unwrap_err();

    assert!(matches!(err, KernelError::Validation { .. }));
}

#[test]
fn test_sale_delete_refused_with_return() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    let sale = fx.sell(day(1, 3), dec!(5), dec!(30), Decimal::ZERO);
    let sale_return = fx
        .run(|uow| {
            ReturnService::record_sale_return(
                uow,
                SaleReturnRequest {
                    sale_id: sale.id,
                    return_date: day(1, 4),
                    returned_qty: dec!(1),
                    reason: None,
                },
            )
        })
        .unwrap();

    let err = fx.run(|uow| SaleService::delete(uow, sale.id)).unwrap_err();
    assert!(matches!(err, KernelError::DependencyConflict { .. }));

    fx.run(|uow| ReturnService::delete_sale_return(uow, sale_return.id))
        .unwrap();
    let restored = fx.book().sale(sale.id).unwrap();
    assert_eq!(restored.quantity_sold_kg, dec!(5));
    assert_eq!(restored.total_sale_amount, dec!(150));
    assert_eq!(restored.returned_qty, Decimal::ZERO);
    fx.run(|uow| SaleService::delete(uow, sale.id)).unwrap();
    fx.assert_consistent();
}

#[test]
fn test_purchase_return_reduces_payable() {
    let mut fx = Fixture::new();
    let mut req = fx.purchase_request(day(1, 1), dec!(1000), dec!(10), Decimal::ZERO);
    req.quantity.bag_count = 10;
    req.quantity.tare_per_bag_kg = Some(Decimal::ZERO);
    let purchase = fx.run(|uow| PurchaseService::record(uow, req)).unwrap();

    let purchase_return = fx
        .run(|uow| {
            ReturnService::record_purchase_return(
                uow,
                PurchaseReturnRequest {
                    purchase_id: purchase.id,
                    return_date: day(1, 2),
                    returned_qty: dec!(300),
                    reason: None,
                },
            )
        })
        .unwrap();

    assert_eq!(purchase_return.returned_cost, dec!(3000));
    assert_eq!(purchase_return.gross_returned, dec!(300));
    assert_eq!(purchase_return.bags_returned, 3);
    assert_eq!(fx.balance(AccountRole::Payable), dec!(7000));
    assert_eq!(fx.balance(AccountRole::Inventory), dec!(7000));
    let updated = fx.book().purchase(purchase.id).unwrap();
    assert_eq!(updated.net_quantity_kg, dec!(700));
    assert_eq!(updated.bag_count, 7);
    assert_eq!(fx.book().batch(purchase.batch_id).unwrap().remaining_qty, dec!(700));
    fx.assert_consistent();

    let err = fx
        .run(|uow| PurchaseService::delete(uow, purchase.id))
        .unwrap_err();
    assert!(matches!(err, KernelError::DependencyConflict { .. }));

    fx.run(|uow| ReturnService::delete_purchase_return(uow, purchase_return.id))
        .unwrap();
    let restored = fx.book().purchase(purchase.id).unwrap();
    assert_eq!(restored.net_quantity_kg, dec!(1000));
    assert_eq!(restored.bag_count, 10);
    assert_eq!(fx.balance(AccountRole::Payable), dec!(10000));
    fx.assert_consistent();
}

// ---------------------------------------------------------------------------
// Adjustments, capital and cash
// ---------------------------------------------------------------------------

#[rstest]
#[case::shortage(AdjustmentType::Shortage, dec!(-20), AccountRole::InventoryLoss)]
#[case::spoilage(AdjustmentType::Spoilage, dec!(-20), AccountRole::InventoryLoss)]
#[case::surplus(AdjustmentType::Surplus, dec!(20), AccountRole::InventoryGain)]
fn test_adjustment_values_at_average(
    #[case] kind: AdjustmentType,
    #[case] signed: Decimal,
    #[case] counter: AccountRole,
) {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(100), dec!(10), Decimal::ZERO);
    let crop = fx.crop;

    let adjustment = fx
        .run(|uow| {
            AdjustmentService::record(
                uow,
                AdjustmentRequest {
                    crop_id: crop,
                    adjustment_date: day(1, 2),
                    adjustment_type: kind,
                    quantity_kg: dec!(20),
                    season_id: None,
                    notes: None,
                },
            )
        })
        .unwrap();

    assert_eq!(adjustment.quantity, signed);
    assert_eq!(adjustment.total_value, dec!(200));
    assert_eq!(fx.balance(counter), dec!(200));
    assert_eq!(fx.balance(AccountRole::Inventory), dec!(1000) + signed * dec!(10));
    assert_eq!(
        fx.book().inventory(crop).unwrap().net_stock_kg,
        dec!(100) + signed
    );
    fx.assert_consistent();

    fx.run(|uow| AdjustmentService::delete(uow, adjustment.id))
        .unwrap();
    assert_eq!(fx.balance(AccountRole::Inventory), dec!(1000));
    let inventory = fx.book().inventory(crop).unwrap();
    assert_eq!(inventory.net_stock_kg, dec!(100));
    assert_eq!(inventory.gross_stock_kg, dec!(100));
    fx.assert_consistent();
}

#[test]
fn test_shortage_across_lots_keeps_ledger_and_stock_in_step() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    fx.buy(day(1, 2), dec!(10), dec!(20), Decimal::ZERO);
    let crop = fx.crop;

    let adjustment = fx
        .run(|uow| {
            AdjustmentService::record(
                uow,
                AdjustmentRequest {
                    crop_id: crop,
                    adjustment_date: day(1, 3),
                    adjustment_type: AdjustmentType::Shortage,
                    quantity_kg: dec!(10),
                    season_id: None,
                    notes: None,
                },
            )
        })
        .unwrap();

    assert_eq!(adjustment.cost_per_kg, dec!(15));
    assert_eq!(adjustment.total_value, dec!(150));
    assert_eq!(fx.balance(AccountRole::Inventory), dec!(150));
    assert_eq!(fx.balance(AccountRole::InventoryLoss), dec!(150));
    let inventory = fx.book().inventory(crop).unwrap();
    assert_eq!(inventory.net_stock_kg, dec!(10));
    assert_eq!(inventory.average_cost_per_kg, dec!(15));
    let remaining: Vec<Decimal> = InventoryEngine::fifo_batches(fx.book(), crop)
        .iter()
        .map(|b| b.remaining_qty)
        .collect();
    assert_eq!(remaining, vec![dec!(5), dec!(5)]);
    fx.assert_consistent();

    fx.run(|uow| AdjustmentService::delete(uow, adjustment.id))
        .unwrap();
    let remaining: Vec<Decimal> = InventoryEngine::fifo_batches(fx.book(), crop)
        .iter()
        .map(|b| b.remaining_qty)
        .collect();
    assert_eq!(remaining, vec![dec!(10), dec!(10)]);
    assert_eq!(fx.balance(AccountRole::Inventory), dec!(300));
    fx.assert_consistent();
}

#[test]
fn test_withdrawal_beyond_equity_is_refused() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(10000));

    let err = fx
        .run(|uow| {
            CapitalService::withdraw(
                uow,
                CapitalRequest {
                    allocation_date: day(1, 2),
                    amount: dec!(12000),
                    owner_name: "Owner".into(),
                    season_id: None,
                    notes: None,
                },
            )
        })
        .unwrap_err();

    assert!(matches!(
        err,
        KernelError::InsufficientEquity { requested, available }
            if requested == dec!(12000) && available == dec!(10000)
    ));
    assert_eq!(fx.balance(AccountRole::Cash), dec!(10000));
    assert_eq!(fx.balance(AccountRole::OwnerEquity), dec!(10000));
}

#[test]
fn test_withdrawal_and_delete() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(10000));
    let withdrawal = fx
        .run(|uow| {
            CapitalService::withdraw(
                uow,
                CapitalRequest {
                    allocation_date: day(1, 2),
                    amount: dec!(4000),
                    owner_name: "Owner".into(),
                    season_id: None,
                    notes: None,
                },
            )
        })
        .unwrap();
    assert_eq!(fx.balance(AccountRole::Cash), dec!(6000));

    fx.run(|uow| CapitalService::delete(uow, withdrawal.id)).unwrap();
    assert_eq!(fx.balance(AccountRole::Cash), dec!(10000));
    assert_eq!(fx.balance(AccountRole::OwnerEquity), dec!(10000));
}

#[test]
fn test_contribution_backing_a_withdrawal_cannot_be_deleted() {
    let mut fx = Fixture::new();
    let capital = |date, amount| CapitalRequest {
        allocation_date: date,
        amount,
        owner_name: "Owner".into(),
        season_id: None,
        notes: None,
    };
    let contribution = fx
        .run(|uow| CapitalService::contribute(uow, capital(day(1, 1), dec!(10000))))
        .unwrap();
    fx.run(|uow| CapitalService::withdraw(uow, capital(day(1, 2), dec!(8000))))
        .unwrap();

    let err = fx
        .run(|uow| CapitalService::delete(uow, contribution.id))
        .unwrap_err();

    assert!(matches!(
        err,
        KernelError::InsufficientEquity { requested, available }
            if requested == dec!(10000) && available == dec!(2000)
    ));
    assert_eq!(fx.balance(AccountRole::OwnerEquity), dec!(2000));
    assert_eq!(fx.balance(AccountRole::Cash), dec!(2000));
    assert!(fx.book().capital_allocation(contribution.id).is_ok());
    fx.assert_consistent();
}

#[test]
fn test_quick_receipt_from_customer_credits_receivable() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    fx.sell(day(1, 2), dec!(10), dec!(30), Decimal::ZERO);
    let customer = fx.customer;

    let payment = fx
        .run(|uow| {
            CashService::quick_receipt(
                uow,
                QuickCashRequest {
                    date: day(1, 3),
                    amount: dec!(120),
                    contact_id: Some(customer),
                    method: None,
                    description: "On account".into(),
                },
            )
        })
        .unwrap();

    assert_eq!(payment.origin, PaymentOrigin::QuickReceipt);
    assert_eq!(fx.balance(AccountRole::Cash), dec!(120));
    assert_eq!(fx.balance(AccountRole::Receivable), dec!(180));
    assert_eq!(legs_of(&fx, EventKind::CashReceipt, payment.id.into_inner()).len(), 2);
}

#[test]
fn test_quick_payment_to_supplier_debits_payable() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(1000));
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    let supplier = fx.supplier;

    let payment = fx
        .run(|uow| {
            CashService::quick_payment(
                uow,
                QuickCashRequest {
                    date: day(1, 3),
                    amount: dec!(60),
                    contact_id: Some(supplier),
                    method: Some("BANK".into()),
                    description: String::new(),
                },
            )
        })
        .unwrap();

    assert_eq!(payment.origin, PaymentOrigin::QuickPayment);
    assert_eq!(payment.method, "BANK");
    assert_eq!(fx.balance(AccountRole::Cash), dec!(940));
    assert_eq!(fx.balance(AccountRole::Payable), dec!(40));
}

#[test]
fn test_expense_round_trip() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(1000));

    let expense = fx
        .run(|uow| {
            CashService::record_expense(
                uow,
                ExpenseRequest {
                    expense_date: day(1, 2),
                    amount: dec!(75.5),
                    category: "TRANSPORT".into(),
                    description: "Truck hire".into(),
                    expense_account_id: None,
                    paid_from_account_id: None,
                    season_id: None,
                },
            )
        })
        .unwrap();
    assert_eq!(expense.source, ExpenseSource::Recorded);
    assert_eq!(fx.balance(AccountRole::GeneralExpenses), dec!(75.5));
    assert_eq!(fx.balance(AccountRole::Cash), dec!(924.5));

    fx.run(|uow| CashService::delete_expense(uow, expense.id)).unwrap();
    assert_eq!(fx.balance(AccountRole::GeneralExpenses), Decimal::ZERO);
    assert_eq!(fx.balance(AccountRole::Cash), dec!(1000));
}

#[test]
fn test_expense_against_non_expense_account() {
    let mut fx = Fixture::new();
    let cash = role(&fx, AccountRole::Cash);

    let err = fx
        .run(|uow| {
            CashService::record_expense(
                uow,
                ExpenseRequest {
                    expense_date: day(1, 2),
                    amount: dec!(10),
                    category: "MISC".into(),
                    description: "Wrong".into(),
                    expense_account_id: Some(cash),
                    paid_from_account_id: None,
                    season_id: None,
                },
            )
        })
        .unwrap_err();

    assert!(matches!(err, KernelError::Validation { .. }));
}

// ---------------------------------------------------------------------------
// Journals and stock
// ---------------------------------------------------------------------------

#[test]
fn test_journal_post_and_reverse() {
    let mut fx = Fixture::new();
    let cash = role(&fx, AccountRole::Cash);
    let equity = role(&fx, AccountRole::OwnerEquity);

    let (journal_id, entries) = fx
        .run(|uow| {
            JournalService::post(
                uow,
                JournalRequest {
                    entry_date: day(1, 1),
                    legs: vec![
                        PostingLeg::debit(cash, dec!(500), "Float"),
                        PostingLeg::credit(equity, dec!(500), "Float"),
                    ],
                },
            )
        })
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(fx.balance(AccountRole::Cash), dec!(500));

    let reversal = fx
        .run(|uow| JournalService::reverse(uow, journal_id, day(1, 2)))
        .unwrap();
    assert_eq!(reversal.len(), 2);
    assert!(reversal.iter().all(|leg| leg.source_kind.reversal));
    assert_eq!(fx.balance(AccountRole::Cash), Decimal::ZERO);
}

#[test]
fn test_unbalanced_journal_is_rejected() {
    let mut fx = Fixture::new();
    let cash = role(&fx, AccountRole::Cash);
    let equity = role(&fx, AccountRole::OwnerEquity);

    let err = fx
        .run(|uow| {
            JournalService::post(
                uow,
                JournalRequest {
                    entry_date: day(1, 1),
                    legs: vec![
                        PostingLeg::debit(cash, dec!(500), "Float"),
                        PostingLeg::credit(equity, dec!(499), "Float"),
                    ],
                },
            )
        })
        .unwrap_err();

    assert!(matches!(err, KernelError::Unbalanced { .. }));
    assert_eq!(fx.book().ledger_entries().count(), 0);
}

#[test]
fn test_opening_stock_enters_equity() {
    let mut fx = Fixture::new();
    let crop = fx.crop;

    let batch = fx
        .run(|uow| {
            StockService::opening_stock(
                uow,
                OpeningStockRequest {
                    crop_id: crop,
                    date: day(1, 1),
                    quantity_kg: dec!(300),
                    cost_per_kg: dec!(12),
                },
            )
        })
        .unwrap();

    assert_eq!(batch.origin, BatchOrigin::Opening);
    assert_eq!(fx.balance(AccountRole::Inventory), dec!(3600));
    assert_eq!(fx.balance(AccountRole::OwnerEquity), dec!(3600));
    fx.assert_consistent();

    fx.run(|uow| StockService::delete_opening_stock(uow, batch.id))
        .unwrap();
    assert_eq!(fx.balance(AccountRole::Inventory), Decimal::ZERO);
    assert_eq!(fx.book().inventory(crop).unwrap().net_stock_kg, Decimal::ZERO);
}

#[test]
fn test_delete_opening_stock_rejects_purchase_batch() {
    let mut fx = Fixture::new();
    let purchase = fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);

    let err = fx
        .run(|uow| StockService::delete_opening_stock(uow, purchase.batch_id))
        .unwrap_err();

    assert!(matches!(err, KernelError::Validation { .. }));
}

#[test]
fn test_transformation_moves_cost_between_crops() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(100), dec!(10), Decimal::ZERO);
    let flour = fx
        .run(|uow| {
            CropService::create(
                uow,
                CropRequest {
                    name: "Flour".into(),
                    ..CropRequest::default()
                },
            )
        })
        .unwrap();
    let wheat = fx.crop;

    let transformation = fx
        .run(|uow| {
            StockService::transform(
                uow,
                TransformRequest {
                    transform_date: day(1, 2),
                    input_crop_id: wheat,
                    input_qty: dec!(60),
                    output_crop_id: flour.id,
                    output_qty: dec!(45),
                    notes: None,
                },
            )
        })
        .unwrap();

    assert_eq!(transformation.input_cost, dec!(600));
    assert_eq!(transformation.output_cost_per_kg, round_internal(dec!(600) / dec!(45)));
    assert_eq!(fx.book().inventory(wheat).unwrap().net_stock_kg, dec!(40));
    let out = fx.book().inventory(flour.id).unwrap();
    assert_eq!(out.net_stock_kg, dec!(45));
    assert_eq!(fx.balance(AccountRole::Inventory), dec!(1000));
    fx.assert_consistent();

    fx.run(|uow| StockService::delete_transformation(uow, transformation.id))
        .unwrap();
    assert_eq!(fx.book().inventory(wheat).unwrap().net_stock_kg, dec!(100));
    assert_eq!(fx.book().inventory(flour.id).unwrap().net_stock_kg, Decimal::ZERO);
    fx.assert_consistent();
}

#[test]
fn test_transformation_into_same_crop() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(100), dec!(10), Decimal::ZERO);
    let wheat = fx.crop;

    let err = fx
        .run(|uow| {
            StockService::transform(
                uow,
                TransformRequest {
                    transform_date: day(1, 2),
                    input_crop_id: wheat,
                    input_qty: dec!(10),
                    output_crop_id: wheat,
                    output_qty: dec!(9),
                    notes: None,
                },
            )
        })
        .unwrap_err();

    assert!(matches!(err, KernelError::Validation { .. }));
}

#[test]
fn test_low_stock_alert_after_sale() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(150), dec!(10), Decimal::ZERO);
    assert!(InventoryEngine::low_stock_alerts(fx.book()).is_empty());

    fx.sell(day(1, 2), dec!(60), dec!(15), Decimal::ZERO);

    let alerts = InventoryEngine::low_stock_alerts(fx.book());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].net_stock_kg, dec!(90));
    assert_eq!(alerts[0].threshold_kg, dec!(100));
}

#[test]
fn test_cash_trade_figures() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(10000));
    fx.buy(day(1, 5), dec!(1000), dec!(10), dec!(10000));
    fx.sell(day(1, 10), dec!(500), dec!(15), dec!(7500));

    // 10,000 in, 10,000 out to the supplier, 7,500 back from the customer.
    assert_eq!(fx.balance(AccountRole::Cash), dec!(7500));
    assert_eq!(fx.balance(AccountRole::Inventory), dec!(5000));
    assert_eq!(fx.balance(AccountRole::OwnerEquity), dec!(10000));
    assert_eq!(fx.balance(AccountRole::SalesRevenue), dec!(7500));
    assert_eq!(fx.balance(AccountRole::Cogs), dec!(5000));
    assert_eq!(fx.balance(AccountRole::Receivable), Decimal::ZERO);
    assert_eq!(fx.balance(AccountRole::Payable), Decimal::ZERO);
    let inventory = fx.book().inventory(fx.crop).unwrap();
    assert_eq!(inventory.net_stock_kg, dec!(500));
    assert_eq!(inventory.average_cost_per_kg, dec!(10));
    fx.assert_consistent();
}
