//! Tests for crop and contact maintenance.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::contacts::ContactRequest;
use crate::error::KernelError;
use crate::events::{PaymentRequest, PaymentService, TransactionType};
use crate::settings::AccountRole;
use crate::testing::{Fixture, day};

fn barley(fx: &mut Fixture) -> crate::inventory::Crop {
    fx.run(|uow| {
        CropService::create(
            uow,
            CropRequest {
                name: "Barley".into(),
                ..CropRequest::default()
            },
        )
    })
    .unwrap()
}

fn trader(
    fx: &mut Fixture,
    name: &str,
    supplier: bool,
    customer: bool,
) -> crate::contacts::Contact {
    let req = ContactRequest {
        name: name.into(),
        is_supplier: supplier,
        is_customer: customer,
        ..ContactRequest::default()
    };
    fx.run(|uow| ContactService::create(uow, req)).unwrap()
}

#[test]
fn test_crop_create_seeds_empty_inventory() {
    let mut fx = Fixture::new();
    let crop = barley(&mut fx);

    let inventory = fx.book().inventory(crop.id).unwrap();
    assert_eq!(inventory.net_stock_kg, Decimal::ZERO);
    assert_eq!(inventory.low_stock_threshold_kg, dec!(100));
    assert!(crop.is_active);
}

#[test]
fn test_crop_names_are_unique_ignoring_case() {
    let mut fx = Fixture::new();
    let err = fx
        .run(|uow| {
            CropService::create(
                uow,
                CropRequest {
                    name: "WHEAT".into(),
                    ..CropRequest::default()
                },
            )
        })
        .unwrap_err();

    assert!(matches!(err, KernelError::IntegrityViolation(_)));
}

#[test]
fn test_crop_rejects_non_positive_factor() {
    let mut fx = Fixture::new();
    let err = fx
        .run(|uow| {
            CropService::create(
                uow,
                CropRequest {
                    name: "Rice".into(),
                    conversion_factors: BTreeMap::from([("ardeb".to_string(), Decimal::ZERO)]),
                    ..CropRequest::default()
                },
            )
        })
        .unwrap_err();

    assert!(
        matches!(err, KernelError::Validation { ref field, .. } if field == "conversion_factors")
    );
}

#[test]
fn test_custom_pricing_unit_overrides_formula() {
    let mut fx = Fixture::new();
    let rice = fx
        .run(|uow| {
            CropService::create(
                uow,
                CropRequest {
                    name: "Rice".into(),
                    pricing_units: vec!["ardeb".into()],
                    conversion_factors: BTreeMap::from([("ardeb".to_string(), dec!(150))]),
                    ..CropRequest::default()
                },
            )
        })
        .unwrap();
    let mut req = fx.purchase_request(day(1, 1), dec!(300), dec!(900), Decimal::ZERO);
    req.crop_id = rice.id;
    req.quantity.pricing_unit = Some("ardeb".into());

    let purchase = fx
        .run(|uow| crate::events::PurchaseService::record(uow, req))
        .unwrap();

    assert_eq!(purchase.conversion_factor, dec!(150));
    assert_eq!(purchase.total_cost, dec!(1800));
    assert_eq!(purchase.pricing_unit, "ardeb");
}

#[test]
fn test_inactive_crop_refuses_events() {
    let mut fx = Fixture::new();
    let crop = fx.crop;
    fx.run(|uow| CropService::set_active(uow, crop, false)).unwrap();
    let req = fx.purchase_request(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);

    let err = fx
        .run(|uow| crate::events::PurchaseService::record(uow, req))
        .unwrap_err();

    assert!(matches!(err, KernelError::Validation { ref field, .. } if field == "crop_id"));
}

#[test]
fn test_crop_delete_restrict() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    let crop = fx.crop;

    let err = fx
        .run(|uow| CropService::delete(uow, crop, DeleteMode::Restrict))
        .unwrap_err();
    assert!(matches!(err, KernelError::DependencyConflict { .. }));

    let unused = barley(&mut fx);
    fx.run(|uow| CropService::delete(uow, unused.id, DeleteMode::Restrict))
        .unwrap();
    assert!(fx.book().crop(unused.id).is_err());
    assert!(fx.book().inventory(unused.id).is_err());
}

#[test]
fn test_crop_delete_migrates_stock() {
    let mut fx = Fixture::new();
    let purchase = fx.buy(day(1, 1), dec!(100), dec!(10), Decimal::ZERO);
    fx.sell(day(1, 2), dec!(40), dec!(15), Decimal::ZERO);
    let target = barley(&mut fx);
    let crop = fx.crop;

    fx.run(|uow| CropService::delete(uow, crop, DeleteMode::MigrateTo(target.id)))
        .unwrap();

    assert!(fx.book().crop(crop).is_err());
    assert_eq!(fx.book().purchase(purchase.id).unwrap().crop_id, target.id);
    assert_eq!(fx.book().batch(purchase.batch_id).unwrap().crop_id, target.id);
    let inventory = fx.book().inventory(target.id).unwrap();
    assert_eq!(inventory.net_stock_kg, dec!(60));
    assert_eq!(inventory.average_cost_per_kg, dec!(10));
    fx.assert_consistent();
}

#[test]
fn test_crop_delete_force_unwinds_events() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(5000));
    let purchase = fx.buy(day(1, 1), dec!(100), dec!(10), dec!(500));
    let req = PaymentRequest {
        payment_date: day(1, 3),
        amount: dec!(100),
        contact_id: None,
        method: "CASH".into(),
        debit_account_id: fx.kernel.settings().resolve(fx.book(), AccountRole::Payable).unwrap(),
        credit_account_id: fx.kernel.settings().resolve(fx.book(), AccountRole::Cash).unwrap(),
        transaction_type: TransactionType::Purchase,
        transaction_id: Some(purchase.id.into_inner()),
        notes: None,
    };
    fx.run(|uow| PaymentService::record(uow, req)).unwrap();
    fx.sell(day(1, 2), dec!(30), dec!(15), dec!(450));
    fx.sell(day(1, 4), dec!(20), dec!(15), Decimal::ZERO);
    let crop = fx.crop;

    fx.run(|uow| CropService::delete(uow, crop, DeleteMode::Force))
        .unwrap();

    assert_eq!(fx.book().purchases().count(), 0);
    assert_eq!(fx.book().sales().count(), 0);
    assert_eq!(fx.book().payments().count(), 0);
    assert_eq!(fx.book().batches().count(), 0);
    assert_eq!(fx.balance(AccountRole::Cash), dec!(5000));
    assert_eq!(fx.balance(AccountRole::Inventory), Decimal::ZERO);
    assert_eq!(fx.balance(AccountRole::Payable), Decimal::ZERO);
    assert_eq!(fx.balance(AccountRole::SalesRevenue), Decimal::ZERO);
    fx.assert_consistent();
}

#[test]
fn test_contact_needs_a_capability() {
    let mut fx = Fixture::new();
    let req = ContactRequest {
        name: "Nobody".into(),
        ..ContactRequest::default()
    };

    let err = fx.run(|uow| ContactService::create(uow, req)).unwrap_err();

    assert!(matches!(err, KernelError::Validation { .. }));
}

#[test]
fn test_contact_cannot_drop_used_capability() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    let supplier = fx.supplier;
    let req = ContactRequest {
        name: "Hassan Farms".into(),
        is_customer: true,
        ..ContactRequest::default()
    };

    let err = fx
        .run(|uow| ContactService::update(uow, supplier, req))
        .unwrap_err();

    assert!(matches!(err, KernelError::DependencyConflict { .. }));
}

#[test]
fn test_contact_delete_restrict_and_migrate() {
    let mut fx = Fixture::new();
    let purchase = fx.buy(day(1, 1), dec!(10), dec!(10), Decimal::ZERO);
    let supplier = fx.supplier;
    let customer = fx.customer;
    let other = trader(&mut fx, "Nile Growers", true, false);

    let err = fx
        .run(|uow| ContactService::delete(uow, supplier, DeleteMode::Restrict))
        .unwrap_err();
    assert!(matches!(err, KernelError::DependencyConflict { .. }));

    let err = fx
        .run(|uow| ContactService::delete(uow, supplier, DeleteMode::MigrateTo(customer)))
        .unwrap_err();
    assert!(matches!(err, KernelError::Validation { .. }));

    fx.run(|uow| ContactService::delete(uow, supplier, DeleteMode::MigrateTo(other.id)))
        .unwrap();
    assert!(fx.book().contact(supplier).is_err());
    assert_eq!(fx.book().purchase(purchase.id).unwrap().supplier_id, other.id);
    assert_eq!(
        fx.book().batch(purchase.batch_id).unwrap().supplier_id,
        Some(other.id)
    );
}

#[test]
fn test_contact_delete_force() {
    let mut fx = Fixture::new();
    fx.buy(day(1, 1), dec!(100), dec!(10), Decimal::ZERO);
    fx.sell(day(1, 2), dec!(10), dec!(15), dec!(150));
    fx.sell(day(1, 3), dec!(10), dec!(15), Decimal::ZERO);
    let customer = fx.customer;

    fx.run(|uow| ContactService::delete(uow, customer, DeleteMode::Force))
        .unwrap();

    assert!(fx.book().contact(customer).is_err());
    assert_eq!(fx.book().sales().count(), 0);
    assert_eq!(fx.book().inventory(fx.crop).unwrap().net_stock_kg, dec!(100));
    assert_eq!(fx.balance(AccountRole::Receivable), Decimal::ZERO);
    fx.assert_consistent();
}
