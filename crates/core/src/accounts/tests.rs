//! Tests for chart-of-accounts maintenance.

use rust_decimal_macros::dec;

use super::*;
use crate::audit::{AuditAction, audit_trail};
use crate::error::KernelError;
use crate::settings::{AccountRole, SettingsService};
use crate::testing::{Fixture, day};

fn storage_fees(fx: &mut Fixture) -> FinancialAccount {
    fx.run(|uow| {
        AccountService::create(
            uow,
            NewAccount {
                name: " Storage Fees ".into(),
                account_type: AccountKind::Expense,
            },
        )
    })
    .unwrap()
}

#[test]
fn test_create_trims_name_and_starts_at_zero() {
    let mut fx = Fixture::new();
    let account = storage_fees(&mut fx);

    assert_eq!(account.name, "Storage Fees");
    assert_eq!(account.balance, dec!(0));
    assert!(account.is_active);
}

#[test]
fn test_create_rejects_blank_name() {
    let mut fx = Fixture::new();
    let err = fx
        .run(|uow| {
            AccountService::create(
                uow,
                NewAccount {
                    name: String::new(),
                    account_type: AccountKind::Asset,
                },
            )
        })
        .unwrap_err();
    assert!(matches!(err, KernelError::Validation { ref field, .. } if field == "name"));
}

#[test]
fn test_rename_is_audited() {
    let mut fx = Fixture::new();
    let account = storage_fees(&mut fx);
    fx.run(|uow| AccountService::rename(uow, account.id, "Warehouse Rent"))
        .unwrap();

    assert_eq!(fx.book().account(account.id).unwrap().name, "Warehouse Rent");
    let actions: Vec<_> = audit_trail(fx.book(), "Account", account.id.into_inner())
        .into_iter()
        .map(|log| log.action)
        .collect();
    assert_eq!(actions, vec![AuditAction::Create, AuditAction::Update]);
}

#[test]
fn test_role_account_cannot_be_deactivated() {
    let mut fx = Fixture::new();
    let cash = SettingsService::resolve(fx.book(), AccountRole::Cash).unwrap();

    let err = fx
        .run(|uow| AccountService::set_active(uow, cash, false))
        .unwrap_err();

    assert_eq!(err.error_code(), "DEPENDENCY_CONFLICT");
    assert!(fx.book().account(cash).unwrap().is_active);
}

#[test]
fn test_plain_account_toggles() {
    let mut fx = Fixture::new();
    let account = storage_fees(&mut fx);

    let off = fx
        .run(|uow| AccountService::set_active(uow, account.id, false))
        .unwrap();
    assert!(!off.is_active);
    let on = fx
        .run(|uow| AccountService::set_active(uow, account.id, true))
        .unwrap();
    assert!(on.is_active);
}

#[test]
fn test_delete_refused_when_legs_reference_account() {
    let mut fx = Fixture::new();
    fx.contribute(day(1, 1), dec!(1000));
    let cash = SettingsService::resolve(fx.book(), AccountRole::Cash).unwrap();

    let err = fx.run(|uow| AccountService::delete(uow, cash)).unwrap_err();

    let KernelError::DependencyConflict { dependents, .. } = &err else {
        panic!("expected a dependency conflict, got {err:?}");
    };
    assert!(dependents.contains("ledger legs"));
}

#[test]
fn test_delete_unused_account() {
    let mut fx = Fixture::new();
    let account = storage_fees(&mut fx);

    fx.run(|uow| AccountService::delete(uow, account.id)).unwrap();

    assert!(fx.book().account(account.id).is_err());
}
