//! Tests for the settings registry and role resolution.

use rust_decimal_macros::dec;

use super::*;
use crate::accounts::{AccountKind, AccountService, NewAccount};
use crate::error::KernelError;
use crate::testing::Fixture;

fn petty_cash(fx: &mut Fixture) -> granary_shared::types::AccountId {
    fx.run(|uow| {
        AccountService::create(
            uow,
            NewAccount {
                name: "Petty Cash".into(),
                account_type: AccountKind::Cash,
            },
        )
    })
    .unwrap()
    .id
}

#[test]
fn test_bootstrap_mirrors_tunables() {
    let fx = Fixture::new();

    assert_eq!(
        SettingsService::get_setting(fx.book(), Tunable::LowStockThresholdKg.key()),
        Some("100")
    );
    assert_eq!(
        SettingsService::tunable_decimal(fx.book(), Tunable::DiscrepancyTolerance, dec!(9)),
        dec!(1)
    );
    assert!(SettingsService::tunable_bool(
        fx.book(),
        Tunable::SaleReturnReversesCogs,
        false
    ));
}

#[test]
fn test_malformed_tunable_falls_back() {
    let mut fx = Fixture::new();
    fx.run(|uow| SettingsService::set_setting(uow, Tunable::DiscrepancyTolerance.key(), "lots"))
        .unwrap();

    assert_eq!(
        SettingsService::tunable_decimal(fx.book(), Tunable::DiscrepancyTolerance, dec!(2.5)),
        dec!(2.5)
    );
}

#[test]
fn test_empty_key_rejected() {
    let mut fx = Fixture::new();
    let err = fx
        .run(|uow| SettingsService::set_setting(uow, "  ", "x"))
        .unwrap_err();
    assert!(matches!(err, KernelError::Validation { ref field, .. } if field == "key"));
}

#[test]
fn test_assign_role_to_unknown_account() {
    let mut fx = Fixture::new();
    let before = SettingsService::resolve(fx.book(), AccountRole::Cash).unwrap();

    let err = fx
        .run(|uow| {
            let missing = granary_shared::types::AccountId::new();
            SettingsService::assign_role(uow, AccountRole::Cash, missing)
        })
        .unwrap_err();

    assert_eq!(err.error_code(), "NOT_FOUND");
    assert_eq!(SettingsService::resolve(fx.book(), AccountRole::Cash).unwrap(), before);
}

#[test]
fn test_reassigned_role_seen_inside_and_after_the_unit() {
    let mut fx = Fixture::new();
    let petty = petty_cash(&mut fx);
    // warm the kernel's cache
    let old = fx.kernel.settings().resolve(fx.kernel.book(), AccountRole::Cash).unwrap();
    assert_ne!(old, petty);

    let inside = fx
        .run(|uow| {
            SettingsService::assign_role(uow, AccountRole::Cash, petty)?;
            uow.role(AccountRole::Cash)
        })
        .unwrap();

    assert_eq!(inside, petty);
    assert_eq!(
        fx.kernel.settings().resolve(fx.kernel.book(), AccountRole::Cash).unwrap(),
        petty
    );
}

#[test]
fn test_resolver_serves_cached_value_until_invalidated() {
    let mut fx = Fixture::new();
    let resolver = SettingsResolver::new();
    let old = resolver.resolve(fx.book(), AccountRole::Cash).unwrap();
    let petty = petty_cash(&mut fx);
    fx.run(|uow| SettingsService::assign_role(uow, AccountRole::Cash, petty))
        .unwrap();

    assert_eq!(resolver.resolve(fx.book(), AccountRole::Cash).unwrap(), old);
    resolver.invalidate();
    assert_eq!(resolver.resolve(fx.book(), AccountRole::Cash).unwrap(), petty);
}

#[test]
fn test_malformed_role_value() {
    let mut fx = Fixture::new();
    fx.run(|uow| SettingsService::set_setting(uow, AccountRole::Cash.key(), "not-an-id"))
        .unwrap();

    let err = SettingsResolver::resolve_uncached(fx.book(), AccountRole::Cash).unwrap_err();
    assert_eq!(err.error_code(), "INTEGRITY_VIOLATION");
}
