//! Reading and writing settings.

use granary_shared::types::AccountId;
use rust_decimal::Decimal;
use tracing::info;

use super::resolver::SettingsResolver;
use super::types::{AccountRole, Setting, Tunable};
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::store::{Book, Row, UnitOfWork};

/// Settings operations.
pub struct SettingsService;

impl SettingsService {
    /// Raw value of a setting.
    #[must_use]
    pub fn get_setting<'b>(book: &'b Book, key: &str) -> Option<&'b str> {
        book.setting(key).map(|s| s.value.as_str())
    }

    /// Writes a setting.
    pub fn set_setting(uow: &mut UnitOfWork<'_>, key: &str, value: &str) -> KernelResult<Setting> {
        let key = key.trim();
        if key.is_empty() {
            return Err(KernelError::validation("key", "setting key must not be empty"));
        }
        let before = uow.book().setting(key).cloned();
        let setting = Setting {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: uow.now(),
        };
        uow.upsert(Row::Setting(setting.clone()));
        let action = if before.is_some() {
            AuditAction::Update
        } else {
            AuditAction::Create
        };
        uow.audit(
            action,
            "Setting",
            uuid::Uuid::nil(),
            before.as_ref().and_then(snapshot),
            snapshot(&setting),
        );
        Ok(setting)
    }

    /// Points a role at an account.
    pub fn assign_role(
        uow: &mut UnitOfWork<'_>,
        role: AccountRole,
        account_id: AccountId,
    ) -> KernelResult<Setting> {
        uow.book().account(account_id)?;
        let setting = Self::set_setting(uow, role.key(), &account_id.to_string())?;
        info!(%role, %account_id, "account role assigned");
        Ok(setting)
    }

    /// Resolves a role straight from the book.
    pub fn resolve(book: &Book, role: AccountRole) -> KernelResult<AccountId> {
        SettingsResolver::resolve_uncached(book, role)
    }

    /// Decimal tunable, falling back to `default` when unset or malformed.
    #[must_use]
    pub fn tunable_decimal(book: &Book, tunable: Tunable, default: Decimal) -> Decimal {
        Self::get_setting(book, tunable.key())
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(default)
    }

    /// Boolean tunable, falling back to `default` when unset or malformed.
    #[must_use]
    pub fn tunable_bool(book: &Book, tunable: Tunable, default: bool) -> bool {
        Self::get_setting(book, tunable.key())
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(default)
    }
}
