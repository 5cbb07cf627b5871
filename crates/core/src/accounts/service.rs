//! Chart-of-accounts maintenance.

use granary_shared::types::AccountId;
use rust_decimal::Decimal;
use tracing::info;

use super::types::{FinancialAccount, NewAccount};
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::settings::AccountRole;
use crate::store::{Row, RowKey, UnitOfWork};

/// Creates, renames, toggles and deletes accounts.
pub struct AccountService;

impl AccountService {
    /// Creates an account with a zero balance.
    pub fn create(uow: &mut UnitOfWork<'_>, input: NewAccount) -> KernelResult<FinancialAccount> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(KernelError::validation("name", "account name must not be empty"));
        }
        let account = FinancialAccount {
            id: AccountId::new(),
            name,
            account_type: input.account_type,
            is_active: true,
            balance: Decimal::ZERO,
            created_at: uow.now(),
        };
        uow.upsert(Row::Account(account.clone()));
        uow.audit(
            AuditAction::Create,
            "Account",
            account.id.into_inner(),
            None,
            snapshot(&account),
        );
        info!(
            account_id = %account.id,
            name = %account.name,
            kind = %account.account_type,
            "account created"
        );
        Ok(account)
    }

    /// Renames an account.
    pub fn rename(
        uow: &mut UnitOfWork<'_>,
        account_id: AccountId,
        name: &str,
    ) -> KernelResult<FinancialAccount> {
        let name = name.trim();
        if name.is_empty() {
            return Err(KernelError::validation("name", "account name must not be empty"));
        }
        let before = uow.book().account(account_id)?.clone();
        let after = FinancialAccount {
            name: name.to_string(),
            ..before.clone()
        };
        uow.upsert(Row::Account(after.clone()));
        uow.audit(
            AuditAction::Update,
            "Account",
            account_id.into_inner(),
            snapshot(&before),
            snapshot(&after),
        );
        Ok(after)
    }

    /// Activates or deactivates an account.
    ///
    /// # Errors
    ///
    /// `DependencyConflict` when deactivating an account that fills a role.
    pub fn set_active(
        uow: &mut UnitOfWork<'_>,
        account_id: AccountId,
        is_active: bool,
    ) -> KernelResult<FinancialAccount> {
        let before = uow.book().account(account_id)?.clone();
        if !is_active && let Some(role) = Self::role_of(uow, account_id) {
            return Err(KernelError::DependencyConflict {
                entity: "Account",
                id: account_id.to_string(),
                dependents: format!("assigned to role {role}"),
            });
        }
        let after = FinancialAccount {
            is_active,
            ..before.clone()
        };
        uow.upsert(Row::Account(after.clone()));
        uow.audit(
            AuditAction::Update,
            "Account",
            account_id.into_inner(),
            snapshot(&before),
            snapshot(&after),
        );
        Ok(after)
    }

    /// Deletes an account that no leg references and no role uses.
    pub fn delete(uow: &mut UnitOfWork<'_>, account_id: AccountId) -> KernelResult<()> {
        let before = uow.book().account(account_id)?.clone();
        let legs = uow
            .book()
            .ledger_entries()
            .filter(|leg| leg.account_id == account_id)
            .count();
        if legs > 0 {
            return Err(KernelError::DependencyConflict {
                entity: "Account",
                id: account_id.to_string(),
                dependents: format!("{legs} ledger legs"),
            });
        }
        if let Some(role) = Self::role_of(uow, account_id) {
            return Err(KernelError::DependencyConflict {
                entity: "Account",
                id: account_id.to_string(),
                dependents: format!("assigned to role {role}"),
            });
        }
        uow.remove(&RowKey::Account(account_id));
        uow.audit(
            AuditAction::Delete,
            "Account",
            account_id.into_inner(),
            snapshot(&before),
            None,
        );
        Ok(())
    }

    fn role_of(uow: &UnitOfWork<'_>, account_id: AccountId) -> Option<AccountRole> {
        let wanted = account_id.to_string();
        AccountRole::ALL.into_iter().find(|role| {
            uow.book()
                .setting(role.key())
                .is_some_and(|s| s.value == wanted)
        })
    }
}
