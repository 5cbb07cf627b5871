//! Kernel facade: owns the book, hands out units of work.

use granary_shared::config::KernelConfig;
use granary_shared::types::UserId;
use tracing::{info, warn};

use crate::accounts::{AccountService, NewAccount, default_chart};
use crate::error::KernelResult;
use crate::settings::{SettingsResolver, SettingsService, Tunable};
use crate::store::{Book, ChangeSet, UnitOfWork};

/// Value returned by a committed operation together with its changes.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    /// The operation's result.
    pub value: T,
    /// Rows written by the unit of work.
    pub changes: ChangeSet,
}

/// The bookkeeping kernel.
///
/// Units of work borrow the kernel mutably, so operations are serialized.
#[derive(Debug, Default)]
pub struct Kernel {
    book: Book,
    settings: SettingsResolver,
}

impl Kernel {
    /// Wraps a loaded book.
    #[must_use]
    pub fn new(book: Book) -> Self {
        Self {
            book,
            settings: SettingsResolver::new(),
        }
    }

    /// A kernel over a freshly seeded book.
    pub fn bootstrapped(user: UserId, config: &KernelConfig) -> KernelResult<Self> {
        let mut kernel = Self::new(Book::new());
        kernel.bootstrap(user, config)?;
        Ok(kernel)
    }

    /// Read access to the book.
    #[must_use]
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// The role resolver.
    #[must_use]
    pub fn settings(&self) -> &SettingsResolver {
        &self.settings
    }

    /// Opens a unit of work.
    pub fn begin(&mut self, user: UserId) -> UnitOfWork<'_> {
        UnitOfWork::begin(&mut self.book, &self.settings, user)
    }

    /// Runs `op` in a unit of work, committing on `Ok` and rolling back on `Err`.
    pub fn execute<T, F>(&mut self, user: UserId, op: F) -> KernelResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> KernelResult<T>,
    {
        self.execute_tracked(user, op).map(|committed| committed.value)
    }

    /// Like [`Self::execute`], also returning the committed change set.
    pub fn execute_tracked<T, F>(&mut self, user: UserId, op: F) -> KernelResult<Committed<T>>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> KernelResult<T>,
    {
        let mut uow = self.begin(user);
        match op(&mut uow) {
            Ok(value) => {
                let changes = uow.commit();
                Ok(Committed { value, changes })
            }
            Err(err) => {
                warn!(error = %err, code = err.error_code(), "operation failed");
                uow.rollback();
                Err(err)
            }
        }
    }

    /// Seeds the default chart, the role registry and the tunables.
    ///
    /// Does nothing on a book that already has accounts or settings.
    pub fn bootstrap(&mut self, user: UserId, config: &KernelConfig) -> KernelResult<ChangeSet> {
        if !self.book.is_empty() {
            return Ok(ChangeSet::default());
        }
        let committed = self.execute_tracked(user, |uow| seed(uow, config))?;
        info!(rows = committed.changes.len(), "book bootstrapped");
        Ok(committed.changes)
    }
}

fn seed(uow: &mut UnitOfWork<'_>, config: &KernelConfig) -> KernelResult<()> {
    for default in default_chart() {
        let account = AccountService::create(
            uow,
            NewAccount {
                name: default.name.to_string(),
                account_type: default.kind,
            },
        )?;
        SettingsService::assign_role(uow, default.role, account.id)?;
    }
    SettingsService::set_setting(
        uow,
        Tunable::LowStockThresholdKg.key(),
        &config.low_stock_threshold_kg.to_string(),
    )?;
    SettingsService::set_setting(
        uow,
        Tunable::DiscrepancyTolerance.key(),
        &config.discrepancy_tolerance.to_string(),
    )?;
    SettingsService::set_setting(
        uow,
        Tunable::SaleReturnReversesCogs.key(),
        &config.sale_return_reverses_cogs.to_string(),
    )?;
    Ok(())
}
