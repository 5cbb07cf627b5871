//! Owner capital movements.

use granary_shared::types::{CapitalAllocationId, round_internal};
use rust_decimal::Decimal;
use tracing::info;

use super::common::{require_positive, season_tag};
use super::types::{CapitalAllocation, CapitalRequest, CapitalType};
use crate::audit::{AuditAction, snapshot};
use crate::error::{KernelError, KernelResult};
use crate::ledger::{EventKind, LedgerService, PostingLeg, SourceKind};
use crate::settings::AccountRole;
use crate::store::{Row, RowKey, UnitOfWork};

const ENTITY: &str = "CapitalAllocation";

/// Records and deletes capital contributions and withdrawals.
pub struct CapitalService;

impl CapitalService {
    /// Owner puts money in: `Dr Cash, Cr Owner Equity`.
    pub fn contribute(
        uow: &mut UnitOfWork<'_>,
        req: CapitalRequest,
    ) -> KernelResult<CapitalAllocation> {
        Self::compose(uow, CapitalType::Contribution, req)
    }

    /// Owner takes money out: `Dr Owner Equity, Cr Cash`.
    ///
    /// # Errors
    ///
    /// `InsufficientEquity` when the amount exceeds the owner equity balance.
    pub fn withdraw(
        uow: &mut UnitOfWork<'_>,
        req: CapitalRequest,
    ) -> KernelResult<CapitalAllocation> {
        Self::compose(uow, CapitalType::Withdrawal, req)
    }

    /// Reverses and removes a capital movement.
    ///
    /// # Errors
    ///
    /// `InsufficientEquity` when taking a contribution back would leave
    /// owner equity below zero, for example after a withdrawal drew on it.
    pub fn delete(
        uow: &mut UnitOfWork<'_>,
        allocation_id: CapitalAllocationId,
    ) -> KernelResult<()> {
        let allocation = uow.book().capital_allocation(allocation_id)?.clone();
        if allocation.allocation_type == CapitalType::Contribution {
            Self::require_equity(uow, allocation.amount)?;
        }
        LedgerService::reverse(
            uow,
            SourceKind::of(Self::event(allocation.allocation_type)),
            allocation_id.into_inner(),
            allocation.allocation_date,
        )?;
        uow.remove(&RowKey::Capital(allocation_id));
        uow.audit(
            AuditAction::Delete,
            ENTITY,
            allocation_id.into_inner(),
            snapshot(&allocation),
            None,
        );
        info!(%allocation_id, "capital allocation deleted");
        Ok(())
    }

    fn compose(
        uow: &mut UnitOfWork<'_>,
        allocation_type: CapitalType,
        req: CapitalRequest,
    ) -> KernelResult<CapitalAllocation> {
        require_positive("amount", req.amount)?;
        if req.owner_name.trim().is_empty() {
            return Err(KernelError::validation("owner_name", "owner name is required"));
        }
        let amount = round_internal(req.amount);
        let season_id = season_tag(uow, req.season_id)?;
        let cash = uow.role(AccountRole::Cash)?;
        let equity = uow.role(AccountRole::OwnerEquity)?;

        if allocation_type == CapitalType::Withdrawal {
            Self::require_equity(uow, amount)?;
        }

        let id = CapitalAllocationId::new();
        let description = format!("Capital {} by {}", allocation_type.as_str(), req.owner_name);
        let legs = match allocation_type {
            CapitalType::Contribution => vec![
                PostingLeg::debit(cash, amount, description.clone()),
                PostingLeg::credit(equity, amount, description),
            ],
            CapitalType::Withdrawal => vec![
                PostingLeg::debit(equity, amount, description.clone()),
                PostingLeg::credit(cash, amount, description),
            ],
        };
        LedgerService::post(
            uow,
            req.allocation_date,
            SourceKind::of(Self::event(allocation_type)),
            id.into_inner(),
            legs,
        )?;

        let allocation = CapitalAllocation {
            id,
            allocation_date: req.allocation_date,
            allocation_type,
            amount,
            owner_name: req.owner_name,
            season_id,
            notes: req.notes,
            created_by: uow.user(),
            created_at: uow.now(),
        };
        uow.upsert(Row::Capital(allocation.clone()));
        uow.audit(
            AuditAction::Create,
            ENTITY,
            id.into_inner(),
            None,
            snapshot(&allocation),
        );
        info!(
            allocation_id = %id,
            kind = allocation_type.as_str(),
            amount = %amount,
            "capital movement recorded"
        );
        Ok(allocation)
    }

    fn require_equity(uow: &UnitOfWork<'_>, amount: Decimal) -> KernelResult<()> {
        let equity = uow.role(AccountRole::OwnerEquity)?;
        let available = uow.book().account(equity)?.balance;
        if amount > available {
            return Err(KernelError::InsufficientEquity {
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    fn event(allocation_type: CapitalType) -> EventKind {
        match allocation_type {
            CapitalType::Contribution => EventKind::CapitalContribution,
            CapitalType::Withdrawal => EventKind::CapitalWithdrawal,
        }
    }
}
