//! Dependent-event removal shared by the forced deletes.

use granary_shared::types::{PurchaseId, SaleId};

use crate::error::KernelResult;
use crate::events::{
    PaymentOrigin, PaymentService, PurchaseService, ReturnService, SaleService, TransactionType,
};
use crate::store::UnitOfWork;

/// Deletes a sale with its returns and every payment linked to it.
pub(super) fn delete_sale(uow: &mut UnitOfWork<'_>, sale_id: SaleId) -> KernelResult<()> {
    let returns: Vec<_> = uow
        .book()
        .sale_returns()
        .filter(|r| r.sale_id == sale_id)
        .map(|r| r.id)
        .collect();
    for return_id in returns {
        ReturnService::delete_sale_return(uow, return_id)?;
    }
    delete_standalone_payments(uow, TransactionType::Sale, sale_id.into_inner())?;
    SaleService::delete(uow, sale_id)
}

/// Deletes a purchase with its returns and every payment linked to it.
pub(super) fn delete_purchase(
    uow: &mut UnitOfWork<'_>,
    purchase_id: PurchaseId,
) -> KernelResult<()> {
    let returns: Vec<_> = uow
        .book()
        .purchase_returns()
        .filter(|r| r.purchase_id == purchase_id)
        .map(|r| r.id)
        .collect();
    for return_id in returns {
        ReturnService::delete_purchase_return(uow, return_id)?;
    }
    delete_standalone_payments(uow, TransactionType::Purchase, purchase_id.into_inner())?;
    PurchaseService::delete(uow, purchase_id)
}

fn delete_standalone_payments(
    uow: &mut UnitOfWork<'_>,
    transaction_type: TransactionType,
    transaction_id: uuid::Uuid,
) -> KernelResult<()> {
    let payments: Vec<_> = PaymentService::linked(uow.book(), transaction_type, transaction_id)
        .filter(|p| p.origin != PaymentOrigin::Inline)
        .map(|p| p.id)
        .collect();
    for payment_id in payments {
        PaymentService::delete(uow, payment_id)?;
    }
    Ok(())
}
