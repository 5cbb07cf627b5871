//! Contact master data.

use granary_shared::types::ContactId;
use tracing::info;

use super::DeleteMode;
use super::force;
use crate::audit::{AuditAction, snapshot};
use crate::contacts::{Contact, ContactRequest};
use crate::error::{KernelError, KernelResult};
use crate::events::{PaymentOrigin, PaymentService};
use crate::store::{Book, Row, RowKey, UnitOfWork};

const ENTITY: &str = "Contact";

/// Creates, edits and deletes contacts.
pub struct ContactService;

impl ContactService {
    /// Creates a supplier, a customer, or both.
    pub fn create(uow: &mut UnitOfWork<'_>, req: ContactRequest) -> KernelResult<Contact> {
        let name = Self::check(&req)?;
        let contact = Contact {
            id: ContactId::new(),
            name,
            phone: req.phone,
            email: req.email,
            address: req.address,
            is_supplier: req.is_supplier,
            is_customer: req.is_customer,
            created_at: uow.now(),
        };
        uow.upsert(Row::Contact(contact.clone()));
        uow.audit(
            AuditAction::Create,
            ENTITY,
            contact.id.into_inner(),
            None,
            snapshot(&contact),
        );
        info!(contact_id = %contact.id, name = %contact.name, "contact created");
        Ok(contact)
    }

    /// Replaces a contact's attributes.
    ///
    /// # Errors
    ///
    /// `DependencyConflict` when dropping a capability the contact's
    /// purchases or sales rely on.
    pub fn update(
        uow: &mut UnitOfWork<'_>,
        contact_id: ContactId,
        req: ContactRequest,
    ) -> KernelResult<Contact> {
        let before = uow.book().contact(contact_id)?.clone();
        let name = Self::check(&req)?;
        if before.is_supplier && !req.is_supplier {
            let purchases = uow.book().purchases().filter(|p| p.supplier_id == contact_id).count();
            if purchases > 0 {
                return Err(KernelError::DependencyConflict {
                    entity: ENTITY,
                    id: contact_id.to_string(),
                    dependents: format!("{purchases} purchases"),
                });
            }
        }
        if before.is_customer && !req.is_customer {
            let sales = uow.book().sales().filter(|s| s.customer_id == contact_id).count();
            if sales > 0 {
                return Err(KernelError::DependencyConflict {
                    entity: ENTITY,
                    id: contact_id.to_string(),
                    dependents: format!("{sales} sales"),
                });
            }
        }
        let contact = Contact {
            id: contact_id,
            name,
            phone: req.phone,
            email: req.email,
            address: req.address,
            is_supplier: req.is_supplier,
            is_customer: req.is_customer,
            created_at: before.created_at,
        };
        uow.upsert(Row::Contact(contact.clone()));
        uow.audit(
            AuditAction::Update,
            ENTITY,
            contact_id.into_inner(),
            snapshot(&before),
            snapshot(&contact),
        );
        Ok(contact)
    }

    /// Deletes a contact.
    ///
    /// # Errors
    ///
    /// - `DependencyConflict` under `Restrict` when events reference the contact
    /// - `Validation` under `MigrateTo` when the target lacks a needed capability
    /// - `CascadeRequired` under `Force` when a dependent event cannot be undone
    pub fn delete(
        uow: &mut UnitOfWork<'_>,
        contact_id: ContactId,
        mode: DeleteMode<ContactId>,
    ) -> KernelResult<()> {
        let contact = uow.book().contact(contact_id)?.clone();
        match mode {
            DeleteMode::Restrict => {
                let dependents = Self::dependents(uow.book(), contact_id);
                if !dependents.is_empty() {
                    return Err(KernelError::DependencyConflict {
                        entity: ENTITY,
                        id: contact_id.to_string(),
                        dependents: dependents.join(", "),
                    });
                }
            }
            DeleteMode::MigrateTo(target) => Self::migrate(uow, contact_id, target)?,
            DeleteMode::Force => Self::force(uow, contact_id)?,
        }
        uow.remove(&RowKey::Contact(contact_id));
        uow.audit(
            AuditAction::Delete,
            ENTITY,
            contact_id.into_inner(),
            snapshot(&contact),
            None,
        );
        info!(%contact_id, name = %contact.name, "contact deleted");
        Ok(())
    }

    fn check(req: &ContactRequest) -> KernelResult<String> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(KernelError::validation("name", "contact name is required"));
        }
        if !req.is_supplier && !req.is_customer {
            return Err(KernelError::validation(
                "is_supplier",
                "a contact must be a supplier, a customer, or both",
            ));
        }
        Ok(name)
    }

    fn dependents(book: &Book, contact_id: ContactId) -> Vec<String> {
        let counts = [
            (
                "purchases",
                book.purchases().filter(|p| p.supplier_id == contact_id).count(),
            ),
            ("sales", book.sales().filter(|s| s.customer_id == contact_id).count()),
            (
                "payments",
                book.payments()
                    .filter(|p| p.contact_id == Some(contact_id))
                    .count(),
            ),
        ];
        counts
            .into_iter()
            .filter(|(_, n)| *n > 0)
            .map(|(what, n)| format!("{n} {what}"))
            .collect()
    }

    fn migrate(
        uow: &mut UnitOfWork<'_>,
        contact_id: ContactId,
        target_id: ContactId,
    ) -> KernelResult<()> {
        if target_id == contact_id {
            return Err(KernelError::validation(
                "target",
                "cannot migrate a contact onto itself",
            ));
        }
        let target = uow.book().contact(target_id)?.clone();

        let purchases: Vec<_> = uow
            .book()
            .purchases()
            .filter(|p| p.supplier_id == contact_id)
            .cloned()
            .collect();
        if !purchases.is_empty() && !target.is_supplier {
            return Err(KernelError::validation(
                "target",
                format!("contact `{}` is not a supplier", target.name),
            ));
        }
        let sales: Vec<_> = uow
            .book()
            .sales()
            .filter(|s| s.customer_id == contact_id)
            .cloned()
            .collect();
        if !sales.is_empty() && !target.is_customer {
            return Err(KernelError::validation(
                "target",
                format!("contact `{}` is not a customer", target.name),
            ));
        }

        for mut purchase in purchases {
            purchase.supplier_id = target_id;
            uow.upsert(Row::Purchase(purchase));
        }
        for mut sale in sales {
            sale.customer_id = target_id;
            uow.upsert(Row::Sale(sale));
        }
        let payments: Vec<_> = uow
            .book()
            .payments()
            .filter(|p| p.contact_id == Some(contact_id))
            .cloned()
            .collect();
        for mut payment in payments {
            payment.contact_id = Some(target_id);
            uow.upsert(Row::Payment(payment));
        }
        let batches: Vec<_> = uow
            .book()
            .batches()
            .filter(|b| b.supplier_id == Some(contact_id))
            .cloned()
            .collect();
        for mut batch in batches {
            batch.supplier_id = Some(target_id);
            uow.upsert(Row::Batch(batch));
        }
        info!(from = %contact_id, to = %target_id, "contact migrated");
        Ok(())
    }

    fn force(uow: &mut UnitOfWork<'_>, contact_id: ContactId) -> KernelResult<()> {
        let mut sales: Vec<_> = uow
            .book()
            .sales()
            .filter(|s| s.customer_id == contact_id)
            .map(|s| (s.sale_date, s.created_at, s.id))
            .collect();
        sales.sort_unstable_by(|a, b| b.cmp(a));
        for (_, _, sale_id) in sales {
            force::delete_sale(uow, sale_id)?;
        }

        let purchases: Vec<_> = uow
            .book()
            .purchases()
            .filter(|p| p.supplier_id == contact_id)
            .map(|p| p.id)
            .collect();
        for purchase_id in purchases {
            force::delete_purchase(uow, purchase_id)?;
        }

        // Inline payments went with their parents; what is left is standalone or quick.
        let payments: Vec<_> = uow
            .book()
            .payments()
            .filter(|p| p.contact_id == Some(contact_id) && p.origin != PaymentOrigin::Inline)
            .map(|p| p.id)
            .collect();
        for payment_id in payments {
            PaymentService::delete(uow, payment_id)?;
        }

        let batches: Vec<_> = uow
            .book()
            .batches()
            .filter(|b| b.supplier_id == Some(contact_id))
            .cloned()
            .collect();
        for mut batch in batches {
            batch.supplier_id = None;
            uow.upsert(Row::Batch(batch));
        }
        Ok(())
    }
}
