//! Fixtures shared by unit tests.

use chrono::NaiveDate;
use granary_shared::config::KernelConfig;
use granary_shared::types::{ContactId, CropId, UserId};
use rust_decimal::Decimal;

use crate::contacts::ContactRequest;
use crate::error::KernelResult;
use crate::events::{
    CapitalRequest, CapitalService, Purchase, PurchaseRequest, PurchaseService, QuantityInput,
    Sale, SaleRequest, SaleService,
};
use crate::inventory::InventoryEngine;
use crate::kernel::Kernel;
use crate::masterdata::{ContactService, CropRequest, CropService};
use crate::reports::ReportService;
use crate::settings::{AccountRole, SettingsResolver};
use crate::store::{Book, UnitOfWork};

/// A date in 2025.
pub(crate) fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

/// A bootstrapped kernel with one crop, one supplier and one customer.
pub(crate) struct Fixture {
    pub kernel: Kernel,
    pub user: UserId,
    pub crop: CropId,
    pub supplier: ContactId,
    pub customer: ContactId,
}

impl Fixture {
    pub fn new() -> Self {
        let user = UserId::new();
        let mut kernel = Kernel::bootstrapped(user, &KernelConfig::default()).unwrap();
        let (crop, supplier, customer) = kernel
            .execute(user, |uow| {
                let crop = CropService::create(
                    uow,
                    CropRequest {
                        name: "Wheat".into(),
                        ..CropRequest::default()
                    },
                )?;
                let supplier = ContactService::create(
                    uow,
                    ContactRequest {
                        name: "Hassan Farms".into(),
                        is_supplier: true,
                        ..ContactRequest::default()
                    },
                )?;
                let customer = ContactService::create(
                    uow,
                    ContactRequest {
                        name: "Delta Mills".into(),
                        is_customer: true,
                        ..ContactRequest::default()
                    },
                )?;
                Ok((crop.id, supplier.id, customer.id))
            })
            .unwrap();
        Self {
            kernel,
            user,
            crop,
            supplier,
            customer,
        }
    }

    pub fn book(&self) -> &Book {
        self.kernel.book()
    }

    pub fn run<T, F>(&mut self, op: F) -> KernelResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> KernelResult<T>,
    {
        self.kernel.execute(self.user, op)
    }

    /// Running balance of the account holding `role`.
    pub fn balance(&self, role: AccountRole) -> Decimal {
        let id = SettingsResolver::resolve_uncached(self.book(), role).unwrap();
        self.book().account(id).unwrap().balance
    }

    pub fn purchase_request(
        &self,
        date: NaiveDate,
        kg: Decimal,
        price: Decimal,
        paid: Decimal,
    ) -> PurchaseRequest {
        PurchaseRequest {
            crop_id: self.crop,
            supplier_id: self.supplier,
            purchase_date: date,
            season_id: None,
            quantity: QuantityInput::kg(kg, price),
            amount_paid: paid,
            payment_method: None,
            expiry_date: None,
            notes: None,
        }
    }

    pub fn sale_request(
        &self,
        date: NaiveDate,
        kg: Decimal,
        price: Decimal,
        received: Decimal,
    ) -> SaleRequest {
        SaleRequest {
            crop_id: self.crop,
            customer_id: self.customer,
            sale_date: date,
            season_id: None,
            quantity: QuantityInput::kg(kg, price),
            quantity_sold_kg: None,
            amount_received: received,
            payment_method: None,
            notes: None,
        }
    }

    pub fn buy(&mut self, date: NaiveDate, kg: Decimal, price: Decimal, paid: Decimal) -> Purchase {
        let req = self.purchase_request(date, kg, price, paid);
        self.run(|uow| PurchaseService::record(uow, req)).unwrap()
    }

    pub fn sell(
        &mut self,
        date: NaiveDate,
        kg: Decimal,
        price: Decimal,
        received: Decimal,
    ) -> Sale {
        let req = self.sale_request(date, kg, price, received);
        self.run(|uow| SaleService::record(uow, req)).unwrap()
    }

    pub fn contribute(&mut self, date: NaiveDate, amount: Decimal) {
        self.run(|uow| {
            CapitalService::contribute(
                uow,
                CapitalRequest {
                    allocation_date: date,
                    amount,
                    owner_name: "Owner".into(),
                    season_id: None,
                    notes: None,
                },
            )
        })
        .unwrap();
    }

    /// Asserts the ledger balances and every crop's stock agrees with its batches
    /// and with the inventory account.
    pub fn assert_consistent(&self) {
        let trial = ReportService::trial_balance(self.book(), day(12, 31));
        assert!(trial.totals.is_balanced, "trial balance out: {:?}", trial.totals);
        for crop in self.book().crops() {
            let check = InventoryEngine::verify(self.book(), crop.id).unwrap();
            assert!(check.consistent, "{}: {:?}", crop.name, check.problems);
        }
        let dual = ReportService::dual_balance(self.book());
        assert!(
            !dual.discrepancy_detected,
            "ledger {} vs physical {}",
            dual.ledger_inventory,
            dual.physical_inventory
        );
    }
}
