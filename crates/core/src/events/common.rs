//! Checks and lookups shared by the composers.

use granary_shared::types::{ContactId, CropId, SeasonId};
use rust_decimal::Decimal;

use super::types::QuantityInput;
use crate::calculation::{ComplexUnitInput, ComplexUnitResult, calculate};
use crate::contacts::Contact;
use crate::error::{KernelError, KernelResult};
use crate::inventory::Crop;
use crate::store::{Book, UnitOfWork};

/// Fails unless `value` is strictly positive.
pub(crate) fn require_positive(field: &str, value: Decimal) -> KernelResult<()> {
    if value <= Decimal::ZERO {
        return Err(KernelError::validation(field, "must be positive"));
    }
    Ok(())
}

/// Fails when `value` is negative.
pub(crate) fn require_non_negative(field: &str, value: Decimal) -> KernelResult<()> {
    if value < Decimal::ZERO {
        return Err(KernelError::validation(field, "must not be negative"));
    }
    Ok(())
}

/// An active crop.
pub(crate) fn active_crop(book: &Book, crop_id: CropId) -> KernelResult<Crop> {
    let crop = book.crop(crop_id)?;
    if !crop.is_active {
        return Err(KernelError::validation(
            "crop_id",
            format!("crop `{}` is inactive", crop.name),
        ));
    }
    Ok(crop.clone())
}

/// A contact flagged as supplier.
pub(crate) fn supplier(book: &Book, contact_id: ContactId) -> KernelResult<Contact> {
    let contact = book.contact(contact_id)?;
    if !contact.is_supplier {
        return Err(KernelError::validation(
            "supplier_id",
            format!("contact `{}` is not a supplier", contact.name),
        ));
    }
    Ok(contact.clone())
}

/// A contact flagged as customer.
pub(crate) fn customer(book: &Book, contact_id: ContactId) -> KernelResult<Contact> {
    let contact = book.contact(contact_id)?;
    if !contact.is_customer {
        return Err(KernelError::validation(
            "customer_id",
            format!("contact `{}` is not a customer", contact.name),
        ));
    }
    Ok(contact.clone())
}

/// The explicit or active season, checked to exist.
pub(crate) fn season_tag(
    uow: &UnitOfWork<'_>,
    season_id: Option<SeasonId>,
) -> KernelResult<Option<SeasonId>> {
    match uow.season_or_active(season_id) {
        Some(id) => {
            uow.book().season(id)?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}

/// Runs the complex-unit calculation for a crop payload.
///
/// Returns the result and the pricing-unit label. A pricing unit listed in
/// the crop's conversion factors overrides the formula factor; a missing
/// tare falls back to the crop default.
pub(crate) fn quantity_for(
    crop: &Crop,
    quantity: &QuantityInput,
) -> KernelResult<(ComplexUnitResult, String)> {
    let custom_factor = quantity
        .pricing_unit
        .as_deref()
        .and_then(|unit| crop.factor_for(unit));
    let tare = if quantity.bag_count > 0 {
        quantity.tare_per_bag_kg.unwrap_or(crop.default_tare_per_bag)
    } else {
        Decimal::ZERO
    };
    let result = calculate(&ComplexUnitInput {
        formula: quantity.formula,
        gross_weight_kg: quantity.gross_weight_kg,
        bag_count: quantity.bag_count,
        tare_per_bag_kg: tare,
        unit_price: quantity.unit_price,
        custom_factor,
    })?;
    if result.total_amount <= Decimal::ZERO {
        return Err(KernelError::validation(
            "unit_price",
            "the calculated total must be positive",
        ));
    }
    let unit = quantity
        .pricing_unit
        .clone()
        .unwrap_or_else(|| quantity.formula.as_str().to_string());
    Ok((result, unit))
}
