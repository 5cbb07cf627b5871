use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = CropId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = BatchId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
    assert_eq!(Uuid::from(id), uuid);
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = AccountId::from_uuid(uuid);
    assert_eq!(format!("{id}"), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = SaleId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
    assert!(SaleId::from_str("not-a-uuid").is_err());
}

#[test]
fn test_typed_ids_follow_creation_order() {
    let first = BatchId::new();
    let second = BatchId::new();
    assert!(first < second);
}
