//! Slot assignment and stock ceiling behavior.

#![allow(clippy::unwrap_used)]

use kiosk_core::{BottleSize, KioskError, ProductId, ProductPatch, Slot, SlotKind, StockDraft, Variant};
use kiosk_testing::assertions::check_invariants;
use kiosk_testing::{ProductBuilder, TestKiosk};

const ML30: Variant = Variant::Bottle(BottleSize::Ml30);
const ML60: Variant = Variant::Bottle(BottleSize::Ml60);

/// Over-reservation: 5 units in slot 3 leave nothing for slot 7.
#[tokio::test]
async fn test_slot_over_reservation_rejected() {
    let harness = TestKiosk::new();
    let kiosk = &harness.kiosk;
    let b = kiosk.catalog.create(ProductBuilder::new("B").ml30(5).build()).await.unwrap();

    kiosk.slots.assign_bottle(b.id, 3, BottleSize::Ml30, 0, 5).await.unwrap();
    let err = kiosk.slots.assign_bottle(b.id, 7, BottleSize::Ml30, 0, 1).await.unwrap_err();

    assert_eq!(
        err,
        KioskError::InsufficientAvailable {
            product_id: b.id,
            bottle_size: BottleSize::Ml30,
            requested: 1,
            available: 0,
        }
    );
    let slot7 = kiosk.slots.assignments_for_slot(Slot::bottle(7).unwrap()).await.unwrap();
    assert!(slot7.is_empty());
    assert_eq!(kiosk.slots.available_quantity(b.id, BottleSize::Ml30, None).await.unwrap(), 0);
    assert_eq!(
        kiosk.slots.available_quantity(b.id, BottleSize::Ml30, Some(Slot::bottle(3).unwrap())).await.unwrap(),
        5
    );
}

/// Bottle ceiling: 25 is rejected, 20 is accepted.
#[tokio::test]
async fn test_bottle_ceiling() {
    let harness = TestKiosk::new();
    let kiosk = &harness.kiosk;
    let b = kiosk.catalog.create(ProductBuilder::new("B").build()).await.unwrap();

    let err = kiosk.catalog.set_stock(b.id, ML60, 25).await.unwrap_err();
    assert!(matches!(err, KioskError::LimitExceeded { requested: 25, limit: 20, .. }));

    let updated = kiosk.catalog.set_stock(b.id, ML60, 20).await.unwrap();
    assert_eq!(updated.stock.get(ML60), 20);
}

#[tokio::test]
async fn test_defaults_clamped_to_ceiling() {
    let harness = TestKiosk::new();
    let product = harness.kiosk.catalog.create(ProductBuilder::new("Defaults").build()).await.unwrap();

    assert_eq!(product.stock.get(Variant::Spray), 100);
    for size in BottleSize::ALL {
        assert_eq!(product.stock.get(Variant::Bottle(size)), 20);
    }
}

/// Stock cannot be set below what slots hold.
#[tokio::test]
async fn test_set_stock_below_reserved_rejected() {
    let harness = TestKiosk::new();
    let kiosk = &harness.kiosk;
    let b = kiosk.catalog.create(ProductBuilder::new("B").ml30(6).build()).await.unwrap();
    kiosk.slots.assign_bottle(b.id, 1, BottleSize::Ml30, 0, 4).await.unwrap();

    let err = kiosk.catalog.set_stock(b.id, ML30, 3).await.unwrap_err();
    assert!(matches!(err, KioskError::BelowReserved { reserved: 4, requested: 3, .. }));

    let patch = ProductPatch { stock: StockDraft { ml30: Some(2), ..StockDraft::default() }, ..ProductPatch::default() };
    assert!(matches!(kiosk.catalog.update(b.id, patch).await, Err(KioskError::BelowReserved { .. })));

    assert_eq!(kiosk.catalog.get(b.id).await.unwrap().stock.get(ML30), 6);
    kiosk.catalog.set_stock(b.id, ML30, 4).await.unwrap();
    check_invariants(kiosk.store()).await.unwrap();
}

/// Patches merge shallowly and leave unspecified fields alone.
#[tokio::test]
async fn test_update_is_shallow_merge() {
    let harness = TestKiosk::new();
    let kiosk = &harness.kiosk;
    let b = kiosk.catalog.create(ProductBuilder::new("Before").ml30(2).build()).await.unwrap();

    let patch = ProductPatch {
        name: Some("After".to_string()),
        available: Some(false),
        ..ProductPatch::default()
    };
    let updated = kiosk.catalog.update(b.id, patch).await.unwrap();

    assert_eq!(updated.name, "After");
    assert!(!updated.available);
    assert_eq!(updated.description, b.description);
    assert_eq!(updated.stock, b.stock);
    assert!(kiosk.catalog.list_available().await.unwrap().is_empty());
    assert_eq!(kiosk.catalog.list_all().await.unwrap().len(), 1);
}

/// A spray slot holds one product; a newcomer displaces the previous one.
#[tokio::test]
async fn test_spray_slot_single_occupant() {
    let harness = TestKiosk::new();
    let kiosk = &harness.kiosk;
    let a = kiosk.catalog.create(ProductBuilder::new("A").build()).await.unwrap();
    let b = kiosk.catalog.create(ProductBuilder::new("B").build()).await.unwrap();

    kiosk.slots.assign_spray(a.id, 4, 0).await.unwrap();
    kiosk.slots.assign_spray(b.id, 4, 0).await.unwrap();

    let rows = kiosk.slots.assignments_for_slot(Slot::spray(4).unwrap()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product_id, b.id);
    assert_eq!(kiosk.catalog.get(a.id).await.unwrap().spray_slot, None);
    assert_eq!(kiosk.catalog.get(b.id).await.unwrap().spray_slot, Some(Slot::spray(4).unwrap()));
}

/// A bottle slot holds several products side by side.
#[tokio::test]
async fn test_bottle_slot_holds_several_products() {
    let harness = TestKiosk::new();
    let kiosk = &harness.kiosk;
    let a = kiosk.catalog.create(ProductBuilder::new("A").ml30(3).build()).await.unwrap();
    let b = kiosk.catalog.create(ProductBuilder::new("B").ml60(3).build()).await.unwrap();

    kiosk.slots.assign_bottle(a.id, 5, BottleSize::Ml30, 1, 3).await.unwrap();
    kiosk.slots.assign_bottle(b.id, 5, BottleSize::Ml60, 0, 2).await.unwrap();

    let slot = Slot::bottle(5).unwrap();
    let rows = kiosk.slots.assignments_for_slot(slot).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].product_id, b.id, "lower priority value first");

    assert!(kiosk.slots.remove_assignment(a.id, slot, Some(BottleSize::Ml60)).await.is_ok_and(|removed| !removed));
    assert!(kiosk.slots.remove_assignment(a.id, slot, Some(BottleSize::Ml30)).await.unwrap());
    assert_eq!(kiosk.slots.assignments_for_slot(slot).await.unwrap().len(), 1);
    assert_eq!(kiosk.catalog.get(a.id).await.unwrap().stock.get(ML30), 3, "stock untouched");

    assert_eq!(kiosk.slots.clear_slot(slot).await.unwrap(), 1);
    assert!(kiosk.slots.assignments_for_product(b.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_assignment_validation() {
    let harness = TestKiosk::new();
    let kiosk = &harness.kiosk;
    let a = kiosk.catalog.create(ProductBuilder::new("A").build()).await.unwrap();

    assert!(matches!(
        kiosk.slots.assign_spray(a.id, 6, 0).await,
        Err(KioskError::InvalidSlot { kind: SlotKind::Spray, number: 6 })
    ));
    assert!(matches!(
        kiosk.slots.assign_bottle(a.id, 16, BottleSize::Ml30, 0, 1).await,
        Err(KioskError::InvalidSlot { kind: SlotKind::Bottle, number: 16 })
    ));
    assert!(matches!(
        kiosk.slots.assign_bottle(a.id, 1, BottleSize::Ml30, 0, 21).await,
        Err(KioskError::InvalidQuantity { quantity: 21, max: 20 })
    ));
    assert!(matches!(
        kiosk.slots.assign_bottle(ProductId::new(99), 1, BottleSize::Ml30, 0, 1).await,
        Err(KioskError::ProductNotFound(_))
    ));
}

#[tokio::test]
async fn test_slot_map_lists_every_slot() {
    let harness = TestKiosk::new();
    let kiosk = &harness.kiosk;
    let a = kiosk.catalog.create(ProductBuilder::new("A").build()).await.unwrap();
    kiosk.slots.assign_bottle(a.id, 15, BottleSize::Ml100, 0, 1).await.unwrap();

    let map = kiosk.slots.slot_map().await.unwrap();

    assert_eq!(map.spray.len(), 5);
    assert_eq!(map.bottle.len(), 15);
    assert_eq!(map.bottle[14].assignments.len(), 1);
    assert!(map.spray.iter().all(|entry| entry.assignments.is_empty()));
}

#[tokio::test]
async fn test_delete_product_removes_assignments() {
    let harness = TestKiosk::new();
    let kiosk = &harness.kiosk;
    let a = kiosk.catalog.create(ProductBuilder::new("A").build()).await.unwrap();
    kiosk.slots.assign_spray(a.id, 1, 0).await.unwrap();

    assert!(kiosk.catalog.delete(a.id).await.unwrap());
    assert!(matches!(kiosk.catalog.get(a.id).await, Err(KioskError::ProductNotFound(_))));
    assert!(kiosk.slots.slot_map().await.unwrap().spray[0].assignments.is_empty());
}
