//! Property tests: random workloads never break the stock invariants.

#![allow(clippy::unwrap_used)]

use kiosk_core::providers::{OrderStore, ProductStore};
use kiosk_core::{Money, NewOrder, OrderStatus, OrderTransition, PaymentMethod, Variant};
use kiosk_runtime::InMemoryStore;
use kiosk_testing::assertions::check_invariants;
use kiosk_testing::properties::{StoreOp, apply_op, arb_store_op, arb_terminal_status};
use kiosk_testing::{ProductBuilder, test_time};
use proptest::prelude::*;

fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    tokio_test::block_on(async {
        for name in ["A", "B", "C"] {
            store
                .insert_product(ProductBuilder::new(name).spray(3).ml30(4).ml60(4).ml100(4).build(), test_time())
                .await
                .unwrap();
        }
    });
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Stock stays within 0..=20 and reservations never exceed stock.
    #[test]
    fn prop_random_workload_keeps_invariants(ops in prop::collection::vec(arb_store_op(), 1..60)) {
        let store = seeded_store();
        tokio_test::block_on(async {
            for op in &ops {
                apply_op(&store, op, test_time()).await;
                let checked = check_invariants(&store).await;
                prop_assert!(checked.is_ok(), "{:?} after {:?}", checked, op);
            }
            Ok(())
        })?;
    }

    /// A decrement either removes exactly `amount` units or changes nothing.
    #[test]
    fn prop_decrement_is_all_or_nothing(ops in prop::collection::vec(arb_store_op(), 1..40)) {
        let store = seeded_store();
        tokio_test::block_on(async {
            for op in &ops {
                let StoreOp::Decrement { product, variant, amount } = *op else {
                    apply_op(&store, op, test_time()).await;
                    continue;
                };
                let id = kiosk_core::ProductId::new(product);
                let before = store.get_product(id).await.unwrap().stock.get(variant);
                let accepted = apply_op(&store, op, test_time()).await;
                let after = store.get_product(id).await.unwrap().stock.get(variant);

                if accepted {
                    prop_assert_eq!(after, before - amount);
                } else {
                    prop_assert_eq!(after, before);
                    prop_assert!(before < amount);
                }
            }
            Ok(())
        })?;
    }

    /// However many times an order is settled, it is applied at most once.
    #[test]
    fn prop_transition_applied_at_most_once(targets in prop::collection::vec(arb_terminal_status(), 1..10)) {
        let store = InMemoryStore::new();
        tokio_test::block_on(async {
            let order = store
                .insert_order(
                    NewOrder { lines: Vec::new(), payment_method: PaymentMethod::Card, amount: Money::from_minor(1) },
                    test_time(),
                )
                .await
                .unwrap();

            let mut applied = 0;
            for to in &targets {
                if let Ok(OrderTransition::Applied(_)) = store.transition_order(order.id, *to, test_time()).await {
                    applied += 1;
                }
            }
            prop_assert_eq!(applied, 1);

            let settled = store.get_order(order.id).await.unwrap();
            prop_assert_eq!(settled.status, targets[0]);
            prop_assert_ne!(settled.status, OrderStatus::Pending);
            Ok(())
        })?;
    }
}

#[test]
fn test_seeded_store_starts_valid() {
    let store = seeded_store();
    tokio_test::block_on(async {
        check_invariants(&store).await.unwrap();
        let products = store.list_products().await.unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].stock.get(Variant::Spray), 3);
    });
}
