//! In-memory implementation of every storage trait.
//!
//! All tables live behind one `std::sync::Mutex`, so each trait call is a
//! single critical section: rule checks and writes never interleave with
//! another call. The guard is never held across an `.await`.

use kiosk_core::allocation;
use kiosk_core::providers::{OrderStore, ProductStore, SessionStore, SlotStore, StockDecrement, UsageStore};
use kiosk_core::{
    AdminSession, AssignmentId, BottleSize, KioskError, NewAssignment, NewOrder, NewProduct, Order, OrderId,
    OrderStatus, OrderTransition, Product, ProductId, ProductPatch, Result, SessionToken, Slot, SlotAssignment,
    SlotUsage, Variant,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    assignments: Vec<SlotAssignment>,
    orders: BTreeMap<OrderId, Order>,
    sessions: HashMap<SessionToken, AdminSession>,
    usage: BTreeMap<Slot, SlotUsage>,
    product_seq: u64,
    order_seq: u64,
    assignment_seq: u64,
}

impl Tables {
    fn product(&self, id: ProductId) -> Result<&Product> {
        self.products.get(&id).ok_or(KioskError::ProductNotFound(id))
    }

    /// Clears `product_id`'s back-reference to `slot` once it has no row there.
    fn release_if_vacated(&mut self, product_id: ProductId, slot: Slot) {
        let still_there = self
            .assignments
            .iter()
            .any(|a| a.product_id == product_id && a.slot == slot);
        if still_there {
            return;
        }
        if let Some(product) = self.products.get_mut(&product_id) {
            product.release_slot(slot);
        }
    }

    fn sorted_assignments(&self, keep: impl Fn(&SlotAssignment) -> bool) -> Vec<SlotAssignment> {
        let mut rows: Vec<SlotAssignment> = self.assignments.iter().filter(|a| keep(a)).cloned().collect();
        rows.sort_by_key(|a| (a.slot, a.priority, a.id));
        rows
    }
}

const fn next(seq: &mut u64) -> u64 {
    *seq += 1;
    *seq
}

/// In-memory kiosk store.
///
/// Cheap to clone; clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut guard = lock(&self.tables)?;
        f(&mut guard)
    }
}

fn lock(tables: &Mutex<Tables>) -> Result<MutexGuard<'_, Tables>> {
    tables
        .lock()
        .map_err(|_| KioskError::Storage("Mutex lock failed".to_string()))
}

// ═══════════════════════════════════════════════════════════
// Products
// ═══════════════════════════════════════════════════════════

impl ProductStore for InMemoryStore {
    fn get_product(&self, id: ProductId) -> impl Future<Output = Result<Product>> + Send {
        let result = self.with_tables(|t| t.product(id).cloned());
        async move { result }
    }

    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>>> + Send {
        let result = self.with_tables(|t| Ok(t.products.values().cloned().collect()));
        async move { result }
    }

    fn insert_product(
        &self,
        product: NewProduct,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Product>> + Send {
        let result = self.with_tables(|t| {
            // Validate before consuming an id
            product.stock.resolve()?;
            let id = ProductId::new(next(&mut t.product_seq));
            let product = product.into_product(id, now)?;
            t.products.insert(id, product.clone());
            Ok(product)
        });
        async move { result }
    }

    fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> impl Future<Output = Result<Product>> + Send {
        let result = self.with_tables(|t| {
            let mut updated = t.product(id)?.clone();
            for (variant, quantity) in patch.stock.provided() {
                allocation::check_stock_change(id, variant, quantity, &t.assignments)?;
                updated.stock.set(variant, quantity)?;
            }
            patch.apply_fields(&mut updated)?;
            t.products.insert(id, updated.clone());
            Ok(updated)
        });
        async move { result }
    }

    fn delete_product(&self, id: ProductId) -> impl Future<Output = Result<bool>> + Send {
        let result = self.with_tables(|t| {
            let existed = t.products.remove(&id).is_some();
            t.assignments.retain(|a| a.product_id != id);
            Ok(existed)
        });
        async move { result }
    }

    fn set_stock(
        &self,
        id: ProductId,
        variant: Variant,
        quantity: u32,
    ) -> impl Future<Output = Result<Product>> + Send {
        let result = self.with_tables(|t| {
            t.product(id)?;
            allocation::check_stock_change(id, variant, quantity, &t.assignments)?;
            let product = t.products.get_mut(&id).ok_or(KioskError::ProductNotFound(id))?;
            product.stock.set(variant, quantity)?;
            Ok(product.clone())
        });
        async move { result }
    }

    fn decrement_stock(
        &self,
        id: ProductId,
        variant: Variant,
        amount: u32,
    ) -> impl Future<Output = Result<StockDecrement>> + Send {
        let result = self.with_tables(|t| {
            let product = t.products.get_mut(&id).ok_or(KioskError::ProductNotFound(id))?;
            product.stock.decrement(id, variant, amount)?;

            let drawn_from = allocation::draw_units(&mut t.assignments, id, variant, amount);
            for slot in &drawn_from {
                t.release_if_vacated(id, *slot);
            }

            Ok(StockDecrement {
                product: t.product(id)?.clone(),
                drawn_from,
            })
        });
        async move { result }
    }
}

// ═══════════════════════════════════════════════════════════
// Slot Assignments
// ═══════════════════════════════════════════════════════════

impl SlotStore for InMemoryStore {
    fn assign(
        &self,
        request: NewAssignment,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<SlotAssignment>> + Send {
        let result = self.with_tables(|t| {
            let product_id = request.product_id();
            let slot = request.slot();
            let variant = request.variant();

            allocation::check_assignment(&t.product(product_id)?.stock, &t.assignments, &request)?;

            let displaced: Vec<ProductId> = t
                .assignments
                .iter()
                .filter(|a| a.slot == slot)
                .filter(|a| variant == Variant::Spray || a.holds(product_id, variant))
                .map(|a| a.product_id)
                .collect();
            t.assignments
                .retain(|a| !(a.slot == slot && (variant == Variant::Spray || a.holds(product_id, variant))));
            for previous in displaced {
                t.release_if_vacated(previous, slot);
            }

            let row = request.into_assignment(AssignmentId::new(next(&mut t.assignment_seq)), now);
            t.assignments.push(row.clone());
            if let Some(product) = t.products.get_mut(&product_id) {
                product.claim_slot(slot, variant);
            }
            Ok(row)
        });
        async move { result }
    }

    fn available_quantity(
        &self,
        product_id: ProductId,
        bottle_size: BottleSize,
        excluding: Option<Slot>,
    ) -> impl Future<Output = Result<u32>> + Send {
        let result = self.with_tables(|t| {
            let stock = t.product(product_id)?.stock.get(Variant::Bottle(bottle_size));
            Ok(allocation::available_quantity(
                stock,
                &t.assignments,
                product_id,
                bottle_size,
                excluding,
            ))
        });
        async move { result }
    }

    fn clear_slot(&self, slot: Slot) -> impl Future<Output = Result<usize>> + Send {
        let result = self.with_tables(|t| {
            let removed: Vec<ProductId> = t
                .assignments
                .iter()
                .filter(|a| a.slot == slot)
                .map(|a| a.product_id)
                .collect();
            t.assignments.retain(|a| a.slot != slot);
            for product_id in &removed {
                t.release_if_vacated(*product_id, slot);
            }
            Ok(removed.len())
        });
        async move { result }
    }

    fn remove_assignment(
        &self,
        product_id: ProductId,
        slot: Slot,
        bottle_size: Option<BottleSize>,
    ) -> impl Future<Output = Result<bool>> + Send {
        let result = self.with_tables(|t| {
            let position = t.assignments.iter().position(|a| {
                a.product_id == product_id
                    && a.slot == slot
                    && bottle_size.is_none_or(|size| a.variant == Variant::Bottle(size))
            });
            let Some(position) = position else {
                return Ok(false);
            };
            t.assignments.remove(position);
            t.release_if_vacated(product_id, slot);
            Ok(true)
        });
        async move { result }
    }

    fn assignments_for_slot(
        &self,
        slot: Slot,
    ) -> impl Future<Output = Result<Vec<SlotAssignment>>> + Send {
        let result = self.with_tables(|t| Ok(t.sorted_assignments(|a| a.slot == slot)));
        async move { result }
    }

    fn assignments_for_product(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Vec<SlotAssignment>>> + Send {
        let result = self.with_tables(|t| Ok(t.sorted_assignments(|a| a.product_id == product_id)));
        async move { result }
    }

    fn all_assignments(&self) -> impl Future<Output = Result<Vec<SlotAssignment>>> + Send {
        let result = self.with_tables(|t| Ok(t.sorted_assignments(|_| true)));
        async move { result }
    }
}

// ═══════════════════════════════════════════════════════════
// Orders
// ═══════════════════════════════════════════════════════════

impl OrderStore for InMemoryStore {
    fn insert_order(
        &self,
        order: NewOrder,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Order>> + Send {
        let result = self.with_tables(|t| {
            let id = OrderId::new(next(&mut t.order_seq));
            let order = order.into_order(id, now);
            t.orders.insert(id, order.clone());
            Ok(order)
        });
        async move { result }
    }

    fn get_order(&self, id: OrderId) -> impl Future<Output = Result<Order>> + Send {
        let result = self.with_tables(|t| t.orders.get(&id).cloned().ok_or(KioskError::OrderNotFound(id)));
        async move { result }
    }

    fn list_orders(&self) -> impl Future<Output = Result<Vec<Order>>> + Send {
        let result = self.with_tables(|t| Ok(t.orders.values().cloned().collect()));
        async move { result }
    }

    fn transition_order(
        &self,
        id: OrderId,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<OrderTransition>> + Send {
        let result = self.with_tables(|t| {
            let order = t.orders.get_mut(&id).ok_or(KioskError::OrderNotFound(id))?;
            match order.status {
                OrderStatus::Pending if to.is_terminal() => {
                    order.status = to;
                    order.settled_at = Some(now);
                    Ok(OrderTransition::Applied(order.clone()))
                }
                current if current == to && to.is_terminal() => Ok(OrderTransition::Unchanged(order.clone())),
                current => Err(KioskError::InvalidTransition { order_id: id, from: current, to }),
            }
        });
        async move { result }
    }
}

// ═══════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════

impl SessionStore for InMemoryStore {
    fn insert_session(&self, session: AdminSession) -> impl Future<Output = Result<()>> + Send {
        let result = self.with_tables(|t| {
            if t.sessions.contains_key(&session.token) {
                return Err(KioskError::Storage("Session token already exists".to_string()));
            }
            t.sessions.insert(session.token, session);
            Ok(())
        });
        async move { result }
    }

    fn get_session(
        &self,
        token: SessionToken,
    ) -> impl Future<Output = Result<Option<AdminSession>>> + Send {
        let result = self.with_tables(|t| Ok(t.sessions.get(&token).copied()));
        async move { result }
    }

    fn delete_session(&self, token: SessionToken) -> impl Future<Output = Result<bool>> + Send {
        let result = self.with_tables(|t| Ok(t.sessions.remove(&token).is_some()));
        async move { result }
    }

    fn delete_expired_sessions(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<usize>> + Send {
        let result = self.with_tables(|t| {
            let before = t.sessions.len();
            t.sessions.retain(|_, session| !session.is_expired(now));
            Ok(before - t.sessions.len())
        });
        async move { result }
    }
}

// ═══════════════════════════════════════════════════════════
// Usage
// ═══════════════════════════════════════════════════════════

impl UsageStore for InMemoryStore {
    fn record_usage(
        &self,
        slot: Slot,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<SlotUsage>> + Send {
        let result = self.with_tables(|t| {
            let usage = t.usage.entry(slot).or_insert_with(|| SlotUsage::unused(slot));
            usage.record(product_id, now);
            Ok(*usage)
        });
        async move { result }
    }

    fn usage_records(&self) -> impl Future<Output = Result<Vec<SlotUsage>>> + Send {
        let result = self.with_tables(|t| Ok(t.usage.values().copied().collect()));
        async move { result }
    }
}
