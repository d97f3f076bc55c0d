// In-memory reference store used by unit and property tests
//
// Mirrors the transactional semantics of the Postgres implementations:
// every trait method that is one transaction in Postgres mutates the
// locked state as one unit here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::domain::entities::{Order, Product, Reservation, SkuInventory, UserPurchase};
use crate::domain::repositories::{
    AllocationReceipt, AllocationStore, CheckoutRecord, CheckoutRepository, ConfirmCheckout,
    ExpiryOutcome, InventoryRepository, ProductRepository, ReservationRepository,
    UserPurchaseRepository,
};
use crate::domain::value_objects::{IdempotencyKey, ReservationId, ReservationStatus, Sku};
use crate::ReservationError;

/// True when the status occupies the user's one-per-(user, sku) slot:
/// a live hold or a completed purchase.
fn holds_user_slot(status: ReservationStatus) -> bool {
    matches!(
        status,
        ReservationStatus::Reserved | ReservationStatus::Confirmed
    )
}

#[derive(Default)]
struct StoreState {
    products: HashMap<String, Product>,
    inventory: HashMap<String, SkuInventory>,
    reservations: HashMap<Uuid, Reservation>,
    orders: HashMap<Uuid, Order>,
    purchases: HashMap<(Uuid, String), UserPurchase>,
}

/// Reference store with the same observable behavior as the Postgres
/// repositories.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    /// Conditional inventory updates attempted by try_allocate
    pub allocation_attempts: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a sale: product row plus inventory row with a fixed total.
    pub fn arm_sale(&self, sku: &str, total: i64) {
        let now = Utc::now();
        let sku_vo = Sku::from_string(sku.to_string());
        let product = Product::reconstitute(
            sku_vo.clone(),
            format!("Product {sku}"),
            "flash-sale".to_string(),
            dec!(100.00),
            dec!(59.99),
            total,
            true,
            Uuid::nil(),
            now,
            now,
        );
        let mut state = self.state.lock().unwrap();
        state.products.insert(sku.to_string(), product);
        state
            .inventory
            .insert(sku.to_string(), SkuInventory::new(sku_vo, total));
    }

    /// Seeds a reservation row; an active hold also claims its unit so
    /// the counters stay consistent with what the allocator would have
    /// committed.
    pub fn insert_reservation(&self, reservation: Reservation) {
        let mut state = self.state.lock().unwrap();
        if reservation.is_active() {
            if let Some(inventory) = state.inventory.get_mut(reservation.sku().as_str()) {
                inventory
                    .reserve(1)
                    .expect("seeded reservation exceeds armed inventory");
            }
        }
        state
            .reservations
            .insert(reservation.id().into_uuid(), reservation);
    }

    pub fn reservation_count(&self) -> usize {
        self.state.lock().unwrap().reservations.len()
    }

    pub fn reservations_with_status(&self, status: ReservationStatus) -> Vec<Reservation> {
        self.state
            .lock()
            .unwrap()
            .reservations
            .values()
            .filter(|r| r.status() == status)
            .cloned()
            .collect()
    }

    pub fn inventory_snapshot(&self, sku: &str) -> Option<SkuInventory> {
        self.state.lock().unwrap().inventory.get(sku).cloned()
    }

    pub fn allocation_attempts(&self) -> usize {
        self.allocation_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<Product>, ReservationError> {
        Ok(self.state.lock().unwrap().products.get(sku.as_str()).cloned())
    }
}

#[async_trait]
impl InventoryRepository for InMemoryStore {
    async fn find_by_sku(&self, sku: &Sku) -> Result<Option<SkuInventory>, ReservationError> {
        Ok(self.state.lock().unwrap().inventory.get(sku.as_str()).cloned())
    }
}

#[async_trait]
impl AllocationStore for InMemoryStore {
    async fn try_allocate(
        &self,
        sku: &Sku,
        drafts: &[Reservation],
    ) -> Result<Option<AllocationReceipt>, ReservationError> {
        self.allocation_attempts.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();

        let units = drafts.len() as i64;
        let available = state
            .inventory
            .get(sku.as_str())
            .ok_or_else(|| ReservationError::InventoryNotFound(sku.as_str().to_string()))?
            .available();
        if available < units {
            // Guard failed; the transaction rolls back untouched.
            return Ok(None);
        }

        let mut allocated = Vec::new();
        let mut duplicates = Vec::new();
        for draft in drafts {
            let key = draft.idempotency_key();
            let conflict = state
                .reservations
                .values()
                .any(|r| r.idempotency_key() == key)
                || state.reservations.values().any(|r| {
                    r.user_id() == draft.user_id()
                        && r.sku() == draft.sku()
                        && holds_user_slot(r.status())
                });
            if conflict {
                duplicates.push(draft.clone());
            } else {
                state
                    .reservations
                    .insert(draft.id().into_uuid(), draft.clone());
                allocated.push(draft.clone());
            }
        }

        // Net inventory effect: only units with inserted rows stay held.
        let held = allocated.len() as i64;
        if held > 0 {
            let inventory = state
                .inventory
                .get_mut(sku.as_str())
                .ok_or_else(|| ReservationError::InventoryNotFound(sku.as_str().to_string()))?;
            inventory.reserve(held)?;
        }

        Ok(Some(AllocationReceipt {
            allocated,
            duplicates,
        }))
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<Reservation>, ReservationError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .reservations
            .get(&id.into_uuid())
            .cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        key: IdempotencyKey,
    ) -> Result<Option<Reservation>, ReservationError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .reservations
            .values()
            .find(|r| r.idempotency_key() == key)
            .cloned())
    }

    async fn find_active_for_user(
        &self,
        user_id: Uuid,
        sku: &Sku,
    ) -> Result<Option<Reservation>, ReservationError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .reservations
            .values()
            .find(|r| r.user_id() == user_id && r.sku() == sku && holds_user_slot(r.status()))
            .cloned())
    }

    async fn find_expired(&self, limit: i64) -> Result<Vec<Reservation>, ReservationError> {
        let now = Utc::now();
        let mut rows: Vec<Reservation> = self
            .state
            .lock()
            .unwrap()
            .reservations
            .values()
            .filter(|r| r.is_past_deadline(now))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.expires_at());
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn expire(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<ExpiryOutcome, ReservationError> {
        let mut state = self.state.lock().unwrap();
        let Some(reservation) = state.reservations.get(&id.into_uuid()).cloned() else {
            return Ok(ExpiryOutcome::AlreadyTerminal);
        };
        if reservation.status() != ReservationStatus::Reserved {
            return Ok(ExpiryOutcome::AlreadyTerminal);
        }
        let mut updated = reservation;
        updated.expire(now)?;
        let sku = updated.sku().as_str().to_string();
        state
            .reservations
            .insert(id.into_uuid(), updated.clone());
        if let Some(inventory) = state.inventory.get_mut(&sku) {
            // Guarded like the SQL update: a zero counter is tolerated.
            let _ = inventory.release(1);
        }
        Ok(ExpiryOutcome::Expired(updated))
    }

    async fn cancel(
        &self,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ReservationError> {
        let mut state = self.state.lock().unwrap();
        let Some(reservation) = state.reservations.get(&id.into_uuid()).cloned() else {
            return Err(ReservationError::ReservationNotFound(id.into_uuid()));
        };
        let mut updated = reservation;
        updated.cancel(now)?;
        let sku = updated.sku().as_str().to_string();
        state
            .reservations
            .insert(id.into_uuid(), updated.clone());
        if let Some(inventory) = state.inventory.get_mut(&sku) {
            let _ = inventory.release(1);
        }
        Ok(updated)
    }
}

#[async_trait]
impl CheckoutRepository for InMemoryStore {
    async fn confirm(
        &self,
        checkout: &ConfirmCheckout,
    ) -> Result<CheckoutRecord, ReservationError> {
        let mut state = self.state.lock().unwrap();
        let id = checkout.reservation_id.into_uuid();
        let Some(reservation) = state.reservations.get(&id).cloned() else {
            return Err(ReservationError::ReservationNotFound(id));
        };

        // All checks up front; nothing mutates unless the whole unit can.
        let mut confirmed = reservation;
        confirmed.confirm(checkout.now)?;

        let sku = confirmed.sku().clone();
        let purchase_key = (confirmed.user_id(), sku.as_str().to_string());
        if state.purchases.contains_key(&purchase_key) {
            return Err(ReservationError::UserAlreadyPurchased);
        }

        let inventory = state
            .inventory
            .get_mut(sku.as_str())
            .ok_or_else(|| ReservationError::InventoryNotFound(sku.as_str().to_string()))?;
        inventory.commit_sale()?;

        let order = Order::create(
            confirmed.id(),
            confirmed.user_id(),
            sku.clone(),
            checkout.payment_transaction_id.clone(),
            checkout.payment_method.clone(),
            checkout.shipping_address.clone(),
            checkout.now,
        );
        let purchase = UserPurchase::new(
            confirmed.user_id(),
            sku,
            order.id(),
            confirmed.id(),
            checkout.now,
        );

        state.reservations.insert(id, confirmed.clone());
        state.orders.insert(order.id().into_uuid(), order.clone());
        state.purchases.insert(purchase_key, purchase);

        Ok(CheckoutRecord {
            reservation: confirmed,
            order,
        })
    }

    async fn find_order_by_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Option<Order>, ReservationError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .orders
            .values()
            .find(|o| o.reservation_id() == reservation_id)
            .cloned())
    }
}

#[async_trait]
impl UserPurchaseRepository for InMemoryStore {
    async fn exists(&self, user_id: Uuid, sku: &Sku) -> Result<bool, ReservationError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .purchases
            .contains_key(&(user_id, sku.as_str().to_string())))
    }

    async fn find(
        &self,
        user_id: Uuid,
        sku: &Sku,
    ) -> Result<Option<UserPurchase>, ReservationError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .purchases
            .get(&(user_id, sku.as_str().to_string()))
            .cloned())
    }
}

/// A failing allocation store used to exercise batch-abort paths.
pub(crate) struct FailingAllocationStore;

#[async_trait]
impl AllocationStore for FailingAllocationStore {
    async fn try_allocate(
        &self,
        _sku: &Sku,
        _drafts: &[Reservation],
    ) -> Result<Option<AllocationReceipt>, ReservationError> {
        Err(ReservationError::TemporarilyUnavailable(
            "simulated commit failure".to_string(),
        ))
    }
}
