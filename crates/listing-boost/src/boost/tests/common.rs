use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::boost::domain::{
    BoostOrder, BoostPlan, Listing, ListingApproval, ListingId, OrderId, PlanId,
};
use crate::boost::repository::{
    BoostOrderRepository, InvoiceDraft, InvoiceEmitter, InvoiceError, ListingStore, PlanCatalog,
    StoreError,
};
use crate::boost::service::BoostService;

pub(super) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn days(count: i64) -> chrono::Duration {
    chrono::Duration::days(count)
}

pub(super) fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub(super) fn basic_plan() -> BoostPlan {
    BoostPlan {
        id: PlanId("plan-basic".to_string()),
        name: "Basic".to_string(),
        duration_days: 7,
        price: 500,
    }
}

pub(super) fn standard_plan() -> BoostPlan {
    BoostPlan {
        id: PlanId("plan-standard".to_string()),
        name: "Standard".to_string(),
        duration_days: 14,
        price: 900,
    }
}

pub(super) fn premium_plan() -> BoostPlan {
    BoostPlan {
        id: PlanId("plan-premium".to_string()),
        name: "Premium".to_string(),
        duration_days: 30,
        price: 1500,
    }
}

pub(super) fn listing(id: &str) -> Listing {
    Listing {
        id: ListingId(id.to_string()),
        title: format!("Two-bedroom apartment {id}"),
        price: 215_000,
        approval: ListingApproval::Approved,
        owner_id: "user-7".to_string(),
    }
}

pub(super) fn listings(count: usize) -> Vec<Listing> {
    (1..=count).map(|n| listing(&format!("lst-{n:03}"))).collect()
}

#[derive(Default, Clone)]
pub(super) struct MemoryListings {
    records: Arc<Mutex<HashMap<ListingId, Listing>>>,
}

impl MemoryListings {
    pub(super) fn with(listings: Vec<Listing>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.records.lock().expect("listing mutex poisoned");
            for listing in listings {
                guard.insert(listing.id.clone(), listing);
            }
        }
        store
    }

    pub(super) fn contains(&self, id: &ListingId) -> bool {
        self.records
            .lock()
            .expect("listing mutex poisoned")
            .contains_key(id)
    }
}

impl ListingStore for MemoryListings {
    fn get(&self, id: &ListingId) -> Result<Option<Listing>, StoreError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_approved(&self) -> Result<Vec<Listing>, StoreError> {
        let guard = self.records.lock().expect("listing mutex poisoned");
        let mut approved: Vec<Listing> = guard
            .values()
            .filter(|listing| listing.approval == ListingApproval::Approved)
            .cloned()
            .collect();
        approved.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(approved)
    }

    fn delete(&self, id: &ListingId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("listing mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryPlans {
    records: Arc<Mutex<HashMap<PlanId, BoostPlan>>>,
}

impl MemoryPlans {
    pub(super) fn with(plans: Vec<BoostPlan>) -> Self {
        let catalog = Self::default();
        {
            let mut guard = catalog.records.lock().expect("plan mutex poisoned");
            for plan in plans {
                guard.insert(plan.id.clone(), plan);
            }
        }
        catalog
    }

    pub(super) fn standard_tiers() -> Self {
        Self::with(vec![basic_plan(), standard_plan(), premium_plan()])
    }
}

impl PlanCatalog for MemoryPlans {
    fn get(&self, id: &PlanId) -> Result<Option<BoostPlan>, StoreError> {
        let guard = self.records.lock().expect("plan mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<BoostPlan>, StoreError> {
        let guard = self.records.lock().expect("plan mutex poisoned");
        let mut plans: Vec<BoostPlan> = guard.values().cloned().collect();
        plans.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(plans)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryOrders {
    records: Arc<Mutex<HashMap<OrderId, BoostOrder>>>,
}

impl MemoryOrders {
    pub(super) fn snapshot(&self, id: &OrderId) -> Option<BoostOrder> {
        self.records
            .lock()
            .expect("order mutex poisoned")
            .get(id)
            .cloned()
    }

    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("order mutex poisoned").len()
    }
}

impl BoostOrderRepository for MemoryOrders {
    fn insert(&self, order: BoostOrder) -> Result<BoostOrder, StoreError> {
        let mut guard = self.records.lock().expect("order mutex poisoned");
        if guard.contains_key(&order.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    fn update(&self, order: BoostOrder) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("order mutex poisoned");
        if guard.contains_key(&order.id) {
            guard.insert(order.id.clone(), order);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn fetch(&self, id: &OrderId) -> Result<Option<BoostOrder>, StoreError> {
        let guard = self.records.lock().expect("order mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_listing(&self, listing: &ListingId) -> Result<Vec<BoostOrder>, StoreError> {
        let guard = self.records.lock().expect("order mutex poisoned");
        Ok(guard
            .values()
            .filter(|order| &order.listing_id == listing)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<BoostOrder>, StoreError> {
        let guard = self.records.lock().expect("order mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn delete(&self, id: &OrderId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("order mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn delete_for_listing(&self, listing: &ListingId) -> Result<usize, StoreError> {
        let mut guard = self.records.lock().expect("order mutex poisoned");
        let ids: Vec<OrderId> = guard
            .values()
            .filter(|order| &order.listing_id == listing)
            .map(|order| order.id.clone())
            .collect();
        for id in &ids {
            guard.remove(id);
        }
        Ok(ids.len())
    }
}

#[derive(Default, Clone)]
pub(super) struct RecordingInvoices {
    drafts: Arc<Mutex<Vec<InvoiceDraft>>>,
}

impl RecordingInvoices {
    pub(super) fn drafts(&self) -> Vec<InvoiceDraft> {
        self.drafts.lock().expect("invoice mutex poisoned").clone()
    }
}

impl InvoiceEmitter for RecordingInvoices {
    fn emit(&self, draft: InvoiceDraft) -> Result<(), InvoiceError> {
        self.drafts
            .lock()
            .expect("invoice mutex poisoned")
            .push(draft);
        Ok(())
    }
}

/// Emitter that always fails, for asserting the swallow-and-log policy.
#[derive(Default, Clone)]
pub(super) struct FailingInvoices;

impl InvoiceEmitter for FailingInvoices {
    fn emit(&self, _draft: InvoiceDraft) -> Result<(), InvoiceError> {
        Err(InvoiceError::Transport("billing offline".to_string()))
    }
}

/// Order repository whose bulk delete fails, for cascade fail-soft tests.
#[derive(Default, Clone)]
pub(super) struct StuckOrders {
    pub(super) inner: MemoryOrders,
}

impl BoostOrderRepository for StuckOrders {
    fn insert(&self, order: BoostOrder) -> Result<BoostOrder, StoreError> {
        self.inner.insert(order)
    }

    fn update(&self, order: BoostOrder) -> Result<(), StoreError> {
        self.inner.update(order)
    }

    fn fetch(&self, id: &OrderId) -> Result<Option<BoostOrder>, StoreError> {
        self.inner.fetch(id)
    }

    fn for_listing(&self, listing: &ListingId) -> Result<Vec<BoostOrder>, StoreError> {
        self.inner.for_listing(listing)
    }

    fn all(&self) -> Result<Vec<BoostOrder>, StoreError> {
        self.inner.all()
    }

    fn delete(&self, id: &OrderId) -> Result<(), StoreError> {
        self.inner.delete(id)
    }

    fn delete_for_listing(&self, _listing: &ListingId) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("order table locked".to_string()))
    }
}

pub(super) type TestService = BoostService<MemoryListings, MemoryPlans, MemoryOrders, RecordingInvoices>;

pub(super) fn build_service(
    listing_count: usize,
) -> (
    Arc<TestService>,
    Arc<MemoryListings>,
    Arc<MemoryOrders>,
    Arc<RecordingInvoices>,
) {
    let listings = Arc::new(MemoryListings::with(listings(listing_count)));
    let plans = Arc::new(MemoryPlans::standard_tiers());
    let orders = Arc::new(MemoryOrders::default());
    let invoices = Arc::new(RecordingInvoices::default());
    let service = Arc::new(BoostService::new(
        listings.clone(),
        plans.clone(),
        orders.clone(),
        invoices.clone(),
    ));
    (service, listings, orders, invoices)
}
