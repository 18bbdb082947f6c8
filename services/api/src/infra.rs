use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use listing_boost::boost::{
    BoostOrder, BoostOrderRepository, BoostPlan, InvoiceDraft, InvoiceEmitter, InvoiceError,
    Listing, ListingApproval, ListingId, ListingStore, OrderId, PlanCatalog, PlanId, StoreError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory stand-in for the externally owned listing store.
#[derive(Default, Clone)]
pub(crate) struct InMemoryListingStore {
    records: Arc<Mutex<HashMap<ListingId, Listing>>>,
}

impl InMemoryListingStore {
    pub(crate) fn with(listings: Vec<Listing>) -> Self {
        let store = Self::default();
        {
            let mut guard = store.records.lock().expect("listing mutex poisoned");
            for listing in listings {
                guard.insert(listing.id.clone(), listing);
            }
        }
        store
    }
}

impl ListingStore for InMemoryListingStore {
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

/// In-memory stand-in for the administered plan catalog.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPlanCatalog {
    records: Arc<Mutex<HashMap<PlanId, BoostPlan>>>,
}

impl InMemoryPlanCatalog {
    pub(crate) fn with(plans: Vec<BoostPlan>) -> Self {
        let catalog = Self::default();
        {
            let mut guard = catalog.records.lock().expect("plan mutex poisoned");
            for plan in plans {
                guard.insert(plan.id.clone(), plan);
            }
        }
        catalog
    }
}

impl PlanCatalog for InMemoryPlanCatalog {
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

/// In-memory boost order rows behind the repository trait.
#[derive(Default, Clone)]
pub(crate) struct InMemoryBoostOrderRepository {
    records: Arc<Mutex<HashMap<OrderId, BoostOrder>>>,
}

impl BoostOrderRepository for InMemoryBoostOrderRepository {
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

/// Stand-in for the external invoicing system: logs each draft and keeps it
/// for the demo output.
#[derive(Default, Clone)]
pub(crate) struct RecordingInvoiceEmitter {
    drafts: Arc<Mutex<Vec<InvoiceDraft>>>,
}

impl RecordingInvoiceEmitter {
    pub(crate) fn drafts(&self) -> Vec<InvoiceDraft> {
        self.drafts.lock().expect("invoice mutex poisoned").clone()
    }
}

impl InvoiceEmitter for RecordingInvoiceEmitter {
    fn emit(&self, draft: InvoiceDraft) -> Result<(), InvoiceError> {
        info!(
            owner = %draft.owner_id,
            amount = draft.amount,
            description = %draft.description,
            "invoice recorded"
        );
        self.drafts
            .lock()
            .expect("invoice mutex poisoned")
            .push(draft);
        Ok(())
    }
}

pub(crate) fn default_plan_tiers() -> Vec<BoostPlan> {
    vec![
        BoostPlan {
            id: PlanId("plan-basic".to_string()),
            name: "Basic".to_string(),
            duration_days: 7,
            price: 500,
        },
        BoostPlan {
            id: PlanId("plan-standard".to_string()),
            name: "Standard".to_string(),
            duration_days: 14,
            price: 900,
        },
        BoostPlan {
            id: PlanId("plan-premium".to_string()),
            name: "Premium".to_string(),
            duration_days: 30,
            price: 1500,
        },
    ]
}

pub(crate) fn sample_listings() -> Vec<Listing> {
    vec![
        Listing {
            id: ListingId("lst-001".to_string()),
            title: "Two-bedroom apartment near the riverfront".to_string(),
            price: 215_000,
            approval: ListingApproval::Approved,
            owner_id: "user-7".to_string(),
        },
        Listing {
            id: ListingId("lst-002".to_string()),
            title: "Renovated loft with workshop".to_string(),
            price: 189_000,
            approval: ListingApproval::Approved,
            owner_id: "user-7".to_string(),
        },
        Listing {
            id: ListingId("lst-003".to_string()),
            title: "Garden house on the edge of town".to_string(),
            price: 240_000,
            approval: ListingApproval::Approved,
            owner_id: "user-12".to_string(),
        },
        Listing {
            id: ListingId("lst-004".to_string()),
            title: "Studio above the bakery".to_string(),
            price: 98_000,
            approval: ListingApproval::Approved,
            owner_id: "user-31".to_string(),
        },
        Listing {
            id: ListingId("lst-005".to_string()),
            title: "Farmhouse pending inspection".to_string(),
            price: 310_000,
            approval: ListingApproval::Pending,
            owner_id: "user-12".to_string(),
        },
    ]
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn date_to_utc(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(12, 0, 0).expect("midday is always valid"),
        Utc,
    )
}
