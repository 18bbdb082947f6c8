use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::{
    BoostOrder, BoostPlan, BoostStatus, EffectiveStatus, Listing, ListingId, OrderId, PlanId,
    RejectedReason,
};
use super::repository::{BoostOrderRepository, ListingStore, PlanCatalog, StoreError};

static ORDER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_order_id() -> OrderId {
    let id = ORDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OrderId(format!("boost-{id:06}"))
}

/// Error enumeration for ledger validation and storage failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("listing '{0}' not found")]
    ListingNotFound(ListingId),
    #[error("boost plan '{0}' not found")]
    PlanNotFound(PlanId),
    #[error("boost order '{0}' not found")]
    OrderNotFound(OrderId),
    #[error("listing '{0}' already has an active boost")]
    ActiveBoostExists(ListingId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The single write path for boost order rows.
///
/// Every lifecycle transition funnels through here so the
/// one-effectively-active-order-per-listing invariant is enforced at one
/// choke point. Activation paths serialize their check-and-write behind
/// `activation_gate`; two concurrent activations for the same listing
/// cannot both pass the guard.
pub struct BoostLedger<L, P, O> {
    listings: Arc<L>,
    plans: Arc<P>,
    orders: Arc<O>,
    activation_gate: Mutex<()>,
}

impl<L, P, O> BoostLedger<L, P, O>
where
    L: ListingStore,
    P: PlanCatalog,
    O: BoostOrderRepository,
{
    pub fn new(listings: Arc<L>, plans: Arc<P>, orders: Arc<O>) -> Self {
        Self {
            listings,
            plans,
            orders,
            activation_gate: Mutex::new(()),
        }
    }

    pub fn listing(&self, id: &ListingId) -> Result<Listing, LedgerError> {
        self.listings
            .get(id)?
            .ok_or_else(|| LedgerError::ListingNotFound(id.clone()))
    }

    pub fn plan(&self, id: &PlanId) -> Result<BoostPlan, LedgerError> {
        self.plans
            .get(id)?
            .ok_or_else(|| LedgerError::PlanNotFound(id.clone()))
    }

    pub fn plan_for(&self, order: &BoostOrder) -> Result<BoostPlan, LedgerError> {
        self.plan(&order.plan_id)
    }

    pub fn order(&self, id: &OrderId) -> Result<BoostOrder, LedgerError> {
        self.orders
            .fetch(id)?
            .ok_or_else(|| LedgerError::OrderNotFound(id.clone()))
    }

    pub fn orders(&self) -> Result<Vec<BoostOrder>, LedgerError> {
        Ok(self.orders.all()?)
    }

    pub fn orders_for(&self, listing: &ListingId) -> Result<Vec<BoostOrder>, LedgerError> {
        Ok(self.orders.for_listing(listing)?)
    }

    /// Oldest-first slice of pending orders for the admin approval queue.
    pub fn pending(&self, limit: usize) -> Result<Vec<BoostOrder>, LedgerError> {
        let mut pending: Vec<BoostOrder> = self
            .orders
            .all()?
            .into_iter()
            .filter(|order| order.status == BoostStatus::Pending)
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        pending.truncate(limit);
        Ok(pending)
    }

    pub fn approved_listings(&self) -> Result<Vec<Listing>, LedgerError> {
        Ok(self.listings.list_approved()?)
    }

    pub fn plans(&self) -> Result<Vec<BoostPlan>, LedgerError> {
        Ok(self.plans.list()?)
    }

    /// Record a new purchase attempt. Both referenced rows must exist;
    /// nothing is written otherwise. Concurrent pending orders for the same
    /// listing are allowed, they only compete at activation time.
    pub fn submit(
        &self,
        listing_id: &ListingId,
        plan_id: &PlanId,
        now: DateTime<Utc>,
    ) -> Result<BoostOrder, LedgerError> {
        let listing = self.listing(listing_id)?;
        let plan = self.plan(plan_id)?;

        let order = BoostOrder {
            id: next_order_id(),
            listing_id: listing.id,
            plan_id: plan.id,
            status: BoostStatus::Pending,
            rejected_reason: None,
            created_at: now,
        };
        Ok(self.orders.insert(order)?)
    }

    /// Promote an order to active with a fresh window starting at `now`.
    pub fn activate(
        &self,
        mut order: BoostOrder,
        now: DateTime<Utc>,
    ) -> Result<BoostOrder, LedgerError> {
        let _gate = self.activation_gate.lock().expect("activation gate poisoned");
        self.ensure_no_active_sibling(&order, now)?;

        order.status = BoostStatus::Active;
        order.rejected_reason = None;
        order.created_at = now;
        self.orders.update(order.clone())?;
        Ok(order)
    }

    /// Return a suspended order to active without touching `created_at`:
    /// whatever remains of the original window resumes, which may be
    /// nothing at all.
    pub fn resume(
        &self,
        mut order: BoostOrder,
        now: DateTime<Utc>,
    ) -> Result<BoostOrder, LedgerError> {
        let _gate = self.activation_gate.lock().expect("activation gate poisoned");
        self.ensure_no_active_sibling(&order, now)?;

        order.status = BoostStatus::Active;
        order.rejected_reason = None;
        self.orders.update(order.clone())?;
        Ok(order)
    }

    pub fn mark_rejected(
        &self,
        mut order: BoostOrder,
        reason: Option<RejectedReason>,
    ) -> Result<BoostOrder, LedgerError> {
        order.status = BoostStatus::Rejected;
        order.rejected_reason = reason;
        self.orders.update(order.clone())?;
        Ok(order)
    }

    /// Explicit deboost: the one place a row is physically flipped to
    /// expired, as opposed to merely projecting as expired on read.
    pub fn mark_expired(&self, mut order: BoostOrder) -> Result<BoostOrder, LedgerError> {
        order.status = BoostStatus::Expired;
        order.rejected_reason = None;
        self.orders.update(order.clone())?;
        Ok(order)
    }

    pub fn remove(&self, id: &OrderId) -> Result<(), LedgerError> {
        match self.orders.delete(id) {
            Err(StoreError::NotFound) => Err(LedgerError::OrderNotFound(id.clone())),
            other => Ok(other?),
        }
    }

    pub fn purge_orders(&self, listing: &ListingId) -> Result<usize, LedgerError> {
        Ok(self.orders.delete_for_listing(listing)?)
    }

    pub fn drop_listing(&self, listing: &ListingId) -> Result<(), LedgerError> {
        Ok(self.listings.delete(listing)?)
    }

    fn ensure_no_active_sibling(
        &self,
        order: &BoostOrder,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        for sibling in self.orders.for_listing(&order.listing_id)? {
            if sibling.id == order.id {
                continue;
            }
            // A sibling with an unresolvable plan cannot be proven active;
            // the ranking pass logs these rows.
            let Some(plan) = self.plans.get(&sibling.plan_id)? else {
                continue;
            };
            if sibling.effective_status(&plan, now) == EffectiveStatus::Active {
                return Err(LedgerError::ActiveBoostExists(order.listing_id.clone()));
            }
        }
        Ok(())
    }
}
