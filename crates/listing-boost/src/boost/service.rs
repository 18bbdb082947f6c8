use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::warn;

use super::domain::{
    BoostOrder, BoostPlan, BoostStatus, EffectiveStatus, ListingId, OrderId, PlanId,
    RejectedReason,
};
use super::ledger::{BoostLedger, LedgerError};
use super::ranking::{RankedFeed, RankingEngine};
use super::repository::{
    BoostOrderRepository, InvoiceDraft, InvoiceEmitter, ListingStore, PlanCatalog,
};

/// Administrative or owner action attempted against a boost order, named in
/// `InvalidTransition` errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostAction {
    Approve,
    Reject,
    Suspend,
    Reactivate,
    Renew,
    Deboost,
}

impl fmt::Display for BoostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            BoostAction::Approve => "approve",
            BoostAction::Reject => "reject",
            BoostAction::Suspend => "suspend",
            BoostAction::Reactivate => "reactivate",
            BoostAction::Renew => "renew",
            BoostAction::Deboost => "deboost",
        };
        f.write_str(verb)
    }
}

/// Error raised by the boost service.
#[derive(Debug, thiserror::Error)]
pub enum BoostServiceError {
    #[error("cannot {action} boost order '{order}' in state {state}")]
    InvalidTransition {
        action: BoostAction,
        order: OrderId,
        state: &'static str,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl BoostServiceError {
    fn invalid(action: BoostAction, order: &OrderId, state: &'static str) -> Self {
        Self::InvalidTransition {
            action,
            order: order.clone(),
            state,
        }
    }
}

/// Sanitized representation of one boost order for API responses: the
/// stored row plus the read-time projection.
#[derive(Debug, Clone, Serialize)]
pub struct BoostOrderView {
    pub order_id: OrderId,
    pub listing_id: ListingId,
    pub plan_id: PlanId,
    pub plan_name: String,
    pub status: &'static str,
    pub effective_status: &'static str,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl BoostOrderView {
    pub fn project(order: &BoostOrder, plan: &BoostPlan, now: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id.clone(),
            listing_id: order.listing_id.clone(),
            plan_id: order.plan_id.clone(),
            plan_name: plan.name.clone(),
            status: order.status.label(),
            effective_status: order.effective_status(plan, now).label(),
            created_at: order.created_at,
            expires_at: order.expires_at(plan),
        }
    }
}

/// Which half of a cascade delete failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    Orders,
    Listing,
}

/// One recorded cascade failure.
#[derive(Debug, Clone, Serialize)]
pub struct CascadeFailure {
    pub step: CascadeStep,
    pub detail: String,
}

/// Combined report of a fail-soft cascade delete. Both steps are attempted
/// regardless of the other's outcome; callers inspect `failures` instead of
/// getting a hard error for a partial cascade.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CascadeOutcome {
    pub orders_removed: usize,
    pub listing_deleted: bool,
    pub failures: Vec<CascadeFailure>,
}

impl CascadeOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Service composing the boost ledger, the invoice emitter, and the ranking
/// engine. All lifecycle transitions and feed reads enter through here.
pub struct BoostService<L, P, O, I> {
    ledger: Arc<BoostLedger<L, P, O>>,
    invoices: Arc<I>,
    ranking: RankingEngine,
}

impl<L, P, O, I> BoostService<L, P, O, I>
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    pub fn new(listings: Arc<L>, plans: Arc<P>, orders: Arc<O>, invoices: Arc<I>) -> Self {
        Self::with_ranking(listings, plans, orders, invoices, RankingEngine::default())
    }

    pub fn with_ranking(
        listings: Arc<L>,
        plans: Arc<P>,
        orders: Arc<O>,
        invoices: Arc<I>,
        ranking: RankingEngine,
    ) -> Self {
        Self {
            ledger: Arc::new(BoostLedger::new(listings, plans, orders)),
            invoices,
            ranking,
        }
    }

    pub fn ledger(&self) -> &BoostLedger<L, P, O> {
        &self.ledger
    }

    /// Owner action: request a boost. Existing pending or active orders do
    /// not block re-submission; competition is resolved at approval time.
    pub fn submit(
        &self,
        listing_id: &ListingId,
        plan_id: &PlanId,
        now: DateTime<Utc>,
    ) -> Result<BoostOrder, BoostServiceError> {
        Ok(self.ledger.submit(listing_id, plan_id, now)?)
    }

    /// Admin action: approve a pending order. The approval timestamp
    /// anchors the promotion window.
    pub fn approve(
        &self,
        order_id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<BoostOrder, BoostServiceError> {
        let order = self.ledger.order(order_id)?;
        if order.status != BoostStatus::Pending {
            return Err(BoostServiceError::invalid(
                BoostAction::Approve,
                order_id,
                order.state_label(),
            ));
        }
        Ok(self.ledger.activate(order, now)?)
    }

    /// Admin action: decline a pending order. Terminal; trying again means
    /// submitting a fresh order.
    pub fn reject(&self, order_id: &OrderId) -> Result<BoostOrder, BoostServiceError> {
        let order = self.ledger.order(order_id)?;
        if order.status != BoostStatus::Pending {
            return Err(BoostServiceError::invalid(
                BoostAction::Reject,
                order_id,
                order.state_label(),
            ));
        }
        Ok(self.ledger.mark_rejected(order, None)?)
    }

    /// Admin action: pull an active boost for review. Reversible through
    /// `reactivate`.
    pub fn suspend(&self, order_id: &OrderId) -> Result<BoostOrder, BoostServiceError> {
        let order = self.ledger.order(order_id)?;
        if order.status != BoostStatus::Active {
            return Err(BoostServiceError::invalid(
                BoostAction::Suspend,
                order_id,
                order.state_label(),
            ));
        }
        Ok(self
            .ledger
            .mark_rejected(order, Some(RejectedReason::Suspicious))?)
    }

    /// Admin action: lift a suspension. The original window resumes where
    /// it left off; a suspension that outlived the window reactivates into
    /// an immediately-expired boost.
    pub fn reactivate(
        &self,
        order_id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<BoostOrder, BoostServiceError> {
        let order = self.ledger.order(order_id)?;
        let suspended = order.status == BoostStatus::Rejected
            && order.rejected_reason == Some(RejectedReason::Suspicious);
        if !suspended {
            return Err(BoostServiceError::invalid(
                BoostAction::Reactivate,
                order_id,
                order.state_label(),
            ));
        }
        Ok(self.ledger.resume(order, now)?)
    }

    /// Renew one expired order. See [`Self::renew_batch`].
    pub fn renew(
        &self,
        order_id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<BoostOrder, BoostServiceError> {
        let mut created = self.renew_batch(std::slice::from_ref(order_id), now)?;
        Ok(created.remove(0))
    }

    /// Owner/admin action: renew a batch of effectively expired orders.
    ///
    /// Every order in the batch is validated before anything is written, so
    /// one bad id aborts the whole batch cleanly. Each renewal creates a
    /// fresh pending sibling (same listing, same plan); the expired source
    /// rows are never mutated. One invoice is then emitted per plan tier in
    /// the batch with amount = plan price x group size; emission failures
    /// are logged and swallowed so billing hiccups never roll back the
    /// renewals themselves.
    pub fn renew_batch(
        &self,
        order_ids: &[OrderId],
        now: DateTime<Utc>,
    ) -> Result<Vec<BoostOrder>, BoostServiceError> {
        let mut renewals: Vec<(BoostOrder, BoostPlan)> = Vec::with_capacity(order_ids.len());
        for order_id in order_ids {
            let order = self.ledger.order(order_id)?;
            let plan = self.ledger.plan_for(&order)?;
            let effective = order.effective_status(&plan, now);
            if effective != EffectiveStatus::Expired {
                return Err(BoostServiceError::invalid(
                    BoostAction::Renew,
                    order_id,
                    effective.label(),
                ));
            }
            renewals.push((order, plan));
        }

        let mut created = Vec::with_capacity(renewals.len());
        for (order, _) in &renewals {
            created.push(self.ledger.submit(&order.listing_id, &order.plan_id, now)?);
        }

        self.emit_renewal_invoices(&renewals);
        Ok(created)
    }

    /// Admin action: take an active boost down for good. This is the only
    /// path that physically stores `expired`.
    pub fn deboost(&self, order_id: &OrderId) -> Result<BoostOrder, BoostServiceError> {
        let order = self.ledger.order(order_id)?;
        if order.status != BoostStatus::Active {
            return Err(BoostServiceError::invalid(
                BoostAction::Deboost,
                order_id,
                order.state_label(),
            ));
        }
        Ok(self.ledger.mark_expired(order)?)
    }

    /// Admin action: delete a boost order row regardless of its status.
    pub fn remove(&self, order_id: &OrderId) -> Result<(), BoostServiceError> {
        Ok(self.ledger.remove(order_id)?)
    }

    /// Admin action: delete a listing and everything boosted about it.
    ///
    /// Fail-soft: the order purge and the listing delete are independent
    /// steps, each attempted even if the other fails, with failures logged
    /// and reported in the outcome. Only a missing listing aborts up front.
    pub fn delete_listing_cascade(
        &self,
        listing_id: &ListingId,
    ) -> Result<CascadeOutcome, BoostServiceError> {
        self.ledger.listing(listing_id)?;

        let mut outcome = CascadeOutcome::default();
        match self.ledger.purge_orders(listing_id) {
            Ok(count) => outcome.orders_removed = count,
            Err(err) => {
                warn!(listing = %listing_id, error = %err, "boost order purge failed, continuing cascade");
                outcome.failures.push(CascadeFailure {
                    step: CascadeStep::Orders,
                    detail: err.to_string(),
                });
            }
        }
        match self.ledger.drop_listing(listing_id) {
            Ok(()) => outcome.listing_deleted = true,
            Err(err) => {
                warn!(listing = %listing_id, error = %err, "listing delete failed after order purge");
                outcome.failures.push(CascadeFailure {
                    step: CascadeStep::Listing,
                    detail: err.to_string(),
                });
            }
        }
        Ok(outcome)
    }

    /// Fetch one order with its read-time projection applied.
    pub fn order_view(
        &self,
        order_id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<BoostOrderView, BoostServiceError> {
        let order = self.ledger.order(order_id)?;
        let plan = self.ledger.plan_for(&order)?;
        Ok(BoostOrderView::project(&order, &plan, now))
    }

    /// All boost orders for one listing, newest first.
    pub fn listing_views(
        &self,
        listing_id: &ListingId,
        now: DateTime<Utc>,
    ) -> Result<Vec<BoostOrderView>, BoostServiceError> {
        self.ledger.listing(listing_id)?;

        let mut views = Vec::new();
        for order in self.ledger.orders_for(listing_id)? {
            match self.ledger.plan_for(&order) {
                Ok(plan) => views.push(BoostOrderView::project(&order, &plan, now)),
                Err(err) => {
                    warn!(order = %order.id, error = %err, "skipping boost view: plan lookup failed");
                }
            }
        }
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(views)
    }

    /// Oldest-first pending orders awaiting an admin decision.
    pub fn approval_queue(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<BoostOrderView>, BoostServiceError> {
        let mut views = Vec::new();
        for order in self.ledger.pending(limit)? {
            match self.ledger.plan_for(&order) {
                Ok(plan) => views.push(BoostOrderView::project(&order, &plan, now)),
                Err(err) => {
                    warn!(order = %order.id, error = %err, "skipping queued boost: plan lookup failed");
                }
            }
        }
        Ok(views)
    }

    pub fn plans(&self) -> Result<Vec<BoostPlan>, BoostServiceError> {
        Ok(self.ledger.plans()?)
    }

    /// The feed read: approved listings joined to their effectively active
    /// boosts, weighted and ordered by the ranking engine.
    pub fn ranked_feed<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<RankedFeed, BoostServiceError> {
        let listings = self.ledger.approved_listings()?;
        let orders = self.ledger.orders()?;
        let plans = self.ledger.plans()?;
        Ok(self.ranking.rank(&listings, &orders, &plans, now, rng))
    }

    fn emit_renewal_invoices(&self, renewals: &[(BoostOrder, BoostPlan)]) {
        let mut groups: BTreeMap<PlanId, (BoostPlan, Vec<&BoostOrder>)> = BTreeMap::new();
        for (order, plan) in renewals {
            groups
                .entry(plan.id.clone())
                .or_insert_with(|| (plan.clone(), Vec::new()))
                .1
                .push(order);
        }

        for (plan, orders) in groups.into_values() {
            let owner_id = match self.ledger.listing(&orders[0].listing_id) {
                Ok(listing) => listing.owner_id,
                Err(err) => {
                    warn!(plan = %plan.id, error = %err, "skipping renewal invoice: owner lookup failed");
                    continue;
                }
            };
            let draft = InvoiceDraft {
                owner_id,
                amount: plan.price * orders.len() as u64,
                description: format!(
                    "Boost renewal: {} listing(s) on plan {}",
                    orders.len(),
                    plan.name
                ),
            };
            if let Err(err) = self.invoices.emit(draft) {
                warn!(plan = %plan.id, error = %err, "renewal invoice emission failed, renewals kept");
            }
        }
    }
}
