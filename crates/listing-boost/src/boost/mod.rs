//! Promotional boost lifecycle and ranked feed engine.
//!
//! A listing owner pays to promote a listing; an administrator approves,
//! suspends, reactivates, or renews that promotion; and every feed read
//! blends the effectively boosted listings with organic ones under
//! randomized weights. The ledger is the single write path for boost order
//! rows, the service enforces transition legality on top of it, and the
//! ranking engine derives the display order and dashboard stats.

pub mod domain;
pub mod ledger;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    BoostOrder, BoostPlan, BoostStatus, EffectiveStatus, Listing, ListingApproval, ListingId,
    OrderId, PlanId, RejectedReason,
};
pub use ledger::{BoostLedger, LedgerError};
pub use ranking::{
    ActiveBoost, FeedStats, RankedFeed, RankedListing, RankingConfig, RankingEngine,
};
pub use repository::{
    BoostOrderRepository, InvoiceDraft, InvoiceEmitter, InvoiceError, ListingStore, PlanCatalog,
    StoreError,
};
pub use router::boost_router;
pub use service::{
    BoostAction, BoostOrderView, BoostService, BoostServiceError, CascadeFailure, CascadeOutcome,
    CascadeStep,
};
