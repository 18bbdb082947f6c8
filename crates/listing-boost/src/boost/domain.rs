use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for marketplace listings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Identifier wrapper for boost plans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanId(pub String);

/// Identifier wrapper for boost orders.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Moderation state of the listing itself, separate from any boost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingApproval {
    Pending,
    Approved,
    Rejected,
}

/// Marketplace listing snapshot consumed from the external listing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    pub price: u64,
    pub approval: ListingApproval,
    pub owner_id: String,
}

/// Purchasable promotion plan. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostPlan {
    pub id: PlanId,
    pub name: String,
    pub duration_days: u32,
    pub price: u64,
}

impl BoostPlan {
    /// Length of the promotion window purchased with this plan.
    pub fn duration(&self) -> Duration {
        Duration::days(self.duration_days as i64)
    }
}

/// Stored lifecycle state of a boost order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostStatus {
    Pending,
    Active,
    Rejected,
    Expired,
}

impl BoostStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BoostStatus::Pending => "pending",
            BoostStatus::Active => "active",
            BoostStatus::Rejected => "rejected",
            BoostStatus::Expired => "expired",
        }
    }
}

/// Sub-discriminant on a rejected order. A suspicious rejection is an
/// administrative suspension and stays reversible; a plain rejection is
/// terminal for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectedReason {
    Suspicious,
}

/// The status a boost order appears to have once time-based expiry is
/// applied at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Pending,
    Active,
    Rejected,
    Suspended,
    Expired,
}

impl EffectiveStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EffectiveStatus::Pending => "pending",
            EffectiveStatus::Active => "active",
            EffectiveStatus::Rejected => "rejected",
            EffectiveStatus::Suspended => "suspended",
            EffectiveStatus::Expired => "expired",
        }
    }
}

/// A paid promotion attempt for one listing against one plan.
///
/// `created_at` anchors the promotion window: it is stamped at submission
/// and re-stamped when an administrator approves the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostOrder {
    pub id: OrderId,
    pub listing_id: ListingId,
    pub plan_id: PlanId,
    pub status: BoostStatus,
    pub rejected_reason: Option<RejectedReason>,
    pub created_at: DateTime<Utc>,
}

impl BoostOrder {
    /// End of the promotion window. Only an active order has a
    /// forward-looking expiry; every other status yields `None`.
    pub fn expires_at(&self, plan: &BoostPlan) -> Option<DateTime<Utc>> {
        match self.status {
            BoostStatus::Active => Some(self.created_at + plan.duration()),
            _ => None,
        }
    }

    /// Read-time projection of the stored status. Every consumer (lifecycle
    /// checks, ranking, admin views) goes through this one function so no
    /// two call sites can disagree on what "expired" means.
    ///
    /// Idempotent and side-effect free: the stored row is never flipped
    /// here, only projected.
    pub fn effective_status(&self, plan: &BoostPlan, now: DateTime<Utc>) -> EffectiveStatus {
        match (self.status, self.rejected_reason) {
            (BoostStatus::Pending, _) => EffectiveStatus::Pending,
            (BoostStatus::Active, _) => {
                if now > self.created_at + plan.duration() {
                    EffectiveStatus::Expired
                } else {
                    EffectiveStatus::Active
                }
            }
            (BoostStatus::Rejected, Some(RejectedReason::Suspicious)) => {
                EffectiveStatus::Suspended
            }
            (BoostStatus::Rejected, None) => EffectiveStatus::Rejected,
            (BoostStatus::Expired, _) => EffectiveStatus::Expired,
        }
    }

    /// Stored-state label including the suspension sub-discriminant, used
    /// when reporting an illegal transition.
    pub fn state_label(&self) -> &'static str {
        match (self.status, self.rejected_reason) {
            (BoostStatus::Rejected, Some(RejectedReason::Suspicious)) => "suspended",
            (status, _) => status.label(),
        }
    }
}
