use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::warn;

use super::domain::{BoostOrder, BoostPlan, EffectiveStatus, Listing, ListingId, OrderId, PlanId};

/// Weight bands for the randomized feed ordering.
///
/// Boosted listings draw from a higher band than organic ones, so a boost
/// buys a probabilistically better position without ever pinning a single
/// listing to the top. The defaults are the product constants: boosted
/// uniform over [1, 3), organic uniform over [0, 1).
#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    pub boosted_weight_floor: f64,
    pub boosted_weight_ceiling: f64,
    pub organic_weight_ceiling: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            boosted_weight_floor: 1.0,
            boosted_weight_ceiling: 3.0,
            organic_weight_ceiling: 1.0,
        }
    }
}

/// Boost details attached to a ranked listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveBoost {
    pub order_id: OrderId,
    pub plan_id: PlanId,
    pub plan_name: String,
    pub expires_at: DateTime<Utc>,
}

/// One feed entry: the listing, its drawn weight, and the boost that earned
/// the boosted band, if any.
#[derive(Debug, Clone, Serialize)]
pub struct RankedListing {
    pub listing: Listing,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<ActiveBoost>,
}

/// Aggregate counts computed in the same pass as the ordering. Stable
/// across repeated calls with unchanged input, unlike the ordering itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub total_listings: usize,
    pub total_boosted: usize,
    pub expired_boosts: usize,
    pub boosts_by_plan: BTreeMap<PlanId, usize>,
}

/// Output of one ranking pass.
#[derive(Debug, Clone, Serialize)]
pub struct RankedFeed {
    pub listings: Vec<RankedListing>,
    pub stats: FeedStats,
}

/// Stateless ranker that blends boosted and organic listings.
pub struct RankingEngine {
    config: RankingConfig,
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(RankingConfig::default())
    }
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Draw a display weight from the band the listing qualifies for. Pure
    /// in the supplied random source, so tests can seed it.
    pub fn weight_for<R: Rng + ?Sized>(&self, boosted: bool, rng: &mut R) -> f64 {
        if boosted {
            rng.random_range(self.config.boosted_weight_floor..self.config.boosted_weight_ceiling)
        } else {
            rng.random_range(0.0..self.config.organic_weight_ceiling)
        }
    }

    /// Produce the feed ordering and its stats in one pass.
    ///
    /// The output is a permutation of `listings`: a listing with no boost
    /// orders is always included as organic, and a boost order that cannot
    /// be joined to a known listing or plan is skipped with a warning
    /// rather than failing the whole feed. The ordering is re-randomized on
    /// every call; the stats are not.
    pub fn rank<R: Rng + ?Sized>(
        &self,
        listings: &[Listing],
        orders: &[BoostOrder],
        plans: &[BoostPlan],
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> RankedFeed {
        let plan_index: HashMap<&PlanId, &BoostPlan> =
            plans.iter().map(|plan| (&plan.id, plan)).collect();
        let listing_ids: HashSet<&ListingId> = listings.iter().map(|listing| &listing.id).collect();

        let mut active_by_listing: HashMap<ListingId, ActiveBoost> = HashMap::new();
        let mut boosts_by_plan: BTreeMap<PlanId, usize> = BTreeMap::new();
        let mut expired_boosts = 0usize;

        for order in orders {
            if !listing_ids.contains(&order.listing_id) {
                warn!(
                    order = %order.id,
                    listing = %order.listing_id,
                    "skipping boost order: listing missing from approved set"
                );
                continue;
            }
            let Some(plan) = plan_index.get(&order.plan_id) else {
                warn!(
                    order = %order.id,
                    plan = %order.plan_id,
                    "skipping boost order: unknown plan"
                );
                continue;
            };

            match order.effective_status(plan, now) {
                EffectiveStatus::Active => {
                    // First active order per listing wins; the ledger keeps
                    // this from happening in fresh data.
                    if !active_by_listing.contains_key(&order.listing_id) {
                        *boosts_by_plan.entry(plan.id.clone()).or_default() += 1;
                        active_by_listing.insert(
                            order.listing_id.clone(),
                            ActiveBoost {
                                order_id: order.id.clone(),
                                plan_id: plan.id.clone(),
                                plan_name: plan.name.clone(),
                                expires_at: order.created_at + plan.duration(),
                            },
                        );
                    }
                }
                EffectiveStatus::Expired => expired_boosts += 1,
                _ => {}
            }
        }

        let total_boosted = active_by_listing.len();
        let mut ranked: Vec<RankedListing> = listings
            .iter()
            .map(|listing| {
                let boost = active_by_listing.get(&listing.id).cloned();
                let weight = self.weight_for(boost.is_some(), rng);
                RankedListing {
                    listing: listing.clone(),
                    weight,
                    boost,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        RankedFeed {
            listings: ranked,
            stats: FeedStats {
                total_listings: listings.len(),
                total_boosted,
                expired_boosts,
                boosts_by_plan,
            },
        }
    }
}
