use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::infra::{
    date_to_utc, default_plan_tiers, sample_listings, InMemoryBoostOrderRepository,
    InMemoryListingStore, InMemoryPlanCatalog, RecordingInvoiceEmitter,
};
use listing_boost::boost::{BoostService, ListingId, PlanId, RankedFeed};
use listing_boost::config::AppConfig;
use listing_boost::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct FeedReportArgs {
    /// Seed for the feed's random weighting (defaults to APP_FEED_SEED)
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Evaluation date for the report (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Seed for the feed renders in the demo (defaults to APP_FEED_SEED)
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

type DemoService = BoostService<
    InMemoryListingStore,
    InMemoryPlanCatalog,
    InMemoryBoostOrderRepository,
    RecordingInvoiceEmitter,
>;

fn build_demo_service() -> (Arc<DemoService>, Arc<RecordingInvoiceEmitter>) {
    let invoices = Arc::new(RecordingInvoiceEmitter::default());
    let service = Arc::new(BoostService::new(
        Arc::new(InMemoryListingStore::with(sample_listings())),
        Arc::new(InMemoryPlanCatalog::with(default_plan_tiers())),
        Arc::new(InMemoryBoostOrderRepository::default()),
        invoices.clone(),
    ));
    (service, invoices)
}

fn rng_for(seed: Option<u64>, config: &AppConfig) -> StdRng {
    match seed.or(config.feed.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn render_feed(feed: &RankedFeed) {
    println!("\nRanked feed ({} listings)", feed.stats.total_listings);
    for (position, entry) in feed.listings.iter().enumerate() {
        let tier = entry
            .boost
            .as_ref()
            .map(|boost| boost.plan_name.as_str())
            .unwrap_or("organic");
        println!(
            "  {:>2}. [{:>7}] {:.3}  {}",
            position + 1,
            tier,
            entry.weight,
            entry.listing.title
        );
    }
    println!(
        "Stats: {} boosted, {} expired boost(s), {} total",
        feed.stats.total_boosted, feed.stats.expired_boosts, feed.stats.total_listings
    );
    for (plan, count) in &feed.stats.boosts_by_plan {
        println!("  {plan}: {count} active boost(s)");
    }
}

pub(crate) fn run_feed_report(args: FeedReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let now = args
        .today
        .map(date_to_utc)
        .unwrap_or_else(Utc::now);

    let (service, _) = build_demo_service();

    // Walk a few listings through the lifecycle so the report has every
    // effective status in it: one fresh boost, one that already lapsed,
    // and one under suspension.
    let premium = PlanId("plan-premium".to_string());
    let basic = PlanId("plan-basic".to_string());
    let standard = PlanId("plan-standard".to_string());

    let fresh = service.submit(&ListingId("lst-001".to_string()), &premium, now)?;
    service.approve(&fresh.id, now - Duration::days(2))?;

    let lapsed = service.submit(&ListingId("lst-002".to_string()), &basic, now)?;
    service.approve(&lapsed.id, now - Duration::days(10))?;

    let suspended = service.submit(&ListingId("lst-003".to_string()), &standard, now)?;
    service.approve(&suspended.id, now - Duration::days(1))?;
    service.suspend(&suspended.id)?;

    let mut rng = rng_for(args.seed, &config);
    let feed = service.ranked_feed(now, &mut rng)?;
    println!("Feed report for {}", now.date_naive());
    render_feed(&feed);

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let now = Utc::now();
    let t0 = now - Duration::days(20);

    let (service, invoices) = build_demo_service();
    let listing = ListingId("lst-001".to_string());
    let basic = PlanId("plan-basic".to_string());

    println!("Boost engine demo");
    println!("\nPlans on offer:");
    for plan in service.plans()? {
        println!(
            "  {} - {} days for {}",
            plan.name, plan.duration_days, plan.price
        );
    }

    let order = service.submit(&listing, &basic, t0)?;
    println!("\nOwner submits a boost for {listing}: order {} is pending", order.id);

    let approved = service.approve(&order.id, t0)?;
    let window = service.order_view(&approved.id, t0)?;
    println!(
        "Admin approves: active from {} until {}",
        approved.created_at.date_naive(),
        window
            .expires_at
            .map(|at| at.date_naive().to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    service.suspend(&order.id)?;
    println!("Admin flags the boost as suspicious: suspended");

    let reactivated = service.reactivate(&order.id, t0 + Duration::days(2))?;
    println!(
        "Admin reactivates two days later: window still anchored at {}",
        reactivated.created_at.date_naive()
    );

    let view = service.order_view(&order.id, now)?;
    println!(
        "Today the stored status is '{}' but the feed sees '{}'",
        view.status, view.effective_status
    );

    let renewed = service.renew(&order.id, now)?;
    println!(
        "Owner renews the lapsed boost: new order {} is pending",
        renewed.id
    );
    service.approve(&renewed.id, now)?;
    println!("Admin approves the renewal");

    let mut rng = rng_for(args.seed, &config);
    let feed = service.ranked_feed(now, &mut rng)?;
    render_feed(&feed);

    let doomed = ListingId("lst-004".to_string());
    service.submit(&doomed, &basic, now)?;
    let outcome = service.delete_listing_cascade(&doomed)?;
    println!(
        "\nCascade delete of {doomed}: {} order(s) removed, listing deleted: {}",
        outcome.orders_removed, outcome.listing_deleted
    );

    let drafts = invoices.drafts();
    println!("\nInvoices recorded: {}", drafts.len());
    for draft in &drafts {
        println!("  {} owes {} ({})", draft.owner_id, draft.amount, draft.description);
    }

    Ok(())
}
