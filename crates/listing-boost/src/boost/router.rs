use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{ListingId, OrderId, PlanId};
use super::ledger::LedgerError;
use super::repository::{BoostOrderRepository, InvoiceEmitter, ListingStore, PlanCatalog};
use super::service::{BoostAction, BoostService, BoostServiceError};

impl IntoResponse for BoostServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            BoostServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
            BoostServiceError::Ledger(err) => match err {
                LedgerError::ListingNotFound(_)
                | LedgerError::PlanNotFound(_)
                | LedgerError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::ActiveBoostExists(_) => StatusCode::CONFLICT,
                LedgerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitBoostRequest {
    pub(crate) listing_id: String,
    pub(crate) plan_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RenewBoostsRequest {
    pub(crate) order_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueueQuery {
    #[serde(default = "default_queue_limit")]
    pub(crate) limit: usize,
}

fn default_queue_limit() -> usize {
    20
}

/// Router builder exposing the boost admin and feed endpoints.
pub fn boost_router<L, P, O, I>(service: Arc<BoostService<L, P, O, I>>) -> Router
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    Router::new()
        .route("/api/v1/boosts", post(submit_handler::<L, P, O, I>))
        .route("/api/v1/boosts/queue", get(queue_handler::<L, P, O, I>))
        .route("/api/v1/boosts/renewals", post(renew_handler::<L, P, O, I>))
        .route(
            "/api/v1/boosts/:order_id",
            get(order_handler::<L, P, O, I>).delete(remove_handler::<L, P, O, I>),
        )
        .route(
            "/api/v1/boosts/:order_id/approve",
            post(approve_handler::<L, P, O, I>),
        )
        .route(
            "/api/v1/boosts/:order_id/reject",
            post(reject_handler::<L, P, O, I>),
        )
        .route(
            "/api/v1/boosts/:order_id/suspend",
            post(suspend_handler::<L, P, O, I>),
        )
        .route(
            "/api/v1/boosts/:order_id/reactivate",
            post(reactivate_handler::<L, P, O, I>),
        )
        .route(
            "/api/v1/boosts/:order_id/deboost",
            post(deboost_handler::<L, P, O, I>),
        )
        .route(
            "/api/v1/listings/:listing_id",
            delete(delete_listing_handler::<L, P, O, I>),
        )
        .route(
            "/api/v1/listings/:listing_id/boosts",
            get(listing_boosts_handler::<L, P, O, I>),
        )
        .route("/api/v1/feed", get(feed_handler::<L, P, O, I>))
        .route("/api/v1/plans", get(plans_handler::<L, P, O, I>))
        .with_state(service)
}

async fn submit_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Json(payload): Json<SubmitBoostRequest>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    let now = Utc::now();
    let listing_id = ListingId(payload.listing_id);
    let plan_id = PlanId(payload.plan_id);
    match service
        .submit(&listing_id, &plan_id, now)
        .and_then(|order| service.order_view(&order.id, now))
    {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn order_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Path(order_id): Path<String>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    match service.order_view(&OrderId(order_id), Utc::now()) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn queue_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Query(query): Query<QueueQuery>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    match service.approval_queue(query.limit, Utc::now()) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn approve_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Path(order_id): Path<String>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    let now = Utc::now();
    let order_id = OrderId(order_id);
    match service
        .approve(&order_id, now)
        .and_then(|order| service.order_view(&order.id, now))
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn reject_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Path(order_id): Path<String>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    let now = Utc::now();
    let order_id = OrderId(order_id);
    match service
        .reject(&order_id)
        .and_then(|order| service.order_view(&order.id, now))
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn suspend_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Path(order_id): Path<String>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    let now = Utc::now();
    let order_id = OrderId(order_id);
    match service
        .suspend(&order_id)
        .and_then(|order| service.order_view(&order.id, now))
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn reactivate_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Path(order_id): Path<String>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    let now = Utc::now();
    let order_id = OrderId(order_id);
    match service
        .reactivate(&order_id, now)
        .and_then(|order| service.order_view(&order.id, now))
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn deboost_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Path(order_id): Path<String>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    let now = Utc::now();
    let order_id = OrderId(order_id);
    match service
        .deboost(&order_id)
        .and_then(|order| service.order_view(&order.id, now))
    {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn renew_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Json(payload): Json<RenewBoostsRequest>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    if payload.order_ids.is_empty() {
        let body = json!({ "error": format!("{} requires at least one order id", BoostAction::Renew) });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
    }

    let now = Utc::now();
    let order_ids: Vec<OrderId> = payload.order_ids.into_iter().map(OrderId).collect();
    match service.renew_batch(&order_ids, now) {
        Ok(orders) => {
            let mut views = Vec::with_capacity(orders.len());
            for order in &orders {
                match service.order_view(&order.id, now) {
                    Ok(view) => views.push(view),
                    Err(err) => return err.into_response(),
                }
            }
            (StatusCode::CREATED, Json(views)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn remove_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Path(order_id): Path<String>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    match service.remove(&OrderId(order_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_listing_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    match service.delete_listing_cascade(&ListingId(listing_id)) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn listing_boosts_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    match service.listing_views(&ListingId(listing_id), Utc::now()) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn feed_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    let mut rng = rand::rng();
    match service.ranked_feed(Utc::now(), &mut rng) {
        Ok(feed) => (StatusCode::OK, Json(feed)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn plans_handler<L, P, O, I>(
    State(service): State<Arc<BoostService<L, P, O, I>>>,
) -> Response
where
    L: ListingStore + 'static,
    P: PlanCatalog + 'static,
    O: BoostOrderRepository + 'static,
    I: InvoiceEmitter + 'static,
{
    match service.plans() {
        Ok(plans) => (StatusCode::OK, Json(plans)).into_response(),
        Err(err) => err.into_response(),
    }
}
