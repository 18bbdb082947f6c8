use serde::{Deserialize, Serialize};

use super::domain::{BoostOrder, BoostPlan, Listing, ListingId, OrderId, PlanId};

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the externally owned listing store.
pub trait ListingStore: Send + Sync {
    fn get(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;
    fn list_approved(&self) -> Result<Vec<Listing>, StoreError>;
    fn delete(&self, id: &ListingId) -> Result<(), StoreError>;
}

/// Read access to the administered boost plan catalog.
pub trait PlanCatalog: Send + Sync {
    fn get(&self, id: &PlanId) -> Result<Option<BoostPlan>, StoreError>;
    fn list(&self) -> Result<Vec<BoostPlan>, StoreError>;
}

/// Raw row storage for boost orders. Only the ledger is allowed to call the
/// mutating methods; `update` replaces a whole row in one statement so a
/// failed write never leaves partial field changes behind.
pub trait BoostOrderRepository: Send + Sync {
    fn insert(&self, order: BoostOrder) -> Result<BoostOrder, StoreError>;
    fn update(&self, order: BoostOrder) -> Result<(), StoreError>;
    fn fetch(&self, id: &OrderId) -> Result<Option<BoostOrder>, StoreError>;
    fn for_listing(&self, listing: &ListingId) -> Result<Vec<BoostOrder>, StoreError>;
    fn all(&self) -> Result<Vec<BoostOrder>, StoreError>;
    fn delete(&self, id: &OrderId) -> Result<(), StoreError>;
    fn delete_for_listing(&self, listing: &ListingId) -> Result<usize, StoreError>;
}

/// Billable event handed to the external invoicing system. Never read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub owner_id: String,
    pub amount: u64,
    pub description: String,
}

/// Outbound invoice hook. Fire-and-forget from the engine's perspective:
/// emission failures are logged by the caller, never propagated.
pub trait InvoiceEmitter: Send + Sync {
    fn emit(&self, draft: InvoiceDraft) -> Result<(), InvoiceError>;
}

/// Invoice dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("invoice transport unavailable: {0}")]
    Transport(String),
}
