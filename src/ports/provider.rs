use async_trait::async_trait;

use crate::domain::booking::{BookingConfirmation, BookingRequest};
use crate::domain::criteria::{AvailabilityQuery, SearchCriteria};
use crate::domain::inventory::{AvailabilityInfo, DataSource, Domain, InventoryItem};
use crate::domain::reference::{self, ReferenceList};
use crate::error::Result;

/// One way of answering inventory requests for a single domain.
///
/// A [`DomainAdapter`](crate::gateway::adapter::DomainAdapter) resolves exactly
/// one strategy when it is built (direct provider, backend proxy or
/// synthetic sandbox) and keeps it for its lifetime.
#[async_trait]
pub trait ProviderStrategy: Send + Sync {
    fn domain(&self) -> Domain;

    fn source(&self) -> DataSource;

    /// Name reported in logs and in `ApiError::service`.
    fn service(&self) -> &str;

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<InventoryItem>>;

    async fn details(&self, id: &str) -> Result<InventoryItem>;

    async fn availability(&self, id: &str, query: &AvailabilityQuery)
    -> Result<AvailabilityInfo>;

    /// Never retried by callers.
    async fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation>;

    async fn reference_list(&self, list: ReferenceList) -> Result<Vec<String>> {
        Ok(reference::builtin(self.domain(), list))
    }
}
