use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::adapters::fallback::FallbackGenerator;
use crate::config::types::BookingConfig;
use crate::domain::booking::{BookingConfirmation, BookingRequest, BookingStatus};
use crate::domain::criteria::{AvailabilityQuery, SearchCriteria};
use crate::domain::inventory::{AvailabilityInfo, DataSource, Domain, InventoryItem};
use crate::error::Result;
use crate::ports::provider::ProviderStrategy;

/// Strategy used when neither provider credentials nor a proxy are configured.
/// Reads come from the fallback generator and bookings are accepted locally.
pub struct SandboxProvider {
    domain: Domain,
    service: String,
    generator: Arc<FallbackGenerator>,
    booking: BookingConfig,
}

impl SandboxProvider {
    pub fn new(domain: Domain, generator: Arc<FallbackGenerator>, booking: BookingConfig) -> Self {
        Self {
            domain,
            service: format!("{domain}-sandbox"),
            generator,
            booking,
        }
    }
}

#[async_trait]
impl ProviderStrategy for SandboxProvider {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn source(&self) -> DataSource {
        DataSource::Fallback
    }

    fn service(&self) -> &str {
        &self.service
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<InventoryItem>> {
        Ok(self.generator.search(self.domain, criteria))
    }

    async fn details(&self, id: &str) -> Result<InventoryItem> {
        Ok(self.generator.details(self.domain, id))
    }

    async fn availability(&self, id: &str, query: &AvailabilityQuery) -> Result<AvailabilityInfo> {
        Ok(self.generator.availability(self.domain, id, query))
    }

    async fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation> {
        let item = self.generator.details(self.domain, &request.item_id);
        let price = super::estimate(
            self.domain,
            request,
            Some(item.summary().price.amount),
            self.generator.currency(),
            &self.booking,
        );
        let booking_id = format!("{}-{}", self.domain.item_kind(), uuid::Uuid::new_v4());
        info!(domain = %self.domain, %booking_id, item_id = %request.item_id, "Sandbox booking accepted");

        Ok(BookingConfirmation {
            booking_id,
            confirmation_number: String::new(),
            status: BookingStatus::Confirmed,
            domain: self.domain,
            item_id: request.item_id.clone(),
            price,
            contact: request.contact.clone(),
            guests: request.guests.clone(),
            dates: request.dates,
            reservation: request.reservation.clone(),
            special_requests: request.special_requests.clone(),
            created_at: chrono::Utc::now(),
            source: DataSource::Fallback,
        })
    }
}
