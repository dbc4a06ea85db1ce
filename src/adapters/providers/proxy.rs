use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapters::normalizer::{self, BookingReplyShape, ProviderPayload};
use crate::adapters::transport::{HttpTransport, path_segment};
use crate::config::types::BookingConfig;
use crate::domain::booking::{BookingConfirmation, BookingRequest};
use crate::domain::criteria::{AvailabilityQuery, SearchCriteria};
use crate::domain::envelope::{ApiError, Envelope};
use crate::domain::inventory::{AvailabilityInfo, DataSource, Domain, InventoryItem};
use crate::domain::reference::ReferenceList;
use crate::error::{GatewayError, Result};
use crate::ports::provider::ProviderStrategy;

const BOOKING_REPLY: BookingReplyShape<'static> = BookingReplyShape {
    id: &["/bookingId", "/id", "/reservationId"],
    status: &["/status"],
    total: &["/price/total", "/totalPrice", "/total"],
    currency: &["/price/currency", "/currency"],
};

/// Internal backend that already speaks the canonical model, wrapped in envelopes.
pub struct ProxyProvider {
    domain: Domain,
    transport: HttpTransport,
    currency: String,
    booking: BookingConfig,
}

impl ProxyProvider {
    pub fn new(
        domain: Domain,
        transport: HttpTransport,
        currency: String,
        booking: BookingConfig,
    ) -> Self {
        Self {
            domain,
            transport,
            currency,
            booking,
        }
    }

    fn path(&self, tail: &str) -> String {
        format!("/{}/{tail}", self.domain.proxy_root())
    }

    /// Split a reply body into the envelope outcome. A body that is not an
    /// envelope at all is a malformed response.
    fn envelope(&self, body: Value) -> Result<std::result::Result<Value, ApiError>> {
        let service = self.transport.service();
        serde_json::from_value::<Envelope<Value>>(body)
            .map(|envelope| envelope.into_result(service))
            .map_err(|e| GatewayError::malformed(service, format!("response is not an envelope: {e}")))
    }

    /// GET a proxy route and return the envelope's `data`. A failed envelope
    /// becomes an HTTP error so reads can recover from it.
    async fn read(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let body = self.transport.get_json(path, query).await?;
        self.envelope(body)?.map_err(|api| {
            warn!(service = %api.service, status = api.status, message = %api.message, "Proxy reported failure");
            GatewayError::Http {
                service: api.service,
                status: api.status,
                reason: api.message,
            }
        })
    }

    fn decode<T: DeserializeOwned>(&self, data: Value, what: &str) -> Result<T> {
        serde_json::from_value(data).map_err(|e| {
            GatewayError::malformed(self.transport.service(), format!("{what} does not decode: {e}"))
        })
    }

    fn item(&self, raw: &Value) -> Result<InventoryItem> {
        Ok(ProviderPayload::Canonical(self.domain, raw)
            .normalize(&self.currency)?
            .with_source(DataSource::Proxy))
    }
}

fn availability_pairs(query: &AvailabilityQuery) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(dates) = query.dates {
        pairs.push(("checkIn".into(), dates.check_in.to_string()));
        pairs.push(("checkOut".into(), dates.check_out.to_string()));
    }
    if let Some(ref slot) = query.reservation {
        pairs.push(("date".into(), slot.date.to_string()));
        pairs.push(("time".into(), slot.time.trim().to_string()));
    }
    pairs.push(("guests".into(), query.guests.to_string()));
    pairs
}

#[async_trait]
impl ProviderStrategy for ProxyProvider {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn source(&self) -> DataSource {
        DataSource::Proxy
    }

    fn service(&self) -> &str {
        self.transport.service()
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<InventoryItem>> {
        criteria.validate()?;
        let data = self
            .read(&self.path("search"), &criteria.to_query_pairs())
            .await?;
        let items = normalizer::map_items(self.service(), &data, &["/items", "/results"], |raw| {
            self.item(raw)
        })?;
        debug!(domain = %self.domain, count = items.len(), "Proxy search results");
        Ok(super::refine(items, criteria))
    }

    async fn details(&self, id: &str) -> Result<InventoryItem> {
        let data = self.read(&self.path(&path_segment(id)), &[]).await?;
        self.item(&data)
    }

    async fn availability(&self, id: &str, query: &AvailabilityQuery) -> Result<AvailabilityInfo> {
        query.validate()?;
        let path = self.path(&format!("{}/availability", path_segment(id)));
        let data = self.read(&path, &availability_pairs(query)).await?;
        let mut info: AvailabilityInfo = self.decode(data, "availability")?;
        if info.domain != self.domain {
            return Err(GatewayError::malformed(
                self.service(),
                format!("availability is for {}, expected {}", info.domain, self.domain),
            ));
        }
        info.source = DataSource::Proxy;
        Ok(info)
    }

    async fn book(&self, request: &BookingRequest) -> Result<BookingConfirmation> {
        let service = self.service().to_string();
        let body = serde_json::to_value(request)?;
        let path = self.path(self.domain.booking_segment());

        let reply = self
            .transport
            .post(&path, &body)
            .await
            .map_err(|e| e.into_booking_failure(&service))?;

        let data = match self.envelope(reply.body.clone()) {
            // The proxy's own error is what the caller sees.
            Ok(outcome) => outcome.map_err(GatewayError::BookingFailure)?,
            Err(not_envelope) => {
                let error = match reply.into_success(&service) {
                    Ok(_) => not_envelope,
                    Err(http) => http,
                };
                return Err(error.into_booking_failure(&service));
            }
        };

        let estimate = super::estimate(self.domain, request, None, &self.currency, &self.booking);
        let mut confirmation = normalizer::confirmation_from_reply(
            self.domain,
            request,
            &data,
            &BOOKING_REPLY,
            estimate,
        );
        confirmation.source = DataSource::Proxy;
        Ok(confirmation)
    }

    async fn reference_list(&self, list: ReferenceList) -> Result<Vec<String>> {
        let data = self
            .read(&self.path(&format!("reference/{}", list.as_str())), &[])
            .await?;
        self.decode(data, "reference list")
    }
}
