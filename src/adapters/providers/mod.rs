pub mod direct_hotels;
pub mod direct_rentals;
pub mod direct_restaurants;
pub mod proxy;
pub mod sandbox;

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapters::fallback::FallbackGenerator;
use crate::adapters::normalizer;
use crate::adapters::transport::{Credentials, HttpTransport};
use crate::config::types::{BookingConfig, Config};
use crate::domain::booking::{BookingRequest, PriceBreakdown};
use crate::domain::criteria::SearchCriteria;
use crate::domain::inventory::{Domain, InventoryItem};
use crate::error::Result;
use crate::ports::provider::ProviderStrategy;

/// Pick the strategy a domain adapter keeps for its lifetime: direct provider
/// when credentials are configured, else the backend proxy, else the sandbox.
///
/// A strategy whose HTTP client cannot be built is skipped with a warning.
pub fn resolve_strategy(
    domain: Domain,
    config: &Config,
    generator: Arc<FallbackGenerator>,
) -> Arc<dyn ProviderStrategy> {
    let provider = config.providers.for_domain(domain);
    if let (Some(key), Some(base_url)) = (provider.api_key(), provider.resolved_base_url(domain)) {
        match direct(domain, config, key, &base_url, provider.resolved_api_host(domain)) {
            Ok(strategy) => {
                info!(%domain, base_url, "Using direct provider");
                return strategy;
            }
            Err(e) => warn!(%domain, error = %e, "Direct provider unusable, trying next strategy"),
        }
    }

    if let Some(proxy_url) = config.providers.proxy_base_url() {
        match HttpTransport::new(
            format!("{domain}-proxy"),
            &proxy_url,
            &Credentials::None,
            &config.transport,
        ) {
            Ok(transport) => {
                info!(%domain, proxy_url, "Using backend proxy");
                return Arc::new(proxy::ProxyProvider::new(
                    domain,
                    transport,
                    config.fallback.currency.clone(),
                    config.booking.clone(),
                ));
            }
            Err(e) => warn!(%domain, error = %e, "Backend proxy unusable, falling back to sandbox"),
        }
    }

    info!(%domain, "No provider or proxy configured, serving synthetic data");
    Arc::new(sandbox::SandboxProvider::new(
        domain,
        generator,
        config.booking.clone(),
    ))
}

fn direct(
    domain: Domain,
    config: &Config,
    key: &str,
    base_url: &str,
    api_host: Option<String>,
) -> Result<Arc<dyn ProviderStrategy>> {
    let service = format!("{domain}-provider");
    let currency = config.fallback.currency.clone();
    let booking = config.booking.clone();
    let strategy: Arc<dyn ProviderStrategy> = match domain {
        Domain::Hotels => {
            let credentials = Credentials::RapidApi {
                key: key.to_string(),
                host: api_host.unwrap_or_default(),
            };
            let transport = HttpTransport::new(service, base_url, &credentials, &config.transport)?;
            Arc::new(direct_hotels::DirectHotelProvider::new(transport, currency, booking))
        }
        Domain::Rentals => {
            let credentials = Credentials::Bearer(key.to_string());
            let transport = HttpTransport::new(service, base_url, &credentials, &config.transport)?;
            Arc::new(direct_rentals::DirectRentalProvider::new(transport, currency, booking))
        }
        Domain::Restaurants => {
            let credentials = Credentials::Bearer(key.to_string());
            let transport = HttpTransport::new(service, base_url, &credentials, &config.transport)?;
            Arc::new(direct_restaurants::DirectRestaurantProvider::new(
                transport, currency, booking,
            ))
        }
    };
    Ok(strategy)
}

/// Apply the filters upstream could not, then the result limit. Items that
/// came back without a city or country take the searched location's.
pub(crate) fn refine(mut items: Vec<InventoryItem>, criteria: &SearchCriteria) -> Vec<InventoryItem> {
    items.retain(|item| criteria.matches(item));
    for item in &mut items {
        let summary = item.summary_mut();
        if summary.city.trim().is_empty()
            && let Some(city) = criteria.location.city_name()
        {
            summary.city = city.to_string();
        }
        if summary.country.trim().is_empty()
            && let Some(country) = criteria.location.country.as_deref()
        {
            summary.country = country.trim().to_string();
        }
    }
    items.truncate(criteria.effective_limit());
    items
}

/// Price a booking the upstream did not price, from a per-unit estimate.
pub(crate) fn estimate(
    domain: Domain,
    request: &BookingRequest,
    unit_price: Option<f64>,
    currency: &str,
    booking: &BookingConfig,
) -> PriceBreakdown {
    let unit = normalizer::price_or_placeholder(domain, &[unit_price]);
    PriceBreakdown::from_base(
        unit * f64::from(request.billable_quantity(domain)),
        booking.tax_rate,
        booking.service_fee,
        currency,
    )
}
