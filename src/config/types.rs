use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::inventory::Domain;
use crate::error::{GatewayError, Result};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub booking: BookingConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        if self.transport.request_timeout_secs == 0 {
            return Err(GatewayError::Configuration(
                "transport.request_timeout_secs must be positive".into(),
            ));
        }
        if self.booking.confirmation_prefix.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "booking.confirmation_prefix cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Extra attempts for idempotent reads. Bookings are never retried.
    #[serde(default = "default_read_retries")]
    pub read_retries: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_timeout(),
            read_retries: default_read_retries(),
        }
    }
}

/// Credentials and endpoints for one direct provider.
#[derive(Clone, Deserialize, Serialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Host header some API marketplaces require next to the key.
    #[serde(default)]
    pub api_host: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("api_host", &self.api_host)
            .finish()
    }
}

impl ProviderConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn resolved_base_url(&self, domain: Domain) -> Option<String> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| u.trim_end_matches('/').to_string())
            .or_else(|| default_provider_base_url(domain).map(String::from))
    }

    pub fn resolved_api_host(&self, domain: Domain) -> Option<String> {
        self.api_host
            .clone()
            .or_else(|| default_provider_api_host(domain).map(String::from))
    }

    /// Direct access needs both a key and somewhere to send it.
    pub fn has_credentials(&self, domain: Domain) -> bool {
        self.api_key().is_some() && self.resolved_base_url(domain).is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub hotels: ProviderConfig,
    #[serde(default)]
    pub rentals: ProviderConfig,
    #[serde(default)]
    pub restaurants: ProviderConfig,
    /// Base URL of the backend proxy that already speaks the canonical shape.
    #[serde(default)]
    pub proxy_base_url: Option<String>,
}

impl ProvidersConfig {
    pub fn for_domain(&self, domain: Domain) -> &ProviderConfig {
        match domain {
            Domain::Hotels => &self.hotels,
            Domain::Rentals => &self.rentals,
            Domain::Restaurants => &self.restaurants,
        }
    }

    pub fn for_domain_mut(&mut self, domain: Domain) -> &mut ProviderConfig {
        match domain {
            Domain::Hotels => &mut self.hotels,
            Domain::Rentals => &mut self.rentals,
            Domain::Restaurants => &mut self.restaurants,
        }
    }

    pub fn proxy_base_url(&self) -> Option<String> {
        self.proxy_base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| u.trim_end_matches('/').to_string())
    }
}

/// Cached operations, each with its own staleness and eviction windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Search,
    Details,
    Availability,
    Reference,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Details => "details",
            Self::Availability => "availability",
            Self::Reference => "reference",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CachePolicy {
    pub stale_secs: u64,
    pub evict_secs: u64,
}

impl CachePolicy {
    pub const fn new(stale_secs: u64, evict_secs: u64) -> Self {
        Self {
            stale_secs,
            evict_secs,
        }
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }

    pub fn evict_after(&self) -> Duration {
        Duration::from_secs(self.evict_secs)
    }

    fn validate(&self, label: &str) -> Result<()> {
        if self.stale_secs > self.evict_secs {
            return Err(GatewayError::Configuration(format!(
                "cache policy '{label}': stale_secs ({}) exceeds evict_secs ({})",
                self.stale_secs, self.evict_secs
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CachePolicies {
    #[serde(default = "default_search_policy")]
    pub search: CachePolicy,
    #[serde(default = "default_details_policy")]
    pub details: CachePolicy,
    #[serde(default = "default_availability_policy")]
    pub availability: CachePolicy,
    #[serde(default = "default_reference_policy")]
    pub reference: CachePolicy,
}

impl Default for CachePolicies {
    fn default() -> Self {
        Self {
            search: default_search_policy(),
            details: default_details_policy(),
            availability: default_availability_policy(),
            reference: default_reference_policy(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CachePolicyOverride {
    pub domain: Domain,
    pub operation: Operation,
    pub stale_secs: u64,
    pub evict_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default)]
    pub policies: CachePolicies,
    #[serde(default)]
    pub overrides: Vec<CachePolicyOverride>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            policies: CachePolicies::default(),
            overrides: Vec::new(),
        }
    }
}

impl CacheConfig {
    /// Look up the policy for a (domain, operation) pair, overrides first.
    pub fn policy(&self, domain: Domain, operation: Operation) -> CachePolicy {
        if let Some(o) = self
            .overrides
            .iter()
            .rev()
            .find(|o| o.domain == domain && o.operation == operation)
        {
            return CachePolicy::new(o.stale_secs, o.evict_secs);
        }
        match operation {
            Operation::Search => self.policies.search,
            Operation::Details => self.policies.details,
            Operation::Availability => self.policies.availability,
            Operation::Reference => self.policies.reference,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.policies.search.validate("search")?;
        self.policies.details.validate("details")?;
        self.policies.availability.validate("availability")?;
        self.policies.reference.validate("reference")?;
        for o in &self.overrides {
            CachePolicy::new(o.stale_secs, o.evict_secs)
                .validate(&format!("{}/{}", o.domain, o.operation.as_str()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_city")]
    pub default_city: String,
    #[serde(default = "default_country")]
    pub default_country: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            default_city: default_city(),
            default_country: default_country(),
            currency: default_currency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BookingConfig {
    #[serde(default = "default_confirmation_prefix")]
    pub confirmation_prefix: String,
    /// Applied by the sandbox strategy when it prices a booking locally.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    #[serde(default)]
    pub service_fee: f64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            confirmation_prefix: default_confirmation_prefix(),
            tax_rate: default_tax_rate(),
            service_fee: 0.0,
        }
    }
}

fn default_user_agent() -> String {
    concat!("wc2030-gateway/", env!("CARGO_PKG_VERSION")).into()
}

fn default_timeout() -> u64 {
    10
}

fn default_read_retries() -> u32 {
    1
}

fn default_provider_base_url(domain: Domain) -> Option<&'static str> {
    match domain {
        Domain::Hotels => Some("https://booking-com.p.rapidapi.com"),
        Domain::Restaurants => Some("https://api.yelp.com/v3"),
        Domain::Rentals => None,
    }
}

fn default_provider_api_host(domain: Domain) -> Option<&'static str> {
    match domain {
        Domain::Hotels => Some("booking-com.p.rapidapi.com"),
        Domain::Rentals | Domain::Restaurants => None,
    }
}

fn default_max_entries() -> usize {
    500
}

fn default_search_policy() -> CachePolicy {
    CachePolicy::new(300, 600)
}

fn default_details_policy() -> CachePolicy {
    CachePolicy::new(600, 1800)
}

fn default_availability_policy() -> CachePolicy {
    CachePolicy::new(90, 300)
}

fn default_reference_policy() -> CachePolicy {
    CachePolicy::new(3600, 86400)
}

fn default_seed() -> u64 {
    2030
}

fn default_city() -> String {
    "Casablanca".into()
}

fn default_country() -> String {
    "Morocco".into()
}

fn default_currency() -> String {
    "MAD".into()
}

fn default_confirmation_prefix() -> String {
    "WC2030".into()
}

fn default_tax_rate() -> f64 {
    0.1
}
