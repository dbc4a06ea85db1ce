use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

use chrono::NaiveDate;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ListResourceTemplatesResult, ListResourcesResult,
        PaginatedRequestParams, ProtocolVersion, RawResource, RawResourceTemplate,
        ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents,
        ResourceTemplate, ServerCapabilities, ServerInfo,
    },
    schemars,
    service::RequestContext,
    tool, tool_handler, tool_router,
};
use serde::Serialize;

use crate::domain::booking::{BookingRequest, ContactInfo, GuestComposition};
use crate::domain::criteria::{
    AvailabilityQuery, DateRange, Location, ReservationSlot, SearchCriteria, SearchFilters,
};
use crate::domain::envelope::Envelope;
use crate::domain::inventory::{Coordinates, Domain};
use crate::domain::reference::ReferenceList;
use crate::error::GatewayError;
use crate::gateway::Gateway;

const SERVICE: &str = "gateway";

// ---------- Booking store ----------

/// Confirmations issued in this session, exposed as MCP resources under
/// `wc2030://bookings/<confirmation number>`.
#[derive(Clone, Default)]
pub struct BookingStore {
    entries: Arc<RwLock<HashMap<String, BookingEntry>>>,
}

#[derive(Clone)]
struct BookingEntry {
    name: String,
    json: String,
}

impl BookingStore {
    async fn insert(&self, uri: String, name: String, json: String) {
        self.entries
            .write()
            .await
            .insert(uri, BookingEntry { name, json });
    }

    async fn get(&self, uri: &str) -> Option<BookingEntry> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn list(&self) -> Vec<(String, String)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(uri, entry)| (uri.clone(), entry.name.clone()))
            .collect()
    }
}

impl std::fmt::Debug for BookingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingStore").finish()
    }
}

// ---------- Tool parameter types ----------

#[derive(Debug, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct SearchFields {
    /// City to search in (e.g. "Casablanca", "Marrakech", "Tangier")
    pub city: Option<String>,
    /// Country name, narrows ambiguous city names
    pub country: Option<String>,
    /// Latitude, used with longitude when no city is given
    pub latitude: Option<f64>,
    /// Longitude, used with latitude when no city is given
    pub longitude: Option<f64>,
    /// Check-in or pick-up date (YYYY-MM-DD). Must be paired with check_out.
    pub check_in: Option<String>,
    /// Check-out or drop-off date (YYYY-MM-DD). Must be paired with check_in.
    pub check_out: Option<String>,
    /// Restaurant reservation date (YYYY-MM-DD). Must be paired with reservation_time.
    pub reservation_date: Option<String>,
    /// Restaurant reservation time (HH:MM)
    pub reservation_time: Option<String>,
    /// Party size (default: 1)
    pub guests: Option<u32>,
    /// Minimum price per night, day or cover
    pub min_price: Option<f64>,
    /// Maximum price per night, day or cover
    pub max_price: Option<f64>,
    /// Minimum rating on a 0-5 scale
    pub min_rating: Option<f64>,
    /// Amenities or features every result must have
    #[serde(default)]
    pub amenities: Vec<String>,
    /// Property type, vehicle category or cuisine
    pub kind: Option<String>,
    /// Maximum number of results (default 20, at most 50)
    pub limit: Option<u32>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SearchToolParams {
    /// Inventory domain: "hotels", "rentals" or "restaurants"
    pub domain: String,
    #[serde(flatten)]
    pub search: SearchFields,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SearchAllToolParams {
    /// Domains to search (default: all three)
    pub domains: Option<Vec<String>>,
    #[serde(flatten)]
    pub search: SearchFields,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct DetailsToolParams {
    /// Inventory domain: "hotels", "rentals" or "restaurants"
    pub domain: String,
    /// Item id from search results
    pub id: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AvailabilityToolParams {
    /// Inventory domain: "hotels", "rentals" or "restaurants"
    pub domain: String,
    /// Item id from search results
    pub id: String,
    /// Check-in or pick-up date (YYYY-MM-DD), hotels and rentals
    pub check_in: Option<String>,
    /// Check-out or drop-off date (YYYY-MM-DD), hotels and rentals
    pub check_out: Option<String>,
    /// Reservation date (YYYY-MM-DD), restaurants
    pub reservation_date: Option<String>,
    /// Reservation time (HH:MM), restaurants
    pub reservation_time: Option<String>,
    /// Party size (default: 1)
    pub guests: Option<u32>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct BookToolParams {
    /// Inventory domain: "hotels", "rentals" or "restaurants"
    pub domain: String,
    /// Item id to book
    pub item_id: String,
    /// Check-in or pick-up date (YYYY-MM-DD), required for hotels and rentals
    pub check_in: Option<String>,
    /// Check-out or drop-off date (YYYY-MM-DD), required for hotels and rentals
    pub check_out: Option<String>,
    /// Reservation date (YYYY-MM-DD), required for restaurants
    pub reservation_date: Option<String>,
    /// Reservation time (HH:MM), required for restaurants
    pub reservation_time: Option<String>,
    /// Number of adults (default: 1)
    pub adults: Option<u32>,
    /// Number of children
    pub children: Option<u32>,
    /// Rooms or vehicles (default: 1)
    pub units: Option<u32>,
    /// Guest first name
    pub first_name: String,
    /// Guest last name
    pub last_name: String,
    /// Contact e-mail
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Free-text requests passed to the provider
    pub special_requests: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ReferenceToolParams {
    /// Inventory domain: "hotels", "rentals" or "restaurants"
    pub domain: String,
    /// List name: "amenities", "categories", "fuel-types" or "cuisines"
    pub list: String,
}

// ---------- Parameter conversion ----------

fn parse_day(label: &str, value: &str) -> crate::error::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        GatewayError::invalid(format!("invalid {label} '{value}', expected YYYY-MM-DD"))
    })
}

fn date_range(check_in: Option<&str>, check_out: Option<&str>) -> crate::error::Result<Option<DateRange>> {
    match (check_in, check_out) {
        (Some(check_in), Some(check_out)) => DateRange::parse(check_in, check_out).map(Some),
        (None, None) => Ok(None),
        _ => Err(GatewayError::invalid(
            "check_in and check_out must be given together",
        )),
    }
}

fn reservation_slot(date: Option<&str>, time: Option<&str>) -> crate::error::Result<Option<ReservationSlot>> {
    match (date, time) {
        (Some(date), Some(time)) => {
            let slot = ReservationSlot {
                date: parse_day("reservation date", date)?,
                time: time.trim().to_string(),
            };
            slot.validate()?;
            Ok(Some(slot))
        }
        (None, None) => Ok(None),
        _ => Err(GatewayError::invalid(
            "reservation_date and reservation_time must be given together",
        )),
    }
}

impl SearchFields {
    fn to_criteria(&self) -> crate::error::Result<SearchCriteria> {
        let coordinates = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            (None, None) => None,
            _ => {
                return Err(GatewayError::invalid(
                    "latitude and longitude must be given together",
                ));
            }
        };
        Ok(SearchCriteria {
            location: Location {
                city: self.city.clone(),
                country: self.country.clone(),
                coordinates,
            },
            dates: date_range(self.check_in.as_deref(), self.check_out.as_deref())?,
            reservation: reservation_slot(
                self.reservation_date.as_deref(),
                self.reservation_time.as_deref(),
            )?,
            guests: self.guests.unwrap_or(1),
            filters: SearchFilters {
                min_price: self.min_price,
                max_price: self.max_price,
                min_rating: self.min_rating,
                amenities: self.amenities.clone(),
                kind: self.kind.clone(),
            },
            limit: self.limit,
        })
    }
}

impl BookToolParams {
    fn to_request(&self) -> crate::error::Result<BookingRequest> {
        Ok(BookingRequest {
            item_id: self.item_id.clone(),
            dates: date_range(self.check_in.as_deref(), self.check_out.as_deref())?,
            reservation: reservation_slot(
                self.reservation_date.as_deref(),
                self.reservation_time.as_deref(),
            )?,
            guests: GuestComposition {
                adults: self.adults.unwrap_or(1),
                children: self.children.unwrap_or(0),
            },
            contact: ContactInfo {
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
                email: self.email.clone(),
                phone: self.phone.clone(),
            },
            special_requests: self.special_requests.clone(),
            units: self.units,
        })
    }
}

// ---------- Results ----------

/// Envelope JSON as the tool output; a failed envelope is flagged as a tool error.
fn envelope_result<T: Serialize>(envelope: &Envelope<T>) -> CallToolResult {
    match serde_json::to_string_pretty(envelope) {
        Ok(json) if envelope.success => CallToolResult::success(vec![Content::text(json)]),
        Ok(json) => CallToolResult::error(vec![Content::text(json)]),
        Err(e) => CallToolResult::error(vec![Content::text(format!(
            "Error encoding response: {e}"
        ))]),
    }
}

fn rejected(error: &GatewayError) -> CallToolResult {
    envelope_result(&Envelope::<()>::err(error.to_api_error(SERVICE)))
}

#[derive(Clone)]
pub struct GatewayMcpServer {
    gateway: Arc<Gateway>,
    tool_router: ToolRouter<Self>,
    bookings: BookingStore,
}

#[tool_router]
impl GatewayMcpServer {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            tool_router: Self::tool_router(),
            bookings: BookingStore::default(),
        }
    }

    #[tool(
        name = "inventory_search",
        description = "Search hotels, vehicle rentals or restaurants in a city. Returns an envelope whose data is a list of items with id, price, rating, images and amenities. Use the ids with the other tools.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn inventory_search(
        &self,
        Parameters(params): Parameters<SearchToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let domain = match Domain::from_str(&params.domain) {
            Ok(d) => d,
            Err(e) => return Ok(rejected(&e)),
        };
        let criteria = match params.search.to_criteria() {
            Ok(c) => c,
            Err(e) => return Ok(rejected(&e)),
        };
        let envelope = self.gateway.adapter(domain).search(&criteria).await;
        Ok(envelope_result(&envelope))
    }

    #[tool(
        name = "inventory_search_all",
        description = "Search several domains at once (default: hotels, rentals and restaurants) with the same location and filters. Returns one envelope per domain.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn inventory_search_all(
        &self,
        Parameters(params): Parameters<SearchAllToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let domains = match params.domains {
            Some(ref names) if !names.is_empty() => {
                match names.iter().map(|n| Domain::from_str(n)).collect::<crate::error::Result<Vec<_>>>() {
                    Ok(d) => d,
                    Err(e) => return Ok(rejected(&e)),
                }
            }
            _ => Domain::ALL.to_vec(),
        };
        let criteria = match params.search.to_criteria() {
            Ok(c) => c,
            Err(e) => return Ok(rejected(&e)),
        };

        let results: HashMap<Domain, Envelope<_>> = self
            .gateway
            .search_many(&domains, &criteria)
            .await
            .into_iter()
            .collect();
        let all_ok = results.values().all(|e| e.success);
        let envelope = Envelope::with_status(results, if all_ok { 200 } else { 207 });
        Ok(envelope_result(&envelope))
    }

    #[tool(
        name = "inventory_details",
        description = "Full details of one hotel, rental vehicle or restaurant by id.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn inventory_details(
        &self,
        Parameters(params): Parameters<DetailsToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let domain = match Domain::from_str(&params.domain) {
            Ok(d) => d,
            Err(e) => return Ok(rejected(&e)),
        };
        let envelope = self.gateway.adapter(domain).details(&params.id).await;
        Ok(envelope_result(&envelope))
    }

    #[tool(
        name = "inventory_availability",
        description = "Check availability of an item: a date range for hotels and rentals, a reservation date and time for restaurants.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn inventory_availability(
        &self,
        Parameters(params): Parameters<AvailabilityToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let domain = match Domain::from_str(&params.domain) {
            Ok(d) => d,
            Err(e) => return Ok(rejected(&e)),
        };
        let query = date_range(params.check_in.as_deref(), params.check_out.as_deref())
            .and_then(|dates| {
                let reservation = reservation_slot(
                    params.reservation_date.as_deref(),
                    params.reservation_time.as_deref(),
                )?;
                let query = AvailabilityQuery {
                    dates,
                    reservation,
                    guests: params.guests.unwrap_or(1),
                };
                query.validate()?;
                Ok(query)
            });
        let query = match query {
            Ok(q) => q,
            Err(e) => return Ok(rejected(&e)),
        };
        let envelope = self
            .gateway
            .adapter(domain)
            .check_availability(&params.id, &query)
            .await;
        Ok(envelope_result(&envelope))
    }

    #[tool(
        name = "inventory_book",
        description = "Book a hotel room, rental vehicle or restaurant table. Not idempotent: calling twice makes two bookings. On success the data carries a WC2030 confirmation number.",
        annotations(read_only_hint = false, open_world_hint = true)
    )]
    async fn inventory_book(
        &self,
        Parameters(params): Parameters<BookToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let domain = match Domain::from_str(&params.domain) {
            Ok(d) => d,
            Err(e) => return Ok(rejected(&e)),
        };
        let request = match params.to_request() {
            Ok(r) => r,
            Err(e) => return Ok(rejected(&e)),
        };

        let envelope = self.gateway.book(domain, &request).await;
        if let Some(ref confirmation) = envelope.data
            && let Ok(json) = serde_json::to_string_pretty(confirmation)
        {
            let uri = format!("wc2030://bookings/{}", confirmation.confirmation_number);
            let name = format!(
                "Booking {} ({domain} {})",
                confirmation.confirmation_number, confirmation.item_id
            );
            self.bookings.insert(uri, name, json).await;
        }
        Ok(envelope_result(&envelope))
    }

    #[tool(
        name = "inventory_reference_list",
        description = "Static reference values: hotel amenities, rental categories and fuel types, restaurant cuisines.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn inventory_reference_list(
        &self,
        Parameters(params): Parameters<ReferenceToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let parsed = Domain::from_str(&params.domain)
            .and_then(|d| ReferenceList::from_str(&params.list).map(|l| (d, l)));
        let (domain, list) = match parsed {
            Ok(p) => p,
            Err(e) => return Ok(rejected(&e)),
        };
        let envelope = self.gateway.adapter(domain).reference_list(list).await;
        Ok(envelope_result(&envelope))
    }
}

#[tool_handler]
impl ServerHandler for GatewayMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "WC2030 travel-inventory gateway: hotels, vehicle rentals and restaurants in the host cities.\n\
                 \n\
                 Every tool returns an envelope {success, data, error, status, message}. Branch on success.\n\
                 - inventory_search / inventory_search_all: find items and their ids\n\
                 - inventory_details: one item by id\n\
                 - inventory_availability: dates (hotels, rentals) or reservation slot (restaurants)\n\
                 - inventory_book: create a booking; failures are reported, never replaced\n\
                 - inventory_reference_list: amenities, categories, fuel-types, cuisines\n\
                 \n\
                 When message starts with \"served fallback data\" the items are synthetic placeholders.\n\
                 Confirmed bookings are exposed as resources under wc2030://bookings/{confirmation}."
                    .into(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources: Vec<Resource> = self
            .bookings
            .list()
            .await
            .into_iter()
            .map(|(uri, name)| Resource {
                annotations: None,
                raw: RawResource {
                    uri,
                    name,
                    title: None,
                    description: None,
                    mime_type: Some("application/json".into()),
                    size: None,
                    icons: None,
                    meta: None,
                },
            })
            .collect();
        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult {
            resource_templates: vec![ResourceTemplate {
                annotations: None,
                raw: RawResourceTemplate {
                    uri_template: "wc2030://bookings/{confirmation}".into(),
                    name: "Booking Confirmation".into(),
                    title: Some("Booking confirmation".into()),
                    description: Some("Confirmation issued by inventory_book".into()),
                    mime_type: Some("application/json".into()),
                    icons: None,
                },
            }],
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match self.bookings.get(&request.uri).await {
            Some(entry) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(entry.json, request.uri)],
            }),
            None => Err(McpError::resource_not_found(
                format!("resource not found: {}", request.uri),
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::memory_cache::MemoryCache;
    use crate::adapters::fallback::FallbackGenerator;
    use crate::config::types::{Config, FallbackConfig};
    use crate::test_helpers::MockProvider;

    fn extract_text(result: &CallToolResult) -> &str {
        result.content[0]
            .raw
            .as_text()
            .expect("expected text content")
            .text
            .as_str()
    }

    fn envelope_json(result: &CallToolResult) -> serde_json::Value {
        serde_json::from_str(extract_text(result)).unwrap()
    }

    fn make_server(make: impl Fn(Domain) -> MockProvider) -> GatewayMcpServer {
        let gateway = Gateway::with_strategies(
            &Config::default(),
            Arc::new(MemoryCache::new(100)),
            Arc::new(FallbackGenerator::new(&FallbackConfig::default())),
            |domain| Arc::new(make(domain)),
        );
        GatewayMcpServer::new(Arc::new(gateway))
    }

    fn search_params(domain: &str, city: &str) -> SearchToolParams {
        SearchToolParams {
            domain: domain.into(),
            search: SearchFields {
                city: Some(city.into()),
                ..SearchFields::default()
            },
        }
    }

    fn book_params() -> BookToolParams {
        BookToolParams {
            domain: "hotels".into(),
            item_id: "m-1".into(),
            check_in: Some("2030-06-10".into()),
            check_out: Some("2030-06-12".into()),
            reservation_date: None,
            reservation_time: None,
            adults: Some(2),
            children: None,
            units: None,
            first_name: "Hind".into(),
            last_name: "Chraibi".into(),
            email: "hind@example.ma".into(),
            phone: None,
            special_requests: None,
        }
    }

    #[tokio::test]
    async fn search_returns_envelope_json() {
        let server = make_server(MockProvider::new);
        let result = server
            .inventory_search(Parameters(search_params("hotels", "Casablanca")))
            .await
            .unwrap();
        let json = envelope_json(&result);
        assert_eq!(json["success"], true);
        assert_eq!(json["status"], 200);
        assert_eq!(json["data"].as_array().unwrap().len(), 3);
        assert_eq!(json["data"][0]["kind"], "hotel");
        assert_eq!(json["data"][0]["city"], "Casablanca");
    }

    #[tokio::test]
    async fn unknown_domain_is_rejected() {
        let server = make_server(MockProvider::new);
        let result = server
            .inventory_search(Parameters(search_params("flights", "Rabat")))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let json = envelope_json(&result);
        assert_eq!(json["success"], false);
        assert_eq!(json["status"], 400);
        assert!(json["error"]["message"].as_str().unwrap().contains("flights"));
    }

    #[tokio::test]
    async fn half_a_date_range_is_rejected() {
        let server = make_server(MockProvider::new);
        let mut params = search_params("rentals", "Agadir");
        params.search.check_in = Some("2030-06-10".into());
        let result = server.inventory_search(Parameters(params)).await.unwrap();
        assert_eq!(envelope_json(&result)["status"], 400);
    }

    #[tokio::test]
    async fn unreachable_provider_still_succeeds() {
        let server = make_server(MockProvider::unreachable);
        let result = server
            .inventory_details(Parameters(DetailsToolParams {
                domain: "restaurants".into(),
                id: "dar-zellij".into(),
            }))
            .await
            .unwrap();
        let json = envelope_json(&result);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], "dar-zellij");
        assert!(json["message"].as_str().unwrap().starts_with("served fallback data"));
    }

    #[tokio::test]
    async fn booking_is_exposed_as_resource() {
        let server = make_server(MockProvider::new);
        let result = server.inventory_book(Parameters(book_params())).await.unwrap();
        let json = envelope_json(&result);
        assert_eq!(json["status"], 201);
        let number = json["data"]["confirmationNumber"].as_str().unwrap().to_string();
        assert!(number.starts_with("WC2030-"));

        let stored = server
            .bookings
            .get(&format!("wc2030://bookings/{number}"))
            .await
            .unwrap();
        assert!(stored.json.contains(&number));
    }

    #[tokio::test]
    async fn failed_booking_is_a_tool_error() {
        let server = make_server(MockProvider::unreachable);
        let result = server.inventory_book(Parameters(book_params())).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        let json = envelope_json(&result);
        assert_eq!(json["status"], 503);
        assert!(server.bookings.list().await.is_empty());
    }

    #[tokio::test]
    async fn search_all_defaults_to_every_domain() {
        let server = make_server(MockProvider::new);
        let result = server
            .inventory_search_all(Parameters(SearchAllToolParams {
                domains: None,
                search: SearchFields {
                    city: Some("Fes".into()),
                    ..SearchFields::default()
                },
            }))
            .await
            .unwrap();
        let json = envelope_json(&result);
        assert_eq!(json["status"], 200);
        for domain in ["hotels", "rentals", "restaurants"] {
            assert_eq!(json["data"][domain]["success"], true, "{domain}");
        }
    }

    #[tokio::test]
    async fn reference_list_by_name() {
        let server = make_server(MockProvider::new);
        let result = server
            .inventory_reference_list(Parameters(ReferenceToolParams {
                domain: "rentals".into(),
                list: "fuel-types".into(),
            }))
            .await
            .unwrap();
        let json = envelope_json(&result);
        assert_eq!(json["success"], true);
        assert!(!json["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn server_info_enables_tools_and_resources() {
        let server = make_server(MockProvider::new);
        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        assert!(info.instructions.unwrap().contains("inventory_book"));
    }
}
