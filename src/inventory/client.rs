// client.rs
use crate::config::{ApiConfig, CityConfig};
use crate::domain::{Condition, VehicleRecord};
use crate::inventory::models::{InventoryQuery, InventoryResponse, QueryFields, RawVehicle};
use crate::inventory::FetchError;
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Anything that can list a city's current inventory for one condition.
pub trait InventorySource {
    fn fetch(
        &self,
        city: &CityConfig,
        condition: Condition,
    ) -> Result<Vec<VehicleRecord>, FetchError>;
}

pub struct TeslaInventoryClient {
    client: Client,
    api: ApiConfig,
}

impl TeslaInventoryClient {
    pub fn new(api: ApiConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, api })
    }

    fn search_url(&self, query: &InventoryQuery) -> Result<Url, FetchError> {
        let json =
            serde_json::to_string(query).map_err(|e| FetchError::JsonParse(e.to_string()))?;

        Url::parse_with_params(&self.api.search_url, &[("query", json)])
            .map_err(|e| FetchError::UnexpectedShape(format!("bad search url: {e}")))
    }
}

impl InventorySource for TeslaInventoryClient {
    fn fetch(
        &self,
        city: &CityConfig,
        condition: Condition,
    ) -> Result<Vec<VehicleRecord>, FetchError> {
        let query = build_query(city, condition, &self.api);
        let url = self.search_url(&query)?;
        let start = Instant::now();

        debug!(city = %city.name, %condition, %url, "Querying inventory");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let vehicles = parse_inventory_response(&text, &city.name, condition)?;

        info!(
            city = %city.name,
            %condition,
            count = vehicles.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched inventory"
        );

        Ok(vehicles)
    }
}

/// Builds the first-page search payload for one city and condition.
pub fn build_query(city: &CityConfig, condition: Condition, api: &ApiConfig) -> InventoryQuery {
    InventoryQuery {
        query: QueryFields {
            model: api.model.clone(),
            condition: condition.as_str().to_string(),
            options: serde_json::Map::new(),
            arrange_by: api.arrange_by.clone(),
            order: api.order.clone(),
            market: city.market.clone(),
            language: api.language.clone(),
            super_region: api.super_region.clone(),
            lng: city.longitude,
            lat: city.latitude,
            zip: city.postal_code.clone(),
            range: city.range,
            region: city.region.clone(),
        },
        offset: 0,
        count: api.page_size,
        outside_offset: 0,
        outside_search: false,
    }
}

/// Normalizes a raw search response body into records for `city`.
///
/// A zero match count short-circuits: the API sends `results` in a different
/// shape when nothing matched, so it is not inspected at all.
pub fn parse_inventory_response(
    body: &str,
    city: &str,
    condition: Condition,
) -> Result<Vec<VehicleRecord>, FetchError> {
    let response: InventoryResponse =
        serde_json::from_str(body).map_err(|e| FetchError::JsonParse(e.to_string()))?;

    let total = response.total_matches_found.value().ok_or_else(|| {
        FetchError::UnexpectedShape("total_matches_found is not a number".to_string())
    })?;

    if total == 0 {
        return Ok(Vec::new());
    }

    let entries = match response.results {
        Value::Array(entries) => entries,
        other => {
            return Err(FetchError::UnexpectedShape(format!(
                "results is not an array: {}",
                json_kind(&other)
            )))
        }
    };

    entries
        .into_iter()
        .map(|entry| {
            let raw: RawVehicle =
                serde_json::from_value(entry).map_err(|e| FetchError::JsonParse(e.to_string()))?;
            normalize(raw, city, condition)
        })
        .collect()
}

fn normalize(raw: RawVehicle, city: &str, condition: Condition) -> Result<VehicleRecord, FetchError> {
    let paint = first_option(&raw.vin, "PAINT", &raw.paint)?;
    let interior_color = first_option(&raw.vin, "INTERIOR", &raw.interior)?;
    let trim = first_option(&raw.vin, "TRIM", &raw.trim)?;
    let wheels = first_option(&raw.vin, "WHEELS", &raw.wheels)?;

    Ok(VehicleRecord {
        year: scalar_text(&raw.vin, "Year", &raw.year)?,
        price: scalar_text(&raw.vin, "Price", &raw.price)?,
        name: raw.trim_name,
        paint,
        interior_color,
        trim,
        wheels,
        city: city.to_string(),
        city_granular: raw.city,
        is_new: condition.is_new(),
        is_demo: raw.is_demo,
        vin: raw.vin,
    })
}

fn first_option(vin: &str, field: &'static str, values: &[String]) -> Result<String, FetchError> {
    values
        .first()
        .cloned()
        .ok_or_else(|| FetchError::EmptyOptionList {
            vin: vin.to_string(),
            field,
        })
}

fn scalar_text(vin: &str, field: &str, value: &Value) -> Result<String, FetchError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(FetchError::UnexpectedShape(format!(
            "{field} of {vin} is {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
