use serde::{Deserialize, Serialize};
use serde_json::Value;

// request
//  ├── query
//  │    ├── model / condition / market / language / super_region
//  │    ├── arrangeby / order
//  │    ├── zip / region / lat / lng / range
//  │    └── options
//  ├── offset
//  ├── count
//  ├── outsideOffset
//  └── outsideSearch

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    pub query: QueryFields,
    pub offset: u32,
    pub count: u32,
    pub outside_offset: u32,
    pub outside_search: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct QueryFields {
    pub model: String,
    pub condition: String,
    pub options: serde_json::Map<String, Value>,
    #[serde(rename = "arrangeby")]
    pub arrange_by: String,
    pub order: String,
    pub market: String,
    pub language: String,
    pub super_region: String,
    pub lng: f64,
    pub lat: f64,
    pub zip: String,
    pub range: u32,
    pub region: String,
}

// response
//  ├── total_matches_found   (number, or a numeric string)
//  └── results[]
//       ├── VIN
//       ├── City
//       ├── Year / Price      (number or string)
//       ├── TrimName
//       ├── IsDemo
//       └── PAINT / INTERIOR / TRIM / WHEELS   (option code lists)

#[derive(Debug, Deserialize)]
pub struct InventoryResponse {
    pub total_matches_found: MatchCount,
    #[serde(default)]
    pub results: Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MatchCount {
    Number(u64),
    Text(String),
}

impl MatchCount {
    pub fn value(&self) -> Option<u64> {
        match self {
            MatchCount::Number(n) => Some(*n),
            MatchCount::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawVehicle {
    #[serde(rename = "VIN")]
    pub vin: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Year")]
    pub year: Value,
    #[serde(rename = "Price")]
    pub price: Value,
    #[serde(rename = "TrimName")]
    pub trim_name: String,
    #[serde(rename = "IsDemo")]
    pub is_demo: bool,
    #[serde(rename = "PAINT")]
    pub paint: Vec<String>,
    #[serde(rename = "INTERIOR")]
    pub interior: Vec<String>,
    #[serde(rename = "TRIM")]
    pub trim: Vec<String>,
    #[serde(rename = "WHEELS")]
    pub wheels: Vec<String>,
}
