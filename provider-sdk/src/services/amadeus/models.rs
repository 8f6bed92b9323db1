//! Request and response types for the Amadeus Self-Service API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters for `GET /v2/shopping/flight-offers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightOfferQuery {
    pub origin: String,
    pub destination: String,
    /// YYYY-MM-DD
    pub departure_date: String,
    pub adults: u32,
    pub max_results: u32,
    pub currency_code: String,
}

impl FlightOfferQuery {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure_date: departure_date.into(),
            adults: 1,
            max_results: 5,
            currency_code: "USD".to_string(),
        }
    }

    pub fn adults(mut self, adults: u32) -> Self {
        self.adults = adults;
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("originLocationCode", self.origin.clone()),
            ("destinationLocationCode", self.destination.clone()),
            ("departureDate", self.departure_date.clone()),
            ("adults", self.adults.to_string()),
            ("max", self.max_results.to_string()),
            ("currencyCode", self.currency_code.clone()),
        ]
    }
}

/// OAuth2 client-credentials grant response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Airline reference record, reduced to what callers display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    #[serde(rename = "iataCode")]
    pub iata_code: Option<String>,
    #[serde(rename = "businessName")]
    pub business_name: String,
}

impl Airline {
    /// Business name falls back to the common name, then "Unknown".
    pub fn from_reference(record: &Value) -> Self {
        let name = ["businessName", "commonName"]
            .iter()
            .find_map(|key| record.get(*key).and_then(Value::as_str))
            .unwrap_or("Unknown");

        Self {
            iata_code: record
                .get("iataCode")
                .and_then(Value::as_str)
                .map(str::to_string),
            business_name: name.to_string(),
        }
    }
}

/// Airport location, as returned by `GET /v1/reference-data/locations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Airport {
    /// Missing coordinates read as 0.0 and a missing name as the code.
    pub fn from_location(code: &str, record: &Value) -> Self {
        let geo = record.get("geoCode");
        let coordinate = |key: &str| {
            geo.and_then(|g| g.get(key))
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
        };

        Self {
            code: code.to_string(),
            name: record
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(code)
                .to_string(),
            lat: coordinate("latitude"),
            lon: coordinate("longitude"),
        }
    }
}
