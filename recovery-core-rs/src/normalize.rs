//! Flight-offer normalization.
//!
//! Provider payloads follow the Amadeus flight-offers shape:
//! `{"data": [{"id", "price": {"grandTotal", "currency"}, "itineraries":
//! [{"duration", "segments": [{"departure": {"iataCode"}, "arrival":
//! {"iataCode"}, "carrierCode"}]}]}]}`. Normalization never fails; a
//! malformed record becomes a zero-valued offer.

use serde_json::{Map, Value};

use crate::models::NormalizedOffer;

const CONTAINER_KEYS: [&str; 2] = ["offers", "data"];

/// Normalize every offer record in a provider payload.
pub fn normalize_offers(payload: &Value) -> Vec<NormalizedOffer> {
    offer_records(payload).iter().map(normalize_offer).collect()
}

fn offer_records(payload: &Value) -> &[Value] {
    CONTAINER_KEYS
        .iter()
        .find_map(|key| {
            payload
                .get(*key)
                .and_then(Value::as_array)
                .filter(|records| !records.is_empty())
        })
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Normalize a single provider record.
pub fn normalize_offer(record: &Value) -> NormalizedOffer {
    let empty = Map::new();
    let price = record.get("price").and_then(Value::as_object).unwrap_or(&empty);

    let itinerary = record
        .get("itineraries")
        .and_then(Value::as_array)
        .and_then(|itineraries| itineraries.first());

    let segments: &[Value] = itinerary
        .and_then(|it| it.get("segments"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    NormalizedOffer {
        offer_id: offer_id(record.get("id")),
        total_price: total_price(price),
        currency: price
            .get("currency")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .unwrap_or("USD")
            .to_string(),
        total_duration: itinerary
            .and_then(|it| it.get("duration"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        stops: segments.len().saturating_sub(1) as u32,
        route: route(segments),
        carriers: carriers(segments),
        raw: record.clone(),
    }
}

fn offer_id(id: Option<&Value>) -> String {
    match id {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn total_price(price: &Map<String, Value>) -> f64 {
    let parsed = ["grandTotal", "total"]
        .iter()
        .find_map(|key| match price.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().parse::<f64>().ok()),
            Some(Value::Number(n)) => Some(n.as_f64()),
            _ => None,
        })
        .flatten()
        .unwrap_or(0.0);

    if parsed.is_finite() && parsed > 0.0 {
        parsed
    } else {
        0.0
    }
}

fn airport(segment: &Value, side: &str) -> Option<String> {
    segment
        .get(side)
        .and_then(|s| s.get("iataCode"))
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

/// First departure airport, then every arrival, consecutive repeats collapsed.
fn route(segments: &[Value]) -> Vec<String> {
    let mut route: Vec<String> = Vec::with_capacity(segments.len() + 1);

    let departure = segments.first().and_then(|s| airport(s, "departure"));
    let arrivals = segments.iter().map(|s| airport(s, "arrival"));

    for code in std::iter::once(departure).chain(arrivals).flatten() {
        if route.last() != Some(&code) {
            route.push(code);
        }
    }
    route
}

fn carriers(segments: &[Value]) -> Vec<String> {
    let mut carriers: Vec<String> = Vec::new();
    for code in segments
        .iter()
        .filter_map(|s| s.get("carrierCode").and_then(Value::as_str))
        .filter(|code| !code.is_empty())
    {
        if !carriers.iter().any(|seen| seen == code) {
            carriers.push(code.to_string());
        }
    }
    carriers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segment(from: &str, to: &str, carrier: &str) -> Value {
        json!({
            "departure": { "iataCode": from },
            "arrival": { "iataCode": to },
            "carrierCode": carrier,
        })
    }

    #[test]
    fn test_normalizes_amadeus_offer() {
        let payload = json!({
            "data": [{
                "id": "1",
                "price": { "grandTotal": "412.30", "total": "400.00", "currency": "EUR" },
                "itineraries": [{
                    "duration": "PT8H12M",
                    "segments": [
                        segment("SFO", "SEA", "AS"),
                        segment("SEA", "ORD", "UA"),
                        segment("ORD", "JFK", "UA"),
                    ],
                }],
            }],
        });

        let offers = normalize_offers(&payload);
        assert_eq!(offers.len(), 1);

        let offer = &offers[0];
        assert_eq!(offer.offer_id, "1");
        assert_eq!(offer.total_price, 412.30);
        assert_eq!(offer.currency, "EUR");
        assert_eq!(offer.total_duration, "PT8H12M");
        assert_eq!(offer.stops, 2);
        assert_eq!(offer.route, vec!["SFO", "SEA", "ORD", "JFK"]);
        assert_eq!(offer.carriers, vec!["AS", "UA"]);
        assert_eq!(offer.raw["id"], "1");
    }

    #[test]
    fn test_route_collapses_consecutive_repeats() {
        let record = json!({
            "itineraries": [{ "segments": [segment("A", "A", "XX"), segment("A", "B", "XX")] }],
        });
        let offer = normalize_offer(&record);
        assert_eq!(offer.route, vec!["A", "B"]);
        assert_eq!(offer.stops, 1);
    }

    #[test]
    fn test_offers_key_wins_when_non_empty() {
        let payload = json!({
            "offers": [{ "id": "from-offers" }],
            "data": [{ "id": "from-data" }],
        });
        assert_eq!(normalize_offers(&payload)[0].offer_id, "from-offers");

        let payload = json!({ "offers": [], "data": [{ "id": 7 }] });
        assert_eq!(normalize_offers(&payload)[0].offer_id, "7");
    }

    #[test]
    fn test_unrecognized_payload_is_empty() {
        assert!(normalize_offers(&json!({})).is_empty());
        assert!(normalize_offers(&json!({ "data": "nope" })).is_empty());
        assert!(normalize_offers(&json!(null)).is_empty());
    }

    #[test]
    fn test_malformed_record_is_zero_valued_and_batch_survives() {
        let payload = json!({
            "data": [
                { "id": "bad", "price": { "grandTotal": "abc" } },
                "not an object",
                { "id": "good", "price": { "total": 99.5 } },
            ],
        });

        let offers = normalize_offers(&payload);
        assert_eq!(offers.len(), 3);

        assert_eq!(offers[0].total_price, 0.0);
        assert_eq!(offers[0].total_duration, "");
        assert_eq!(offers[0].stops, 0);
        assert!(offers[0].route.is_empty());
        assert!(offers[0].carriers.is_empty());

        assert_eq!(offers[1].offer_id, "");
        assert_eq!(offers[1].currency, "USD");

        assert_eq!(offers[2].total_price, 99.5);
    }

    #[test]
    fn test_negative_price_is_clamped() {
        let offer = normalize_offer(&json!({ "price": { "grandTotal": "-12.00" } }));
        assert_eq!(offer.total_price, 0.0);
    }

    #[test]
    fn test_only_first_itinerary_counts() {
        let record = json!({
            "itineraries": [
                { "duration": "PT2H", "segments": [segment("LAX", "SFO", "UA")] },
                { "duration": "PT9H", "segments": [segment("SFO", "DEN", "UA"), segment("DEN", "LAX", "F9")] },
            ],
        });
        let offer = normalize_offer(&record);
        assert_eq!(offer.total_duration, "PT2H");
        assert_eq!(offer.stops, 0);
        assert_eq!(offer.route, vec!["LAX", "SFO"]);
    }
}
