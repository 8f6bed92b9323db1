//! Rebook stage: search, normalize, filter.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

use crate::filter::filter_offers_by_constraints;
use crate::models::{Constraints, NormalizedOffer, SearchParams};
use crate::normalize::normalize_offers;

/// The offer provider could not be reached or refused the search.
#[derive(Debug, Error)]
#[error("offer search unavailable: {0}")]
pub struct SearchUnavailable(pub String);

/// External flight-offer search.
#[async_trait]
pub trait OfferSearch: Send + Sync {
    async fn search(&self, params: &SearchParams) -> Result<Value, SearchUnavailable>;
}

#[async_trait]
impl<S: OfferSearch + ?Sized> OfferSearch for Arc<S> {
    async fn search(&self, params: &SearchParams) -> Result<Value, SearchUnavailable> {
        (**self).search(params).await
    }
}

/// Candidate offers that survived the constraints.
#[derive(Debug, Clone, Default)]
pub struct RebookResult {
    pub offers: Vec<Arc<NormalizedOffer>>,
    pub notes: String,
}

pub struct Rebooker<S> {
    search: S,
}

impl<S: OfferSearch> Rebooker<S> {
    pub fn new(search: S) -> Self {
        Self { search }
    }

    /// Provider failure degrades to an empty candidate list rather than an
    /// error; the decision stage then reports that nothing was available.
    pub async fn rebook(&self, params: &SearchParams, constraints: &Constraints) -> RebookResult {
        let payload = match self.search.search(params).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    "Offer search for {}->{} failed, continuing without offers: {}",
                    params.origin, params.destination, e
                );
                return RebookResult {
                    offers: Vec::new(),
                    notes: "search_unavailable".to_string(),
                };
            }
        };

        let normalized: Vec<Arc<NormalizedOffer>> =
            normalize_offers(&payload).into_iter().map(Arc::new).collect();
        let offers = filter_offers_by_constraints(&normalized, constraints);

        debug!(
            "Rebook {}->{}: {} normalized, {} within max_stops={}",
            params.origin,
            params.destination,
            normalized.len(),
            offers.len(),
            constraints.effective_max_stops()
        );

        RebookResult {
            notes: format!("normalized={}, after_constraints={}", normalized.len(), offers.len()),
            offers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedSearch(Option<Value>);

    #[async_trait]
    impl OfferSearch for FixedSearch {
        async fn search(&self, _params: &SearchParams) -> Result<Value, SearchUnavailable> {
            self.0
                .clone()
                .ok_or_else(|| SearchUnavailable("503 from provider".to_string()))
        }
    }

    fn params() -> SearchParams {
        SearchParams {
            origin: "SFO".to_string(),
            destination: "ORD".to_string(),
            departure_date: Some("2025-12-31".to_string()),
            adults: 1,
            max_results: 5,
        }
    }

    fn with_stops(id: &str, segments: usize) -> Value {
        let segments: Vec<Value> = (0..segments)
            .map(|i| json!({
                "departure": { "iataCode": format!("X{}", i) },
                "arrival": { "iataCode": format!("X{}", i + 1) },
                "carrierCode": "UA",
            }))
            .collect();
        json!({ "id": id, "itineraries": [{ "duration": "PT3H", "segments": segments }] })
    }

    #[tokio::test]
    async fn test_rebook_filters_and_reports_counts() {
        let payload = json!({ "data": [with_stops("a", 1), with_stops("b", 3), with_stops("c", 2)] });
        let rebooker = Rebooker::new(FixedSearch(Some(payload)));

        let result = rebooker.rebook(&params(), &Constraints::new(45, 1, true)).await;
        let ids: Vec<_> = result.offers.iter().map(|o| o.offer_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(result.notes, "normalized=3, after_constraints=2");
    }

    #[tokio::test]
    async fn test_rebook_degrades_when_search_unavailable() {
        let rebooker = Rebooker::new(FixedSearch(None));
        let result = rebooker.rebook(&params(), &Constraints::default()).await;
        assert!(result.offers.is_empty());
        assert_eq!(result.notes, "search_unavailable");
    }
}
