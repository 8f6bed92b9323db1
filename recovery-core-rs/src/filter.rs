//! Constraint filter applied between normalization and decision.

use std::sync::Arc;

use crate::models::{Constraints, NormalizedOffer};

/// Keep offers within the stop limit, preserving input order.
pub fn filter_offers_by_constraints(
    offers: &[Arc<NormalizedOffer>],
    constraints: &Constraints,
) -> Vec<Arc<NormalizedOffer>> {
    let max_stops = constraints.effective_max_stops();
    offers
        .iter()
        .filter(|offer| offer.stops <= max_stops)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn offer(id: &str, stops: u32) -> Arc<NormalizedOffer> {
        Arc::new(NormalizedOffer {
            offer_id: id.to_string(),
            total_price: 100.0,
            currency: "USD".to_string(),
            total_duration: "PT2H".to_string(),
            stops,
            route: vec![],
            carriers: vec![],
            raw: Value::Null,
        })
    }

    fn ids(offers: &[Arc<NormalizedOffer>]) -> Vec<&str> {
        offers.iter().map(|o| o.offer_id.as_str()).collect()
    }

    #[test]
    fn test_strict_constraints_drop_multi_stop() {
        let offers = vec![offer("a", 0), offer("b", 2), offer("c", 1), offer("d", 3)];
        let kept = filter_offers_by_constraints(&offers, &Constraints::new(45, 1, true));
        assert_eq!(ids(&kept), vec!["a", "c"]);
    }

    #[test]
    fn test_absent_max_stops_defaults_to_two() {
        let offers = vec![offer("a", 3), offer("b", 2), offer("c", 0)];
        let kept = filter_offers_by_constraints(&offers, &Constraints::default());
        assert_eq!(ids(&kept), vec!["b", "c"]);

        let junk: Constraints = serde_json::from_value(json!({ "max_stops": "two" })).unwrap();
        let kept = filter_offers_by_constraints(&offers, &junk);
        assert_eq!(ids(&kept), vec!["b", "c"]);
    }

    #[test]
    fn test_negative_or_boolean_max_stops_falls_back_to_two() {
        let offers = vec![offer("a", 3), offer("b", 2), offer("c", 0)];

        for raw in [json!(-1), json!(true), json!(false), json!("-1")] {
            let constraints: Constraints =
                serde_json::from_value(json!({ "max_stops": raw })).unwrap();
            assert_eq!(constraints.max_stops, None);
            let kept = filter_offers_by_constraints(&offers, &constraints);
            assert_eq!(ids(&kept), vec!["b", "c"]);
        }
    }

    #[test]
    fn test_filtered_offers_are_shared_not_copied() {
        let offers = vec![offer("a", 0)];
        let kept = filter_offers_by_constraints(&offers, &Constraints::default());
        assert!(Arc::ptr_eq(&offers[0], &kept[0]));
    }

    #[test]
    fn test_never_exceeds_limit() {
        let offers: Vec<_> = (0..6).map(|s| offer(&s.to_string(), s)).collect();
        for max in 0..6 {
            let kept = filter_offers_by_constraints(&offers, &Constraints::new(35, max, false));
            assert!(kept.iter().all(|o| o.stops <= max));
            assert_eq!(kept.len() as u32, max + 1);
        }
    }
}
