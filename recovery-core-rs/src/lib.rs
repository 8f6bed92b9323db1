//! # Recovery Core
//!
//! Disruption recovery pipeline: triage a flight disruption, search and
//! filter replacement itineraries, then rank them into an explainable
//! recommendation.
//!
//! Every stage with a judgment-backed variant is a trait (`Triager`,
//! `Decider`) so deployments pick rules or delegation per stage. External
//! collaborators (`OfferSearch`, `JudgmentService`, `EventPublisher`) are
//! injected; this crate performs no I/O of its own.

pub mod decision;
pub mod duration;
pub mod events;
pub mod filter;
pub mod judgment;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod rebook;
pub mod triage;

pub use decision::{decide, score_offer, Decider, JudgmentDecider, ScoringDecider, DEFAULT_TOP_K};
pub use duration::{parse_duration_minutes, DURATION_SENTINEL};
pub use events::{topics, EventEnvelope, EventPublisher};
pub use filter::filter_offers_by_constraints;
pub use judgment::{JudgmentService, JudgmentServiceError};
pub use models::{
    Cause, Constraints, DecisionResult, DisruptionEvent, NormalizedOffer, RecommendationRequest,
    RecommendationResponse, RecommendedOffer, SearchParams, TriageResult,
};
pub use normalize::{normalize_offer, normalize_offers};
pub use pipeline::{PipelineError, PipelineRun, RecoveryPipeline};
pub use rebook::{OfferSearch, RebookResult, Rebooker, SearchUnavailable};
pub use triage::{triage, JudgmentTriager, RuleTriager, Triager};
