//! Triage → rebook → decide orchestration.

use log::info;
use thiserror::Error;
use uuid::Uuid;

use crate::decision::{Decider, DEFAULT_TOP_K};
use crate::judgment::JudgmentServiceError;
use crate::models::{
    DecisionResult, RecommendationRequest, RecommendationResponse, SearchParams, TriageResult,
};
use crate::rebook::{OfferSearch, Rebooker};
use crate::triage::Triager;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("triage failed: {0}")]
    Triage(#[source] JudgmentServiceError),

    #[error("decision failed: {0}")]
    Decision(#[source] JudgmentServiceError),
}

impl PipelineError {
    pub fn judgment_error(&self) -> &JudgmentServiceError {
        match self {
            PipelineError::Triage(e) | PipelineError::Decision(e) => e,
        }
    }
}

/// Everything a single run produced, for callers that audit the stages.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub response: RecommendationResponse,
    pub triage: TriageResult,
    pub search: SearchParams,
    pub rebook_notes: String,
    pub decision: DecisionResult,
}

/// Stateless between runs; share it behind an `Arc`.
pub struct RecoveryPipeline<T, D, S> {
    triager: T,
    decider: D,
    rebooker: Rebooker<S>,
    top_k: usize,
}

impl<T, D, S> RecoveryPipeline<T, D, S>
where
    T: Triager,
    D: Decider,
    S: OfferSearch,
{
    pub fn new(triager: T, decider: D, search: S) -> Self {
        Self {
            triager,
            decider,
            rebooker: Rebooker::new(search),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub async fn run(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, PipelineError> {
        self.run_detailed(request).await.map(|run| run.response)
    }

    /// Run every stage in order. A failing delegated stage aborts the run
    /// with no partial result.
    pub async fn run_detailed(
        &self,
        request: &RecommendationRequest,
    ) -> Result<PipelineRun, PipelineError> {
        let trace_id = Uuid::new_v4().to_string();

        let triage = self
            .triager
            .triage(&request.disruption)
            .await
            .map_err(PipelineError::Triage)?;
        info!(
            "[{}] Triage: severity={:.2} cause={} max_stops={}",
            trace_id,
            triage.severity_score,
            triage.cause,
            triage.constraints.effective_max_stops()
        );

        let search = SearchParams::from_request(request);
        let rebook = self.rebooker.rebook(&search, &triage.constraints).await;
        info!("[{}] Rebook: {}", trace_id, rebook.notes);

        let decision = self
            .decider
            .decide(&rebook.offers, &triage.notes, self.top_k)
            .await
            .map_err(PipelineError::Decision)?;
        info!(
            "[{}] Decision: {} recommended, confidence={:.2} ({})",
            trace_id,
            decision.recommended.len(),
            decision.confidence,
            decision.notes
        );

        let response = RecommendationResponse {
            trace_id,
            severity_score: triage.severity_score,
            recommended_offers: decision.recommended.clone(),
            reasoning: decision.reasoning.clone(),
            confidence: decision.confidence,
        };

        Ok(PipelineRun {
            response,
            triage,
            search,
            rebook_notes: rebook.notes,
            decision,
        })
    }
}
