//! Ensemble combiner
//!
//! Fans out one inference+reduction worker per requested model, then folds
//! the successful score sets in a single-threaded merge pass after the join.
//! Workers own their model handle and taggram exclusively; nothing mutable
//! is shared across them, so the merge needs no locking and is independent
//! of completion order.
//!
//! Combination rule: per-tag weights are **summed** across models, then
//! divided by the number of models that actually succeeded. Agreement
//! between models outranks any single model's confidence, and partial
//! failure only lowers the scores' ceiling instead of skewing them.

use crate::config::EnsembleConfig;
use crate::error::InferenceError;
use crate::reducer::reduce_taggram;
use crate::types::{
    ModelId, ModelInference, ModelScoreSet, ModelSkip, Provenance, SuggestionResult, TagScore,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-worker outcome: a reduced score set, or a recorded skip
enum ModelOutcome {
    Reduced(ModelScoreSet),
    Skipped(ModelSkip),
}

/// Ensemble combiner over a model inference backend
pub struct EnsembleCombiner {
    inference: Arc<dyn ModelInference>,
}

impl EnsembleCombiner {
    pub fn new(inference: Arc<dyn ModelInference>) -> Self {
        Self { inference }
    }

    /// Produce ensemble genre suggestions for one audio file
    ///
    /// Per-model failures are contained as skips and recorded in the
    /// result's provenance. Total failure across all models yields an empty
    /// result, never an error.
    pub async fn suggest(&self, audio_path: &Path, config: &EnsembleConfig) -> SuggestionResult {
        let roster = ModelId::roster(config.model_count);
        // Substitution would double-count a model already in the roster
        let allow_fallback = !roster.contains(&ModelId::FALLBACK);

        debug!(
            audio_path = %audio_path.display(),
            models = roster.len(),
            "Dispatching ensemble workers"
        );

        let mut handles = Vec::with_capacity(roster.len());
        for &model in roster {
            let inference = Arc::clone(&self.inference);
            let path = audio_path.to_path_buf();
            let genre_count = config.per_model_genre_count;
            let fallback = allow_fallback && model == ModelId::PRIORITY;
            handles.push(tokio::spawn(async move {
                run_model(inference, path, model, genre_count, fallback).await
            }));
        }

        // Join point: every worker completes (or fails) before any merging
        let outcomes = futures::future::join_all(handles).await;

        let mut score_sets = Vec::new();
        let mut contributed = Vec::new();
        let mut skipped = Vec::new();

        for (&model, joined) in roster.iter().zip(outcomes) {
            match joined {
                Ok(ModelOutcome::Reduced(set)) => {
                    contributed.push(set.model);
                    score_sets.push(set);
                }
                Ok(ModelOutcome::Skipped(skip)) => {
                    warn!(model = %skip.model, reason = %skip.reason, "Model skipped");
                    skipped.push(skip);
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Ensemble worker panicked");
                    skipped.push(ModelSkip {
                        model,
                        reason: format!("worker failed: {}", e),
                    });
                }
            }
        }

        let scores = fold_score_sets(&score_sets, config.min_weight, config.max_results);

        info!(
            contributed = contributed.len(),
            skipped = skipped.len(),
            suggestions = scores.len(),
            "Ensemble combination complete"
        );

        SuggestionResult {
            scores,
            provenance: Provenance::Ensemble {
                contributed,
                skipped,
            },
        }
    }
}

/// Run inference and reduction for one model, with priority fallback
///
/// If the priority model is unavailable and substitution is allowed, the
/// designated fallback model is tried transparently; the substitution shows
/// up only in provenance (and possibly lower confidence scores).
async fn run_model(
    inference: Arc<dyn ModelInference>,
    audio_path: PathBuf,
    model: ModelId,
    per_model_genre_count: usize,
    allow_fallback: bool,
) -> ModelOutcome {
    let (taggram, effective_model) = match inference.analyze(&audio_path, model).await {
        Ok(taggram) => (taggram, model),
        Err(InferenceError::ModelUnavailable(reason)) if allow_fallback => {
            warn!(
                model = %model,
                fallback = %ModelId::FALLBACK,
                reason = %reason,
                "Priority model unavailable, substituting fallback"
            );
            match inference.analyze(&audio_path, ModelId::FALLBACK).await {
                Ok(taggram) => (taggram, ModelId::FALLBACK),
                Err(e) => {
                    return ModelOutcome::Skipped(ModelSkip {
                        model,
                        reason: format!("fallback {} also failed: {}", ModelId::FALLBACK, e),
                    });
                }
            }
        }
        Err(e) => {
            return ModelOutcome::Skipped(ModelSkip {
                model,
                reason: e.to_string(),
            });
        }
    };

    match reduce_taggram(&taggram, effective_model, per_model_genre_count) {
        Ok(set) => ModelOutcome::Reduced(set),
        Err(e) => ModelOutcome::Skipped(ModelSkip {
            model: effective_model,
            reason: e.to_string(),
        }),
    }
}

/// Fold successful score sets into the final ranked suggestion list
///
/// Commutative and associative over the input sets: permuting them never
/// changes the output. Ties in normalized weight break alphabetically.
pub(crate) fn fold_score_sets(
    sets: &[ModelScoreSet],
    min_weight: f32,
    max_results: usize,
) -> Vec<TagScore> {
    if sets.is_empty() {
        return Vec::new();
    }

    let mut accumulated: BTreeMap<&str, f32> = BTreeMap::new();
    for set in sets {
        for score in &set.scores {
            *accumulated.entry(score.tag.as_str()).or_insert(0.0) += score.weight;
        }
    }

    let succeeded = sets.len() as f32;
    let mut scores: Vec<TagScore> = accumulated
        .into_iter()
        .map(|(tag, sum)| TagScore::new(tag, sum / succeeded))
        .filter(|score| score.weight >= min_weight)
        .collect();

    scores.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.tag.cmp(&b.tag))
    });
    scores.truncate(max_results);
    scores
}

// ============================================================================
// Tests
// ============================================================================
