//! Core types and collaborator traits for the suggestion pipelines
//!
//! Two advisory pipelines share one output shape:
//! - **Ensemble pipeline:** N inference models → taggram reduction → fold
//! - **Community pipeline:** track-scoped tag query with artist fallback
//!
//! Both produce a [`SuggestionResult`]; they are presented side by side and
//! never merged with each other.

use crate::error::{ContractViolation, InferenceError, TagSourceError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ============================================================================
// Models
// ============================================================================

/// Inference model identifiers
///
/// Ordered largest/most accurate first; [`ModelId::roster`] selects the
/// first N for a requested model count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    /// MSD-trained musicnn, large variant (priority model)
    MsdMusicnnBig,
    /// MagnaTagATune-trained musicnn
    MttMusicnn,
    /// MagnaTagATune-trained VGG
    MttVgg,
    /// MSD-trained musicnn, small variant (designated fallback for the big one)
    MsdMusicnn,
    /// MSD-trained VGG
    MsdVgg,
}

/// Priority order for roster selection
const ROSTER: [ModelId; 5] = [
    ModelId::MsdMusicnnBig,
    ModelId::MttMusicnn,
    ModelId::MttVgg,
    ModelId::MsdMusicnn,
    ModelId::MsdVgg,
];

impl ModelId {
    /// Highest-priority model, always first in every roster
    pub const PRIORITY: ModelId = ModelId::MsdMusicnnBig;

    /// Designated substitute when the priority model is unavailable
    pub const FALLBACK: ModelId = ModelId::MsdMusicnn;

    /// Model name as used by the inference backend
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::MsdMusicnnBig => "MSD_musicnn_big",
            ModelId::MttMusicnn => "MTT_musicnn",
            ModelId::MttVgg => "MTT_vgg",
            ModelId::MsdMusicnn => "MSD_musicnn",
            ModelId::MsdVgg => "MSD_vgg",
        }
    }

    /// Roster for a requested model count, in priority order
    ///
    /// Counts outside 1..=5 are clamped.
    pub fn roster(model_count: usize) -> &'static [ModelId] {
        &ROSTER[..model_count.clamp(1, ROSTER.len())]
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Taggram (raw model output)
// ============================================================================

/// Per-frame tag-likelihood matrix produced by one inference model
///
/// Frame-major: `frames[i][j]` is the likelihood of `tags[j]` during frame
/// `i`. Rows must all match the tag index width; the reducer rejects ragged
/// or non-finite input.
#[derive(Debug, Clone)]
pub struct Taggram {
    /// Frame rows, each aligned to `tags`
    pub frames: Vec<Vec<f32>>,
    /// Tag-name index aligned to the matrix columns
    pub tags: Vec<String>,
}

impl Taggram {
    pub fn new(frames: Vec<Vec<f32>>, tags: Vec<String>) -> Self {
        Self { frames, tags }
    }
}

// ============================================================================
// Scores
// ============================================================================

/// A single tag with its weight
///
/// Weights are comparable within one pipeline: the ensemble pipeline emits
/// `[0,1]` confidences, the community pipeline emits raw annotation counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagScore {
    /// Tag name (case-sensitive identity)
    pub tag: String,
    /// Weight on the producing pipeline's scale
    pub weight: f32,
}

impl TagScore {
    pub fn new(tag: impl Into<String>, weight: f32) -> Self {
        Self {
            tag: tag.into(),
            weight,
        }
    }
}

/// Ranked tag/weight set produced by reducing one model's taggram
///
/// At most `per_model_genre_count` entries, weight-descending. Owned by the
/// ensemble call that requested it; immutable after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelScoreSet {
    /// Model that produced these scores
    pub model: ModelId,
    /// Ranked scores, weight-descending
    pub scores: Vec<TagScore>,
}

/// Raw community tag as returned by a tag source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTag {
    /// Tag name
    pub name: String,
    /// Crowd annotation count
    pub count: u32,
}

impl RawTag {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

// ============================================================================
// Suggestion result (shared output contract)
// ============================================================================

/// Which fallback level supplied a community result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackLevel {
    /// Track-scoped query answered
    Track,
    /// Track query was empty; artist-scoped query answered
    Artist,
}

/// A model the ensemble combiner skipped, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSkip {
    pub model: ModelId,
    pub reason: String,
}

/// Provenance metadata for a suggestion result
///
/// Carried for transparency and debugging only; never affects filtering or
/// ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Provenance {
    /// Ensemble pipeline: which models contributed, which were skipped
    Ensemble {
        contributed: Vec<ModelId>,
        skipped: Vec<ModelSkip>,
    },
    /// Community pipeline: which fallback level answered
    Community { level: FallbackLevel },
}

/// Final ordered suggestion list produced by either pipeline
///
/// An empty `scores` list is a valid outcome meaning "no qualifying
/// suggestions" and is distinct from a hard failure (which surfaces as an
/// error from the resolver, or as all-skipped provenance from the ensemble).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResult {
    /// Ranked scores, weight-descending, no duplicate tags
    pub scores: Vec<TagScore>,
    /// Which source(s) produced this result
    pub provenance: Provenance,
}

impl SuggestionResult {
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Check the shared output contract against a configuration
    ///
    /// Verifies: length ≤ `max_results`, every weight ≥ `min_weight`,
    /// non-increasing weight order, no duplicate tag names.
    pub fn verify_contract(
        &self,
        max_results: usize,
        min_weight: f32,
    ) -> std::result::Result<(), ContractViolation> {
        if self.scores.len() > max_results {
            return Err(ContractViolation::OverCap {
                got: self.scores.len(),
                cap: max_results,
            });
        }

        let mut seen = std::collections::HashSet::new();
        let mut prev_weight = f32::INFINITY;

        for score in &self.scores {
            if score.weight < min_weight {
                return Err(ContractViolation::BelowThreshold {
                    tag: score.tag.clone(),
                    weight: score.weight,
                    min: min_weight,
                });
            }
            if score.weight > prev_weight {
                return Err(ContractViolation::OutOfOrder {
                    tag: score.tag.clone(),
                });
            }
            if !seen.insert(score.tag.as_str()) {
                return Err(ContractViolation::DuplicateTag {
                    tag: score.tag.clone(),
                });
            }
            prev_weight = score.weight;
        }

        Ok(())
    }
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Model inference backend
///
/// Given an audio file and a model identifier, produces the model's taggram.
/// The reducer depends only on this shape, not on how inference is performed.
#[async_trait::async_trait]
pub trait ModelInference: Send + Sync {
    /// Run inference for one model over one audio file
    ///
    /// # Errors
    /// `InferenceError::ModelUnavailable` when the model cannot be loaded
    /// (triggers fallback substitution for the priority model),
    /// `InferenceError::Inference` for a failed run. Both are contained by
    /// the ensemble combiner as per-model skips.
    async fn analyze(&self, audio_path: &Path, model: ModelId)
        -> Result<Taggram, InferenceError>;
}

/// Community tag source with track- and artist-scoped endpoints
///
/// An `Ok(vec![])` return is a legitimate empty result, not an error; only
/// the track-scoped variant's empty result triggers the artist fallback.
#[async_trait::async_trait]
pub trait CommunityTagSource: Send + Sync {
    /// Top tags for a specific track
    async fn track_top_tags(
        &self,
        artist: &str,
        track: &str,
    ) -> Result<Vec<RawTag>, TagSourceError>;

    /// Top tags for an artist
    async fn artist_top_tags(&self, artist: &str) -> Result<Vec<RawTag>, TagSourceError>;
}

// ============================================================================
// Tests
// ============================================================================
