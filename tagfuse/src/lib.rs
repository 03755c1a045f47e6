//! tagfuse — genre tag suggestions for music tracks
//!
//! Two independent advisory pipelines that share one output contract:
//!
//! - **Ensemble pipeline** ([`ensemble::EnsembleCombiner`]): fans out up to
//!   five inference models over an audio file, reduces each model's taggram
//!   to a ranked tag set ([`reducer::reduce_taggram`]), and folds the sets
//!   into one normalized suggestion list.
//! - **Community pipeline** ([`community::CommunityResolver`]): resolves
//!   crowd-annotated tags through a track→artist fallback hierarchy, backed
//!   by a [`sources::LastfmClient`] or any other [`types::CommunityTagSource`].
//!
//! The two pipelines are presented side by side and never merged. Both
//! tolerate partial failure: a dead model or an empty tag list contributes
//! nothing instead of failing the request.

pub mod community;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod reducer;
pub mod sources;
pub mod types;

pub use crate::community::CommunityResolver;
pub use crate::config::{CommunityConfig, EnsembleConfig, SuggestionConfig};
pub use crate::ensemble::EnsembleCombiner;
pub use crate::error::{Error, Result};
pub use crate::types::{
    CommunityTagSource, FallbackLevel, ModelId, ModelInference, Provenance, SuggestionResult,
    TagScore, Taggram,
};
