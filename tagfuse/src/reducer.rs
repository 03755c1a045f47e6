//! Taggram reducer
//!
//! Collapses one model's per-frame tag-likelihood matrix into a ranked
//! tag/weight set: arithmetic mean per tag column, weight-descending order
//! with original column order breaking ties, truncated to the configured
//! per-model genre count.

use crate::error::ReductionError;
use crate::types::{ModelId, ModelScoreSet, TagScore, Taggram};
use tracing::debug;

/// Reduce a taggram to a ranked [`ModelScoreSet`]
///
/// # Errors
/// Rejects empty matrices, zero tag columns, ragged frame rows, and any
/// non-finite likelihood cell. The ensemble combiner treats all of these as
/// "model produced no usable signal" and skips the model.
pub fn reduce_taggram(
    taggram: &Taggram,
    model: ModelId,
    per_model_genre_count: usize,
) -> Result<ModelScoreSet, ReductionError> {
    if taggram.frames.is_empty() {
        return Err(ReductionError::EmptyTaggram);
    }
    if taggram.tags.is_empty() {
        return Err(ReductionError::NoTags);
    }

    let tag_count = taggram.tags.len();
    let frame_count = taggram.frames.len();

    // Mean likelihood per tag column across all frames
    let mut sums = vec![0.0f64; tag_count];
    for (frame_idx, frame) in taggram.frames.iter().enumerate() {
        if frame.len() != tag_count {
            return Err(ReductionError::RaggedFrame {
                frame: frame_idx,
                got: frame.len(),
                expected: tag_count,
            });
        }
        for (column, &likelihood) in frame.iter().enumerate() {
            if !likelihood.is_finite() {
                return Err(ReductionError::NonFinite {
                    frame: frame_idx,
                    column,
                });
            }
            sums[column] += likelihood as f64;
        }
    }

    let mut scores: Vec<TagScore> = taggram
        .tags
        .iter()
        .zip(sums.iter())
        .map(|(tag, &sum)| TagScore::new(tag.clone(), (sum / frame_count as f64) as f32))
        .collect();

    // Stable sort: equal weights keep original column order
    scores.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scores.truncate(per_model_genre_count);

    debug!(
        model = %model,
        frames = frame_count,
        tags = tag_count,
        kept = scores.len(),
        "Reduced taggram"
    );

    Ok(ModelScoreSet { model, scores })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelId;

    fn taggram(frames: Vec<Vec<f32>>, tags: &[&str]) -> Taggram {
        Taggram::new(frames, tags.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_mean_across_frames() {
        let input = taggram(
            vec![vec![0.2, 0.8], vec![0.4, 0.6], vec![0.6, 0.4]],
            &["rock", "pop"],
        );
        let set = reduce_taggram(&input, ModelId::MttMusicnn, 5).unwrap();

        assert_eq!(set.model, ModelId::MttMusicnn);
        assert_eq!(set.scores.len(), 2);
        assert_eq!(set.scores[0].tag, "pop");
        assert!((set.scores[0].weight - 0.6).abs() < 1e-6);
        assert_eq!(set.scores[1].tag, "rock");
        assert!((set.scores[1].weight - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_truncates_to_per_model_genre_count() {
        let input = taggram(vec![vec![0.1, 0.5, 0.3, 0.9]], &["a", "b", "c", "d"]);
        let set = reduce_taggram(&input, ModelId::MsdVgg, 2).unwrap();

        assert_eq!(set.scores.len(), 2);
        assert_eq!(set.scores[0].tag, "d");
        assert_eq!(set.scores[1].tag, "b");
    }

    #[test]
    fn test_ties_break_by_column_order() {
        let input = taggram(vec![vec![0.5, 0.5, 0.5]], &["zeta", "alpha", "mid"]);
        let set = reduce_taggram(&input, ModelId::MttVgg, 3).unwrap();

        // All equal: original column order is preserved, not alphabetical
        let tags: Vec<&str> = set.scores.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_deterministic() {
        let input = taggram(
            vec![vec![0.3, 0.7, 0.5], vec![0.1, 0.9, 0.5]],
            &["a", "b", "c"],
        );
        let first = reduce_taggram(&input, ModelId::MsdMusicnn, 3).unwrap();
        let second = reduce_taggram(&input, ModelId::MsdMusicnn, 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_empty_taggram() {
        let input = taggram(vec![], &["rock"]);
        assert!(matches!(
            reduce_taggram(&input, ModelId::MsdMusicnnBig, 5),
            Err(ReductionError::EmptyTaggram)
        ));
    }

    #[test]
    fn test_rejects_zero_tags() {
        let input = taggram(vec![vec![]], &[]);
        assert!(matches!(
            reduce_taggram(&input, ModelId::MsdMusicnnBig, 5),
            Err(ReductionError::NoTags)
        ));
    }

    #[test]
    fn test_rejects_ragged_frames() {
        let input = taggram(vec![vec![0.1, 0.2], vec![0.3]], &["a", "b"]);
        assert!(matches!(
            reduce_taggram(&input, ModelId::MsdMusicnnBig, 5),
            Err(ReductionError::RaggedFrame {
                frame: 1,
                got: 1,
                expected: 2
            })
        ));
    }

    #[test]
    fn test_rejects_nan_cell() {
        let input = taggram(vec![vec![0.1, f32::NAN]], &["a", "b"]);
        assert!(matches!(
            reduce_taggram(&input, ModelId::MsdMusicnnBig, 5),
            Err(ReductionError::NonFinite {
                frame: 0,
                column: 1
            })
        ));
    }

    #[test]
    fn test_rejects_infinite_cell() {
        let input = taggram(vec![vec![f32::INFINITY, 0.2]], &["a", "b"]);
        assert!(matches!(
            reduce_taggram(&input, ModelId::MsdMusicnnBig, 5),
            Err(ReductionError::NonFinite {
                frame: 0,
                column: 0
            })
        ));
    }
}
