//! Community tag resolver
//!
//! Resolves crowd-annotated tags through a track→artist fallback hierarchy:
//! the track-scoped query is tried first, and only a well-formed *empty*
//! result falls through to the artist-scoped query. Results are substituted
//! whole, never merged. Transport or parse failures propagate; they never
//! trigger fallback.

use crate::config::CommunityConfig;
use crate::error::TagSourceError;
use crate::types::{
    CommunityTagSource, FallbackLevel, Provenance, RawTag, SuggestionResult, TagScore,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Community tag resolver over a tag source
pub struct CommunityResolver {
    source: Arc<dyn CommunityTagSource>,
}

impl CommunityResolver {
    pub fn new(source: Arc<dyn CommunityTagSource>) -> Self {
        Self { source }
    }

    /// Produce community genre suggestions for one track
    ///
    /// # Errors
    /// Propagates `TagSourceError` from the track query, or from the artist
    /// query after an empty track result. The caller treats this as "no
    /// community suggestions available"; an `Ok` result with empty scores
    /// means no qualifying tags exist.
    pub async fn suggest(
        &self,
        artist: &str,
        track: &str,
        config: &CommunityConfig,
    ) -> Result<SuggestionResult, TagSourceError> {
        let track_tags = self.source.track_top_tags(artist, track).await?;

        let (raw_tags, level) = if track_tags.is_empty() {
            debug!(artist = %artist, track = %track, "No track tags, falling back to artist tags");
            let artist_tags = self.source.artist_top_tags(artist).await?;
            (artist_tags, FallbackLevel::Artist)
        } else {
            (track_tags, FallbackLevel::Track)
        };

        let scores = rank_raw_tags(raw_tags, config.min_weight, config.max_results);

        info!(
            artist = %artist,
            track = %track,
            level = ?level,
            suggestions = scores.len(),
            "Community tag resolution complete"
        );

        Ok(SuggestionResult {
            scores,
            provenance: Provenance::Community { level },
        })
    }
}

/// Filter, rank, and cap raw community tags
///
/// Ties in count keep the source's original order, which is assumed already
/// ranked (stable sort).
fn rank_raw_tags(raw_tags: Vec<RawTag>, min_weight: f32, max_results: usize) -> Vec<TagScore> {
    let mut tags: Vec<RawTag> = raw_tags
        .into_iter()
        .filter(|tag| tag.count as f32 >= min_weight)
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count));
    tags.truncate(max_results);
    tags.into_iter()
        .map(|tag| TagScore::new(tag.name, tag.count as f32))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock tag source with fixed per-endpoint responses
    struct MockSource {
        track: Result<Vec<RawTag>, TagSourceError>,
        artist: Result<Vec<RawTag>, TagSourceError>,
    }

    #[async_trait::async_trait]
    impl CommunityTagSource for MockSource {
        async fn track_top_tags(
            &self,
            _artist: &str,
            _track: &str,
        ) -> Result<Vec<RawTag>, TagSourceError> {
            clone_response(&self.track)
        }

        async fn artist_top_tags(&self, _artist: &str) -> Result<Vec<RawTag>, TagSourceError> {
            clone_response(&self.artist)
        }
    }

    fn clone_response(
        response: &Result<Vec<RawTag>, TagSourceError>,
    ) -> Result<Vec<RawTag>, TagSourceError> {
        match response {
            Ok(tags) => Ok(tags.clone()),
            Err(TagSourceError::Network(msg)) => Err(TagSourceError::Network(msg.clone())),
            Err(TagSourceError::Api(code, msg)) => Err(TagSourceError::Api(*code, msg.clone())),
            Err(TagSourceError::Parse(msg)) => Err(TagSourceError::Parse(msg.clone())),
        }
    }

    fn config(min_weight: f32, max_results: usize) -> CommunityConfig {
        CommunityConfig {
            min_weight,
            max_results,
        }
    }

    #[tokio::test]
    async fn test_empty_track_result_falls_back_to_artist() {
        let source = MockSource {
            track: Ok(vec![]),
            artist: Ok(vec![RawTag::new("rock", 120), RawTag::new("pop", 80)]),
        };
        let resolver = CommunityResolver::new(Arc::new(source));

        let result = resolver
            .suggest("Vexare", "The Clockmaker", &config(100.0, 5))
            .await
            .unwrap();

        assert_eq!(result.scores, vec![TagScore::new("rock", 120.0)]);
        assert_eq!(
            result.provenance,
            Provenance::Community {
                level: FallbackLevel::Artist
            }
        );
    }

    #[tokio::test]
    async fn test_non_empty_track_result_never_falls_back() {
        let source = MockSource {
            track: Ok(vec![RawTag::new("alt", 90)]),
            // Artist endpoint would return different tags; it must not be used
            artist: Ok(vec![RawTag::new("rock", 500)]),
        };
        let resolver = CommunityResolver::new(Arc::new(source));

        let result = resolver
            .suggest("Artist", "Track", &config(50.0, 5))
            .await
            .unwrap();

        assert_eq!(result.scores, vec![TagScore::new("alt", 90.0)]);
        assert_eq!(
            result.provenance,
            Provenance::Community {
                level: FallbackLevel::Track
            }
        );
    }

    #[tokio::test]
    async fn test_track_failure_does_not_trigger_fallback() {
        let source = MockSource {
            track: Err(TagSourceError::Network("connection refused".to_string())),
            artist: Ok(vec![RawTag::new("rock", 500)]),
        };
        let resolver = CommunityResolver::new(Arc::new(source));

        let result = resolver.suggest("Artist", "Track", &config(0.0, 5)).await;

        assert!(matches!(result, Err(TagSourceError::Network(_))));
    }

    #[tokio::test]
    async fn test_artist_failure_after_empty_track_propagates() {
        let source = MockSource {
            track: Ok(vec![]),
            artist: Err(TagSourceError::Api(429, "rate limited".to_string())),
        };
        let resolver = CommunityResolver::new(Arc::new(source));

        let result = resolver.suggest("Artist", "Track", &config(0.0, 5)).await;

        assert!(matches!(result, Err(TagSourceError::Api(429, _))));
    }

    #[tokio::test]
    async fn test_both_levels_empty_is_a_valid_empty_result() {
        let source = MockSource {
            track: Ok(vec![]),
            artist: Ok(vec![]),
        };
        let resolver = CommunityResolver::new(Arc::new(source));

        let result = resolver
            .suggest("Artist", "Track", &config(0.0, 5))
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(
            result.provenance,
            Provenance::Community {
                level: FallbackLevel::Artist
            }
        );
    }

    #[tokio::test]
    async fn test_filter_sort_and_cap() {
        let source = MockSource {
            track: Ok(vec![
                RawTag::new("electronic", 70),
                RawTag::new("dubstep", 100),
                RawTag::new("chillout", 30),
                RawTag::new("bass", 85),
                RawTag::new("dance", 60),
            ]),
            artist: Ok(vec![]),
        };
        let resolver = CommunityResolver::new(Arc::new(source));

        let result = resolver
            .suggest("Artist", "Track", &config(60.0, 3))
            .await
            .unwrap();

        let tags: Vec<&str> = result.scores.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, vec!["dubstep", "bass", "electronic"]);
        result.verify_contract(3, 60.0).unwrap();
    }

    #[tokio::test]
    async fn test_count_ties_keep_source_order() {
        let source = MockSource {
            track: Ok(vec![
                RawTag::new("seen-first", 50),
                RawTag::new("also-fifty", 50),
                RawTag::new("top", 99),
            ]),
            artist: Ok(vec![]),
        };
        let resolver = CommunityResolver::new(Arc::new(source));

        let result = resolver
            .suggest("Artist", "Track", &config(0.0, 5))
            .await
            .unwrap();

        let tags: Vec<&str> = result.scores.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, vec!["top", "seen-first", "also-fifty"]);
    }
}
