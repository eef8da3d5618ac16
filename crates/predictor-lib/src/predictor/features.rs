//! Shaping of parsed queries into the preprocessor's input schema

use crate::models::{FeatureRecord, MatchQuery};

/// Builds the single-row feature record for a match query
///
/// No numeric work happens here; the fitted preprocessor owns the encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder;

impl FeatureEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, query: &MatchQuery) -> FeatureRecord {
        FeatureRecord {
            team_name: query.team_a.clone(),
            team_name_opp: query.team_b.clone(),
            map_name: query.map.clone(),
            banned_hero: query.ban_a.clone(),
            banned_hero_opp: query.ban_b.clone(),
        }
    }
}
