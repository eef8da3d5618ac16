//! Parsing of the `team_1, team_2, map, ban_1, ban_2[, model]` argument string

use crate::error::{FormatError, ParseResult};
use crate::models::{canonical_model_name, MatchQuery, DEFAULT_MODEL, NO_BAN};

/// Parse a raw argument string into a match query
///
/// Tokens are split on commas and trimmed. Five tokens select the default
/// model; a sixth names the model explicitly. Model names are lowercased
/// and empty ban tokens become the `No Ban` category.
pub fn parse_match_query(raw: &str) -> ParseResult<MatchQuery> {
    parse_with_default(raw, DEFAULT_MODEL)
}

/// Like [`parse_match_query`] with a caller-supplied default model name
pub fn parse_with_default(raw: &str, default_model: &str) -> ParseResult<MatchQuery> {
    if raw.trim().is_empty() {
        return Err(FormatError::Empty);
    }

    let fields: Vec<&str> = raw.split(',').map(str::trim).collect();

    let (team_a, team_b, map, ban_a, ban_b, model) = match fields.as_slice() {
        [team_a, team_b, map, ban_a, ban_b] => (*team_a, *team_b, *map, *ban_a, *ban_b, ""),
        [team_a, team_b, map, ban_a, ban_b, model] => {
            (*team_a, *team_b, *map, *ban_a, *ban_b, *model)
        }
        other => return Err(FormatError::FieldCount(other.len())),
    };

    Ok(MatchQuery {
        team_a: required(team_a, "team_1")?,
        team_b: required(team_b, "team_2")?,
        map: required(map, "map")?,
        ban_a: ban_or_sentinel(ban_a),
        ban_b: ban_or_sentinel(ban_b),
        model_name: canonical_model_name(if model.is_empty() { default_model } else { model }),
    })
}

fn required(value: &str, field: &'static str) -> ParseResult<String> {
    if value.is_empty() {
        Err(FormatError::EmptyField(field))
    } else {
        Ok(value.to_string())
    }
}

fn ban_or_sentinel(value: &str) -> String {
    if value.is_empty() {
        NO_BAN.to_string()
    } else {
        value.to_string()
    }
}
