use std::collections::HashSet;
use std::fmt::Write as _;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::completion::CompletionClient;
use super::types::{AnimalType, FeedEstimate};
use crate::inventory::SupplyItem;

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("completion unavailable")]
    CompletionUnavailable(#[source] anyhow::Error),
    #[error("unparseable response")]
    UnparseableResponse,
    #[error("malformed estimate")]
    MalformedEstimate { reason: String },
}

const INSTRUCTIONS: &str = "\
You are an animal nutrition assistant for a marketplace that turns grocery surplus into livestock feed.
For the items below, estimate how many pounds of usable feed each animal type can get.
Exclude anything unsafe for an animal (for example meat-derived food for ruminants, or items expired too long).
The total across animal types must not exceed the total input weight.
Answer with a single JSON object and nothing else, keyed by animal type, values in pounds:
{\"chicken\": 0, \"pig\": 0, \"cattle\": 0, \"goat\": 0, \"sheep\": 0}

Items:
";

pub fn build_prompt<'a>(items: impl IntoIterator<Item = &'a SupplyItem>) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    for item in items {
        let _ = writeln!(
            prompt,
            "- {}: category {}, {} lbs, expires {}, status {}",
            item.name,
            item.category,
            item.quantity_weight,
            item.expiration_date,
            item.status
        );
    }
    prompt
}

/// Returns the first balanced `{...}` span in `text` that is valid JSON.
pub fn extract_object(text: &str) -> Option<serde_json::Value> {
    text.match_indices('{').find_map(|(start, _)| {
        let end = balanced_end(&text[start..])?;
        serde_json::from_str(&text[start..start + end]).ok()
    })
}

// Byte length of the object starting at `s[0] == '{'`, honoring JSON strings.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decodes a JSON object of animal type to pounds. Missing animal types are zero.
pub fn decode_estimate(value: serde_json::Value) -> Result<FeedEstimate, EstimateError> {
    let serde_json::Value::Object(map) = value else {
        return Err(EstimateError::MalformedEstimate {
            reason: "not an object".into(),
        });
    };

    let mut estimate = FeedEstimate::zeroed();
    for (key, v) in map {
        let animal: AnimalType = key.parse().map_err(|_| EstimateError::MalformedEstimate {
            reason: format!("unknown animal type {key:?}"),
        })?;
        let weight = v
            .as_f64()
            .filter(|w| w.is_finite())
            .ok_or_else(|| EstimateError::MalformedEstimate {
                reason: format!("{key} is not a number"),
            })?;
        estimate.set(animal, weight);
    }
    Ok(estimate)
}

pub fn parse_response(text: &str) -> Result<FeedEstimate, EstimateError> {
    let value = extract_object(text).ok_or(EstimateError::UnparseableResponse)?;
    decode_estimate(value)
}

/// Delegates the estimate to the completion provider. Nothing is persisted here.
#[instrument(skip_all, fields(selected = selected.len()))]
pub async fn estimate_via_language_model(
    client: &dyn CompletionClient,
    items: &[SupplyItem],
    selected: &HashSet<Uuid>,
) -> Result<FeedEstimate, EstimateError> {
    let chosen: Vec<&SupplyItem> = items.iter().filter(|i| selected.contains(&i.id)).collect();
    if chosen.is_empty() {
        return Ok(FeedEstimate::zeroed());
    }

    let prompt = build_prompt(chosen);
    let reply = client.complete(&prompt).await.map_err(|e| {
        warn!(error = %e, "completion call failed");
        EstimateError::CompletionUnavailable(e)
    })?;

    let estimate = parse_response(&reply).map_err(|e| {
        warn!(error = %e, reply_chars = reply.len(), "completion reply rejected");
        e
    })?;
    debug!(total = estimate.total(), "language-model estimate parsed");
    Ok(estimate)
}

/// Flags for a human to look at before an estimate is listed. Never alters the estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateReview {
    pub input_weight: f64,
    pub estimated_weight: f64,
    pub exceeds_input: bool,
    pub has_negative: bool,
}

pub fn review_estimate(
    estimate: &FeedEstimate,
    items: &[SupplyItem],
    selected: &HashSet<Uuid>,
) -> EstimateReview {
    let input_weight: f64 = items
        .iter()
        .filter(|i| selected.contains(&i.id))
        .map(|i| i.quantity_weight)
        .sum();
    let estimated_weight = estimate.total();
    EstimateReview {
        input_weight,
        estimated_weight,
        exceeds_input: estimated_weight > input_weight + f64::EPSILON,
        has_negative: estimate.iter().any(|(_, w)| w < 0.0),
    }
}
