//! Coerce raw model text into a JSON object
//!
//! Repair is best effort and never fails: strict parse, then the same text
//! with Markdown code fences removed, then the widest `{...}` span, then an
//! empty object. Only a JSON object counts as success at each step.

use regex_lite::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub const AI_PROBABILITY: &str = "aiProbability";
pub const HUMAN_PROBABILITY: &str = "humanProbability";

fn object_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("object span regex is valid"))
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Remove ``` fences (with or without a `json` tag)
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Recover a JSON object from model output, or an empty object
pub fn repair_json(raw: &str) -> Map<String, Value> {
    if let Some(map) = parse_object(raw) {
        return map;
    }

    let stripped = strip_code_fences(raw);
    if let Some(map) = parse_object(&stripped) {
        tracing::debug!("Recovered model output after stripping code fences");
        return map;
    }

    if let Some(map) = object_span()
        .find(&stripped)
        .and_then(|m| parse_object(m.as_str()))
    {
        tracing::debug!("Recovered model output from embedded object");
        return map;
    }

    tracing::warn!(
        raw_len = raw.len(),
        "Model output contained no JSON object, using empty result"
    );
    Map::new()
}

fn complement(value: &Value) -> Option<Value> {
    if let Some(c) = value.as_i64().and_then(|i| 100i64.checked_sub(i)) {
        return Some(Value::from(c));
    }
    value.as_f64().map(|f| Value::from(100.0 - f))
}

fn is_absent(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).map_or(true, Value::is_null)
}

/// Fill in whichever of ai/human probability is missing as `100 - other`
pub fn backfill_complement(map: &mut Map<String, Value>) {
    if is_absent(map, HUMAN_PROBABILITY) {
        if let Some(human) = map.get(AI_PROBABILITY).and_then(complement) {
            map.insert(HUMAN_PROBABILITY.to_string(), human);
        }
    } else if is_absent(map, AI_PROBABILITY) {
        if let Some(ai) = map.get(HUMAN_PROBABILITY).and_then(complement) {
            map.insert(AI_PROBABILITY.to_string(), ai);
        }
    }
}

/// Repair then backfill
pub fn normalize(raw: &str) -> Map<String, Value> {
    let mut map = repair_json(raw);
    backfill_complement(&mut map);
    map
}
