//! Parameter candidate detection: literal input values worth extracting
//! into named, data-driven parameters.
//!
//! Scans cleaned source for fill-style and select-style calls with a
//! literal string value. Each occurrence yields an independent candidate —
//! repeating literals across steps are deliberately not merged, so every
//! field stays independently parameterizable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use grabar_script::parse::ScriptDocument;
use grabar_script::stmt::Stmt;

/// How far up a locator chain the label search walks.
pub const LABEL_SEARCH_DEPTH: usize = 10;

/// Longest generated suggested name.
pub const SUGGESTED_NAME_MAX: usize = 50;

/// A literal value proposed for extraction into a named parameter.
///
/// `id` is stable across re-detection of the same logical occurrence, so UI
/// selections survive re-runs of the detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterCandidate {
    /// Stable, session-unique occurrence id
    pub id: String,
    /// Nearest accessible label, empty when none was found
    pub label: String,
    /// The literal value as captured
    pub original_value: String,
    /// Camel-case name proposal
    pub suggested_name: String,
}

/// Detect parameter candidates in cleaned source.
///
/// Fail-soft: unparseable input yields an empty list, never an error.
#[must_use]
pub fn detect(source: &str) -> Vec<ParameterCandidate> {
    let Ok(doc) = ScriptDocument::parse(source) else {
        return Vec::new();
    };

    let mut ordinals: HashMap<(String, String), u32> = HashMap::new();
    let mut candidates = Vec::new();

    for parsed in &doc.stmts {
        let Stmt::Action { target, call } = &parsed.stmt else {
            continue;
        };
        let Some(value) = call.value_arg().and_then(|arg| arg.as_literal()) else {
            continue;
        };

        let label = target
            .nearest_label(LABEL_SEARCH_DEPTH)
            .unwrap_or_default()
            .to_string();
        let name_seed = if label.is_empty() { value } else { &label };
        let suggested_name = camel_fold(name_seed);

        let key = (label.clone(), value.to_string());
        let ordinal = ordinals.entry(key).or_insert(0);
        let id = occurrence_id(&label, value, *ordinal);
        *ordinal += 1;

        candidates.push(ParameterCandidate {
            id,
            label,
            original_value: value.to_string(),
            suggested_name,
        });
    }

    candidates
}

/// Camel-case fold: lower-case, split on non-alphanumeric runs, capitalize
/// each following token head, strip the rest, truncate.
#[must_use]
pub fn camel_fold(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut out = String::new();
    let mut boundary = false;
    for c in lowered.chars() {
        if c.is_alphanumeric() {
            if boundary && !out.is_empty() {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            boundary = false;
        } else {
            boundary = true;
        }
    }
    out.chars().take(SUGGESTED_NAME_MAX).collect()
}

/// Stable id for the nth occurrence of a (label, value) pair.
fn occurrence_id(label: &str, value: &str, ordinal: u32) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(label.as_bytes());
    hasher.update(b"\0");
    hasher.update(value.as_bytes());
    hasher.update(b"\0");
    hasher.update(&ordinal.to_le_bytes());
    hasher.finalize().to_hex()[..16].to_string()
}
