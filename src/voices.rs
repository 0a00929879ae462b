//! Narration voice catalog.
//!
//! The backend exposes an ordered list of voices; the order is display order
//! only. The currently selected voice id must always point at a catalog entry
//! whenever the catalog is non-empty, so selection is re-resolved every time
//! the catalog is replaced.

use serde::Deserialize;
use tracing::warn;

/// Selection falls back to this id when the catalog is empty.
pub const FALLBACK_VOICE_ID: &str = "en-US-natalie";

/// A single narration voice as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub voice_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

impl Voice {
    pub fn label(&self) -> String {
        match (&self.name, &self.locale) {
            (Some(name), Some(locale)) => format!("{name} ({locale})"),
            (Some(name), None) => name.clone(),
            _ => self.voice_id.clone(),
        }
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Parse the voice-listing response body.
///
/// A body that is not a JSON array is rejected so the held catalog stays
/// untouched; individual entries without a usable `voiceId` are skipped.
pub fn parse_voice_list(body: &str) -> anyhow::Result<Vec<Voice>> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|err| anyhow::anyhow!("invalid JSON: {err}"))?;
    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        other => anyhow::bail!(
            "expected a JSON array of voices, got {}",
            json_type_name(&other)
        ),
    };

    let mut voices = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<Voice>(entry) {
            Ok(voice) if !voice.voice_id.trim().is_empty() => voices.push(voice),
            Ok(_) => warn!("Skipping voice entry with blank voiceId"),
            Err(err) => warn!("Skipping malformed voice entry: {err}"),
        }
    }
    Ok(voices)
}

/// Return `current` if the catalog contains it, otherwise the first catalog
/// entry, otherwise the fixed fallback id.
pub fn resolve_selection(current: &str, catalog: &[Voice]) -> String {
    if catalog.iter().any(|voice| voice.voice_id == current) {
        return current.to_string();
    }
    catalog
        .first()
        .map(|voice| voice.voice_id.clone())
        .unwrap_or_else(|| FALLBACK_VOICE_ID.to_string())
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(id: &str) -> Voice {
        Voice {
            voice_id: id.to_string(),
            name: None,
            locale: None,
        }
    }

    #[test]
    fn selection_is_kept_when_present() {
        let catalog = vec![voice("a"), voice("b")];
        assert_eq!(resolve_selection("b", &catalog), "b");
    }

    #[test]
    fn selection_resets_to_first_entry_when_missing() {
        let catalog = vec![voice("a"), voice("b")];
        assert_eq!(resolve_selection("gone", &catalog), "a");
    }

    #[test]
    fn empty_catalog_falls_back_to_fixed_id() {
        assert_eq!(resolve_selection("anything", &[]), FALLBACK_VOICE_ID);
    }

    #[test]
    fn non_array_payload_is_rejected() {
        assert!(parse_voice_list("{\"voices\": []}").is_err());
        assert!(parse_voice_list("\"nope\"").is_err());
        assert!(parse_voice_list("not json at all").is_err());
    }

    #[test]
    fn well_formed_list_parses() {
        let body = r#"[
            {"voiceId": "en-US-ken", "name": "Ken", "locale": "en-US"},
            {"voiceId": "en-GB-amy"}
        ]"#;
        let voices = parse_voice_list(body).expect("parse");
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].voice_id, "en-US-ken");
        assert_eq!(voices[0].label(), "Ken (en-US)");
        assert_eq!(voices[1].label(), "en-GB-amy");
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let body = r#"[{"voiceId": "ok"}, {"name": 42}, {"voiceId": ""}]"#;
        let voices = parse_voice_list(body).expect("parse");
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].voice_id, "ok");
    }
}
