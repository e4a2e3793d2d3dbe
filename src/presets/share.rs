use super::{FilterPreset, PresetError};
use crate::state::FilterState;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

const SHARED_SEGMENT: &str = "/filters/shared/";

/// Payload carried by a share link. Not signed; the receiver must treat it
/// as untrusted input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedFilter {
    pub id: String,
    pub name: String,
    pub query: FilterState,
}

/// `<origin><path>/filters/shared/<base64(json)>`
pub fn share_link(preset: &FilterPreset, origin: &str, path: &str) -> String {
    let payload = SharedFilter {
        id: preset.id.clone(),
        name: preset.name.clone(),
        query: preset.query.clone(),
    };
    // a struct of strings and a FilterState always serializes
    let json = serde_json::to_string(&payload).unwrap_or_default();
    format!(
        "{origin}{}{SHARED_SEGMENT}{}",
        path.trim_end_matches('/'),
        STANDARD.encode(json)
    )
}

pub fn decode_share_link(link: &str) -> Result<SharedFilter, PresetError> {
    let (_, encoded) = link
        .rsplit_once(SHARED_SEGMENT)
        .ok_or_else(|| PresetError::InvalidShareLink("missing shared filter segment".into()))?;
    let bytes = STANDARD
        .decode(encoded.trim_end_matches('/'))
        .map_err(|e| PresetError::InvalidShareLink(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| PresetError::InvalidShareLink(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    #[test]
    fn link_embeds_decodable_payload() {
        let clock = FixedClock::parse("2026-10-18T00:00:00Z").unwrap();
        let mut state = FilterState::default();
        state.search_term = "mail".into();
        let preset = FilterPreset::new("Mail hosts", state.clone(), &clock);

        let link = share_link(&preset, "https://dns.example.net", "/console/");
        assert!(link.starts_with("https://dns.example.net/console/filters/shared/"));

        let shared = decode_share_link(&link).unwrap();
        assert_eq!(shared.id, preset.id);
        assert_eq!(shared.name, "Mail hosts");
        assert_eq!(shared.query, state);
    }

    #[test]
    fn rejects_foreign_links() {
        assert!(decode_share_link("https://dns.example.net/records").is_err());
        assert!(decode_share_link("https://x/filters/shared/@@@").is_err());
    }
}
