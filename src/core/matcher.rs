//! Identity matching for inbound advertisements.
//!
//! The tracked target can be specified either as a name fragment
//! (e.g. "Holy-IOT") or as a full hardware address (e.g. "AA:BB:CC:DD:EE:FF").
//! A target containing ':' or '-' is treated as an address pattern.

use crate::scanner::types::Observation;

/// Strip address separators and lower-case, so "AA:BB-cc" == "aabbcc".
fn normalize_address(addr: &str) -> String {
    addr.chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect::<String>()
        .to_lowercase()
}

/// Decide whether an advertisement belongs to the tracked target.
///
/// Rules, in order:
/// 1. `target` is trimmed and lower-cased; an empty target never matches.
/// 2. If `target` contains ':' or '-', it is first tried as an address
///    pattern: exact equality after stripping separators from both sides.
///    A hyphenated device name ("holy-iot") that is not the address falls
///    through to name matching.
/// 3. Name fragment: substring match against the lower-cased candidate name
///    (absent name counts as empty).
/// 4. Fallback: a bare separator-less hex address still matches by exact
///    normalized address equality.
///
/// No partial or fuzzy address matching.
pub fn matches_target(name: Option<&str>, address: &str, target: &str) -> bool {
    let target = target.trim().to_lowercase();
    if target.is_empty() {
        return false;
    }

    let addr_norm = normalize_address(address);
    let target_norm = normalize_address(&target);

    if (target.contains(':') || target.contains('-'))
        && !addr_norm.is_empty()
        && target_norm == addr_norm
    {
        return true;
    }

    let name = name.unwrap_or("").to_lowercase();
    if name.contains(&target) {
        return true;
    }

    // The user may have typed the address without separators.
    !addr_norm.is_empty() && target == addr_norm
}

/// A matcher bound to one configured target.
#[derive(Debug, Clone)]
pub struct TargetMatcher {
    target: String,
}

impl TargetMatcher {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// The raw configured target string.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn matches(&self, obs: &Observation) -> bool {
        matches_target(obs.name.as_deref(), &obs.address, &self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_match_case_insensitive() {
        assert!(matches_target(
            None,
            "AA:BB:CC:DD:EE:FF",
            "aa:bb:cc:dd:ee:ff"
        ));
    }

    #[test]
    fn test_address_match_mixed_separators() {
        assert!(matches_target(
            Some("whatever"),
            "AA:BB:CC:DD:EE:FF",
            "aa-bb-cc-dd-ee-ff"
        ));
    }

    #[test]
    fn test_name_fragment_match() {
        assert!(matches_target(
            Some("Holy-IOT-123"),
            "00:00:00:00:00:00",
            "holy-iot"
        ));
    }

    #[test]
    fn test_wrong_address_does_not_match() {
        assert!(!matches_target(
            Some("Other"),
            "11:22:33:44:55:66",
            "AA:BB:CC:DD:EE:FF"
        ));
    }

    #[test]
    fn test_bare_hex_address_fallback() {
        assert!(matches_target(None, "DD:B2:82:4A:58:6D", "ddb2824a586d"));
    }

    #[test]
    fn test_empty_target_never_matches() {
        assert!(!matches_target(Some("Anything"), "AA:BB:CC:DD:EE:FF", ""));
        assert!(!matches_target(Some("Anything"), "AA:BB:CC:DD:EE:FF", "   "));
    }

    #[test]
    fn test_absent_name_is_empty_string() {
        assert!(!matches_target(None, "11:22:33:44:55:66", "holy-iot"));
    }

    #[test]
    fn test_no_partial_address_match() {
        assert!(!matches_target(None, "AA:BB:CC:DD:EE:FF", "aa:bb:cc"));
    }

    #[test]
    fn test_target_whitespace_trimmed() {
        assert!(matches_target(
            Some("Holy-IOT-123"),
            "00:00:00:00:00:00",
            "  HOLY-IOT  "
        ));
    }
}
