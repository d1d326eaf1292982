/// Location-label heuristics: indoor/outdoor, room name, wealth tier.
///
/// Labels arrive as hierarchical addresses such as
/// "Kitchen, House of Yusuf, Al-Midan, Damascus, Syria".

const OUTDOOR_KEYWORDS: &[&str] = &[
    "street", "alley", "market", "courtyard", "square", "gate", "road", "path", "garden", "souk",
];

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum WealthTier {
    Poor,
    Modest,
    Merchant,
    Elite,
}

impl WealthTier {
    pub fn parse(raw: &str) -> Option<WealthTier> {
        match raw.trim().to_lowercase().as_str() {
            "poor" => Some(WealthTier::Poor),
            "modest" => Some(WealthTier::Modest),
            "merchant" => Some(WealthTier::Merchant),
            "elite" => Some(WealthTier::Elite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WealthTier::Poor => "poor",
            WealthTier::Modest => "modest",
            WealthTier::Merchant => "merchant",
            WealthTier::Elite => "elite",
        }
    }
}

pub fn is_outdoor(location: &str) -> bool {
    let lower = location.to_lowercase();
    OUTDOOR_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// First segment of the address, or "the area" when there is none.
pub fn room_name(location: &str) -> &str {
    let first = location.split(',').next().unwrap_or("").trim();
    if first.is_empty() { "the area" } else { first }
}

/// Explicit tier wins; otherwise guess from the label, defaulting to modest.
pub fn resolve_wealth_tier(explicit: Option<&str>, location: &str) -> WealthTier {
    if let Some(tier) = explicit.and_then(WealthTier::parse) {
        return tier;
    }
    let loc = location.to_lowercase();
    if ["souk", "market", "khan"].iter().any(|k| loc.contains(k)) {
        WealthTier::Merchant
    } else if ["mosque", "quarter"].iter().any(|k| loc.contains(k)) {
        WealthTier::Modest
    } else if ["gate", "alley"].iter().any(|k| loc.contains(k)) {
        WealthTier::Poor
    } else {
        WealthTier::Modest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outdoor_keywords_are_case_insensitive() {
        assert!(is_outdoor("Narrow Alley, Bab Sharqi"));
        assert!(is_outdoor("SOUK al-Hamidiyya"));
        assert!(!is_outdoor("Kitchen, House of Yusuf"));
    }

    #[test]
    fn room_name_is_first_segment() {
        assert_eq!(room_name("Kitchen, House of Yusuf, Damascus"), "Kitchen");
        assert_eq!(room_name("  , Damascus"), "the area");
        assert_eq!(room_name(""), "the area");
    }

    #[test]
    fn explicit_tier_wins() {
        assert_eq!(resolve_wealth_tier(Some(" Elite "), "Alley"), WealthTier::Elite);
        assert_eq!(resolve_wealth_tier(Some("golden"), "Khan al-Harir"), WealthTier::Merchant);
    }

    #[test]
    fn tier_falls_back_to_keywords_then_modest() {
        assert_eq!(resolve_wealth_tier(None, "Bab al-Jabiya gate"), WealthTier::Poor);
        assert_eq!(resolve_wealth_tier(None, "Jewish Quarter"), WealthTier::Modest);
        assert_eq!(resolve_wealth_tier(None, "Bedroom"), WealthTier::Modest);
    }
}
