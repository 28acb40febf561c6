//! Single-composition extraction: first strategy whose candidate both
//! parses and validates wins.

use crate::strategies::{StrategyKind, STRATEGY_ORDER};
use catalyst_core::{validate, Composition, RawMapping, Rejection};
use tracing::debug;

/// Outcome of one strategy against one reply
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Found(Composition),
    /// A candidate parsed but failed validation
    Rejected(Rejection),
    NotFound,
}

impl Extraction {
    pub fn into_composition(self) -> Option<Composition> {
        match self {
            Self::Found(composition) => Some(composition),
            _ => None,
        }
    }
}

/// Run a single strategy and validate what it finds
pub fn attempt(kind: StrategyKind, text: &str) -> Extraction {
    match kind.locate(text) {
        None => Extraction::NotFound,
        Some(raw) => match validate(&raw) {
            Ok(composition) => Extraction::Found(composition),
            Err(rejection) => Extraction::Rejected(rejection),
        },
    }
}

/// Extract one validated composition from a reply.
///
/// A rejected candidate does not stop the search; the next strategy is
/// tried. Returns `None` when no strategy yields a valid composition.
pub fn extract_single(text: &str) -> Option<Composition> {
    for kind in STRATEGY_ORDER {
        match attempt(kind, text) {
            Extraction::Found(composition) => {
                debug!(strategy = %kind, composition = %composition, "composition found");
                return Some(composition);
            }
            Extraction::Rejected(rejection) => {
                debug!(strategy = %kind, reason = %rejection, "candidate rejected");
            }
            Extraction::NotFound => {}
        }
    }
    debug!("no strategy produced a valid composition");
    None
}

/// First parseable mapping in priority order, without validation
pub fn find_candidate(text: &str) -> Option<(StrategyKind, RawMapping)> {
    STRATEGY_ORDER
        .iter()
        .find_map(|&kind| kind.locate(text).map(|raw| (kind, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_distinguishes_rejection_from_miss() {
        let bad = r#"composition = {"Ni": 0.9, "Cu": 0.4}"#;
        assert!(matches!(
            attempt(StrategyKind::BareAssignment, bad),
            Extraction::Rejected(Rejection::BadSum { .. })
        ));
        assert_eq!(attempt(StrategyKind::FencedBlock, bad), Extraction::NotFound);
    }

    #[test]
    fn test_rejected_candidate_falls_through_to_later_strategy() {
        let text = "composition = {\"Ni\": 0.9, \"Cu\": 0.4}\n```\n{\"Ni\": 0.5, \"Cu\": 0.5}\n```";
        let comp = extract_single(text).unwrap();
        assert_eq!(comp.get("Ni"), Some(0.5));
    }

    #[test]
    fn test_find_candidate_reports_strategy_without_validating() {
        let (kind, raw) = find_candidate(r#"composition = {"Ni": 0.9, "Cu": 0.4}"#).unwrap();
        assert_eq!(kind, StrategyKind::BareAssignment);
        assert_eq!(raw.len(), 2);
        assert!(find_candidate("no literal here").is_none());
    }

    #[test]
    fn test_into_composition() {
        assert!(Extraction::NotFound.into_composition().is_none());
    }
}
