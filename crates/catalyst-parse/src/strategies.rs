//! Strategy Set: the textual conventions a composition may be written in.
//!
//! Each strategy locates at most one *parseable* mapping in the reply. It
//! never validates; the extractors apply the validator uniformly. A
//! candidate that does not parse is skipped and the strategy moves on to
//! its next match.

use crate::literal;
use catalyst_core::RawMapping;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::debug;

lazy_static! {
    /// `**COMPOSITION:**` followed on a later line by `composition = {...}`
    static ref LABELED_SECTION: Regex =
        Regex::new(r"(?is)\*\*COMPOSITION:\*\*\s*\n\s*composition\s*=\s*(\{[^}]*\})").unwrap();

    static ref BARE_ASSIGNMENT: Regex =
        Regex::new(r"(?i)composition\s*=\s*(\{[^}]*\})").unwrap();

    /// Fence with an optional language tag around a bare literal
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"(?s)```[A-Za-z0-9]*\s*(\{.*?\})\s*```").unwrap();

    static ref FENCED_ASSIGNMENT: Regex =
        Regex::new(r"(?is)```[A-Za-z0-9]*\s*composition\s*=\s*(\{[^}]*\})\s*```").unwrap();

    /// Legacy Korean prompts: `조성: {...}` (ASCII or full-width colon)
    static ref LOCALIZED_LABEL: Regex =
        Regex::new(r"(?s)조성\s*[:：]\s*(\{.*?\})").unwrap();

    /// Any flat `{...}` with a quoted alphabetic key and a number somewhere
    static ref GENERIC_SCAN: Regex =
        Regex::new(r#"(\{[^{}]*["'][A-Za-z]+["'][^{}]*:[^{}]*\d+\.?\d*[^{}]*\})"#).unwrap();
}

/// The extraction strategies, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// The whole trimmed reply is a mapping literal
    DirectLiteral,
    LabeledSection,
    BareAssignment,
    FencedBlock,
    FencedAssignment,
    LocalizedLabel,
    /// Most permissive and most prone to false positives; tried last
    GenericScan,
}

/// Priority order used by the single-composition extractor
pub const STRATEGY_ORDER: [StrategyKind; 7] = [
    StrategyKind::DirectLiteral,
    StrategyKind::LabeledSection,
    StrategyKind::BareAssignment,
    StrategyKind::FencedBlock,
    StrategyKind::FencedAssignment,
    StrategyKind::LocalizedLabel,
    StrategyKind::GenericScan,
];

impl StrategyKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::DirectLiteral => "direct_literal",
            Self::LabeledSection => "labeled_section",
            Self::BareAssignment => "bare_assignment",
            Self::FencedBlock => "fenced_block",
            Self::FencedAssignment => "fenced_assignment",
            Self::LocalizedLabel => "localized_label",
            Self::GenericScan => "generic_scan",
        }
    }

    /// First parseable mapping this strategy finds in `text`
    pub fn locate(self, text: &str) -> Option<RawMapping> {
        match self.pattern() {
            None => self.first_parseable(std::iter::once(text.trim())),
            Some(pattern) => self.first_parseable(
                pattern
                    .captures_iter(text)
                    .filter_map(|caps| caps.get(1))
                    .map(|m| m.as_str()),
            ),
        }
    }

    fn pattern(self) -> Option<&'static Regex> {
        match self {
            Self::DirectLiteral => None,
            Self::LabeledSection => Some(&*LABELED_SECTION),
            Self::BareAssignment => Some(&*BARE_ASSIGNMENT),
            Self::FencedBlock => Some(&*FENCED_BLOCK),
            Self::FencedAssignment => Some(&*FENCED_ASSIGNMENT),
            Self::LocalizedLabel => Some(&*LOCALIZED_LABEL),
            Self::GenericScan => Some(&*GENERIC_SCAN),
        }
    }

    fn first_parseable<'t>(self, candidates: impl Iterator<Item = &'t str>) -> Option<RawMapping> {
        for candidate in candidates {
            match literal::parse_mapping(candidate) {
                Ok(mapping) => return Some(mapping),
                Err(e) => debug!(strategy = self.name(), error = %e, "candidate skipped"),
            }
        }
        None
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
