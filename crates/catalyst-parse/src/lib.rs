//! Catalyst Parse: composition extraction from free-form model replies
//!
//! Every extractor is total: a miss or a validation rejection yields `None`
//! or an empty sequence, never an error.
//!
//! # Example
//!
//! ```
//! use catalyst_parse::{extract_many, extract_single};
//!
//! let single = extract_single(r#"composition = {"Ni": 0.6, "Cu": 0.4}"#).unwrap();
//! assert_eq!(single.get("Ni"), Some(0.6));
//!
//! let many = extract_many("**COMPOSITIONS:**\ncomposition_1 = {\"Pt\": 0.5, \"Ru\": 0.5}");
//! assert_eq!(many.len(), 1);
//! ```

pub mod analysis;
pub mod format;
pub mod literal;
pub mod multi;
pub mod single;
pub mod strategies;

pub use analysis::extract_analysis;
pub use format::ReplyFormat;
pub use literal::{parse_mapping, LiteralError};
pub use multi::{extract_many, to_indexed_assignments};
pub use single::{attempt, extract_single, find_candidate, Extraction};
pub use strategies::{StrategyKind, STRATEGY_ORDER};

use catalyst_core::{AnalysisResult, Composition};
use serde::Serialize;

/// Everything recoverable from one reply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Digest {
    pub full_analysis: AnalysisResult,
    pub composition_only: Option<Composition>,
    pub raw_text: String,
}

/// Run the analysis and single-composition extractors over the same reply
pub fn digest(text: &str) -> Digest {
    Digest {
        full_analysis: extract_analysis(text),
        composition_only: extract_single(text),
        raw_text: text.to_string(),
    }
}
